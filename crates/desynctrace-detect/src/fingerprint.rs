use std::time::Duration;

use desynctrace_protocol::{HttpVersion, Request, ServerFingerprint};
use desynctrace_transport::Transport;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Issues one benign GET and derives an advisory [`ServerFingerprint`] from
/// its banner headers. Failure is non-fatal: the scan proceeds with no
/// fingerprint and vector predicates simply never fire on the duration arm.
pub struct Fingerprinter<'a> {
    transport: &'a Transport,
}

impl<'a> Fingerprinter<'a> {
    pub fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    #[tracing::instrument(level = "debug", skip(self, cancel))]
    pub async fn probe(
        &self,
        target: &Url,
        user_agent: &str,
        cancel: &CancellationToken,
    ) -> (Option<ServerFingerprint>, Duration) {
        let request = Request::new("GET", target.to_string(), HttpVersion::Http1)
            .with_header("User-Agent", user_agent);

        let (result, duration) = self.transport.send(&request, target, cancel).await;
        match result {
            Ok(response) => (Some(ServerFingerprint::from_headers(&response.headers)), duration),
            Err(err) => {
                debug!(error = %err, "fingerprint probe failed, proceeding without one");
                (None, duration)
            }
        }
    }
}
