use desynctrace_protocol::{DetectionResult, HttpVersion, ProbeError, Request, Vector};
use desynctrace_transport::Transport;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Paired attack-then-victim oracle. The baseline GET runs on its own
/// connection to establish a reference status; for HTTP/1.1 vectors the
/// attack payload and the victim probe that follows it are sent through
/// [`Transport::send_pinned`] on one shared socket, since the poisoning
/// effect this detector looks for only exists if both requests are seen by
/// the same backend connection. HTTP/2 vectors fall back to independent
/// sends: an H2 attack frame stream and the H1-downgraded victim GET used
/// here cannot share one raw socket, so affinity for that family is
/// best-effort only.
pub struct PoisoningDetector<'a> {
    transport: &'a Transport,
}

impl<'a> PoisoningDetector<'a> {
    pub fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    #[tracing::instrument(level = "debug", skip(self, vector, base, cancel), fields(vector = vector.code))]
    pub async fn detect(
        &self,
        vector: &Vector,
        base: &Request,
        target: &Url,
        cancel: &CancellationToken,
    ) -> Result<Option<DetectionResult>, ProbeError> {
        let (baseline_result, _) = self.transport.send(&benign_get(base), target, cancel).await;
        let baseline = baseline_result.map_err(|err| ProbeError::BaselineFailure(err.to_string()))?;

        for payload in vector.payloads(base) {
            if payload.has_connection_close() {
                debug!(vector = vector.code, "skipping payload carrying Connection: close");
                continue;
            }

            let victim_probe = benign_get(base);
            let victim = if payload.version == HttpVersion::Http1 {
                let mut outcomes = self
                    .transport
                    .send_pinned(&[&payload, &victim_probe], target, cancel)
                    .await;
                let victim_outcome = outcomes.pop().expect("send_pinned returns one outcome per request");
                let (victim_result, _) = victim_outcome;
                victim_result
            } else {
                // Attack result is discarded: only its side effect on the
                // shared backend connection matters, and H2/H1 sends can't
                // share one socket anyway.
                let _ = self.transport.send(&payload, target, cancel).await;
                let (victim_result, _) = self.transport.send(&victim_probe, target, cancel).await;
                victim_result
            };

            let Ok(victim) = victim else {
                continue;
            };

            if victim.status != baseline.status {
                return Ok(Some(DetectionResult::new(
                    true,
                    vector.code,
                    90,
                    format!("victim status {} \u{2192} {}", baseline.status, victim.status),
                    payload,
                )));
            }
        }

        Ok(None)
    }
}

fn benign_get(base: &Request) -> Request {
    let version = if base.version == HttpVersion::Http2 {
        HttpVersion::Http1
    } else {
        base.version
    };
    let mut req = Request::new("GET", base.url.clone(), version);
    req.host_override = base.host_override.clone();
    req
}
