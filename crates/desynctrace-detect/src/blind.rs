use std::time::Duration;

use desynctrace_protocol::{DetectionResult, Request, Vector};
use desynctrace_transport::Transport;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Timing-based oracle over a single attack request per payload. Returns on
/// the first payload that either times out past the blind threshold or
/// produces a suspicious response.
pub struct BlindDetector<'a> {
    transport: &'a Transport,
}

impl<'a> BlindDetector<'a> {
    pub fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    #[tracing::instrument(level = "debug", skip(self, vector, base, cancel), fields(vector = vector.code))]
    pub async fn detect(
        &self,
        vector: &Vector,
        base: &Request,
        target: &Url,
        blind_threshold: Duration,
        baseline_duration: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Option<DetectionResult> {
        for payload in vector.payloads(base) {
            if cancel.is_cancelled() {
                return None;
            }
            let (result, duration) = self.transport.send(&payload, target, cancel).await;
            match result {
                Err(err) if duration >= blind_threshold => {
                    debug!(%err, ?duration, "blind hit via timeout");
                    return Some(DetectionResult::new(
                        true,
                        vector.code,
                        80,
                        format!("request timeout/delay {duration:?}"),
                        payload,
                    ));
                }
                Err(_) => continue,
                Ok(response) => {
                    if vector.is_suspicious(&response, baseline_duration) {
                        return Some(DetectionResult::new(
                            true,
                            vector.code,
                            60,
                            format!("suspicious status {}", response.status),
                            payload,
                        ));
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desynctrace_protocol::HttpVersion;

    use crate::test_support::{spawn_mock, spawn_repeating, MockAction};

    fn base_request(url: &str) -> Request {
        Request::new("GET", url, HttpVersion::Http1)
    }

    #[tokio::test]
    async fn s1_cl_te_against_a_stalling_backend_is_a_blind_hit_via_timeout() {
        let addr = spawn_mock(vec![MockAction::Stall]).await;
        let url = Url::parse(&format!("http://{addr}/")).unwrap();
        let transport = Transport::new(None, false, Duration::from_millis(200), Duration::from_millis(150));
        let cancel = CancellationToken::new();
        let vector = desynctrace_vectors::all().into_iter().find(|v| v.code == "CL.TE").unwrap();
        let base = base_request(url.as_str());

        let finding = BlindDetector::new(&transport)
            .detect(&vector, &base, &url, Duration::from_millis(100), None, &cancel)
            .await
            .expect("stalling backend should read as a blind hit");

        assert!(finding.vulnerable);
        assert_eq!(finding.vector, "CL.TE");
        assert!(finding.confidence >= 80);
        assert!(finding.evidence.contains("timeout"));
    }

    #[tokio::test]
    async fn s2_clean_server_returns_no_findings_for_any_vector() {
        let vectors = desynctrace_vectors::all();
        let ok_response = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";
        let addr = spawn_repeating(MockAction::Respond(ok_response)).await;
        let url = Url::parse(&format!("http://{addr}/")).unwrap();
        let transport = Transport::new(None, false, Duration::from_millis(500), Duration::from_secs(2));
        let cancel = CancellationToken::new();
        let base = base_request(url.as_str());

        for vector in &vectors {
            let finding = BlindDetector::new(&transport)
                .detect(vector, &base, &url, Duration::from_secs(1), None, &cancel)
                .await;
            assert!(finding.is_none(), "vector {} should not blind-hit a clean 200", vector.code);
        }
    }

    #[tokio::test]
    async fn cancellation_short_circuits_before_any_payload_is_sent() {
        let addr = spawn_mock(vec![MockAction::Stall]).await;
        let url = Url::parse(&format!("http://{addr}/")).unwrap();
        let transport = Transport::new(None, false, Duration::from_millis(200), Duration::from_secs(5));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let vector = desynctrace_vectors::all().into_iter().find(|v| v.code == "CL.TE").unwrap();
        let base = base_request(url.as_str());

        let finding = BlindDetector::new(&transport)
            .detect(&vector, &base, &url, Duration::from_millis(100), None, &cancel)
            .await;

        assert!(finding.is_none());
    }
}
