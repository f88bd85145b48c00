use desynctrace_protocol::{DetectionResult, ServerFingerprint};
use serde::{Deserialize, Serialize};

use crate::payload_view::PayloadView;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FingerprintView {
    pub server: String,
    pub x_powered_by: String,
    pub via: String,
    pub is_nginx: bool,
    pub is_apache: bool,
    pub is_gunicorn: bool,
}

impl From<&ServerFingerprint> for FingerprintView {
    fn from(fp: &ServerFingerprint) -> Self {
        Self {
            server: fp.server.clone(),
            x_powered_by: fp.x_powered_by.clone(),
            via: fp.via.clone(),
            is_nginx: fp.is_nginx,
            is_apache: fp.is_apache,
            is_gunicorn: fp.is_gunicorn,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FindingView {
    pub vulnerable: bool,
    pub vector: String,
    pub confidence: u8,
    pub evidence: String,
    pub payload: PayloadView,
}

impl From<&DetectionResult> for FindingView {
    fn from(result: &DetectionResult) -> Self {
        Self {
            vulnerable: result.vulnerable,
            vector: result.vector.to_string(),
            confidence: result.confidence,
            evidence: result.evidence.clone(),
            payload: PayloadView::from(&result.payload),
        }
    }
}

/// The complete, serializable record of one scan. Produced by the CLI
/// orchestration layer once every vector has finished, from the finding
/// collector's drained contents plus the fingerprint probe and scan timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanReport {
    pub target: String,
    pub start_time: String,
    pub duration: String,
    pub fingerprint: Option<FingerprintView>,
    pub findings: Vec<FindingView>,
}

impl ScanReport {
    pub fn new(
        target: impl Into<String>,
        start_time: impl Into<String>,
        duration: impl Into<String>,
        fingerprint: Option<&ServerFingerprint>,
        findings: &[DetectionResult],
    ) -> Self {
        Self {
            target: target.into(),
            start_time: start_time.into(),
            duration: duration.into(),
            fingerprint: fingerprint.map(FingerprintView::from),
            findings: findings.iter().map(FindingView::from).collect(),
        }
    }

    pub fn vulnerable_findings(&self) -> impl Iterator<Item = &FindingView> {
        self.findings.iter().filter(|f| f.vulnerable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desynctrace_protocol::{HttpVersion, Request};

    fn sample() -> ScanReport {
        let payload = Request::new("POST", "http://example.test/", HttpVersion::Http1)
            .with_header("Transfer-Encoding", "chunked")
            .with_content_length(6)
            .with_body(b"0\r\n\r\nG".to_vec());
        let finding = DetectionResult::new(true, "CL.TE", 90, "status drifted from 404 to 200", payload);
        ScanReport::new(
            "http://example.test/",
            "2026-07-30T00:00:00Z",
            "12.4s",
            None,
            &[finding],
        )
    }

    #[test]
    fn round_trips_through_json() {
        let report = sample();
        let json = serde_json::to_string_pretty(&report).unwrap();
        let back: ScanReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, back);
    }

    #[test]
    fn vulnerable_findings_filters_negatives() {
        let mut report = sample();
        report.findings.push(FindingView {
            vulnerable: false,
            vector: "TE.CL".to_string(),
            confidence: 0,
            evidence: "no divergence".to_string(),
            payload: report.findings[0].payload.clone(),
        });
        assert_eq!(report.vulnerable_findings().count(), 1);
    }
}
