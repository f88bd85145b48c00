use crate::request::Request;

/// An immutable, already-classified result for one vector against one target.
/// Once constructed, nothing mutates a `DetectionResult`; the report
/// aggregator only ever appends these.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub vulnerable: bool,
    pub vector: &'static str,
    pub confidence: u8,
    pub evidence: String,
    pub payload: Request,
}

impl DetectionResult {
    pub fn new(
        vulnerable: bool,
        vector: &'static str,
        confidence: u8,
        evidence: impl Into<String>,
        payload: Request,
    ) -> Self {
        Self {
            vulnerable,
            vector,
            confidence: confidence.min(100),
            evidence: evidence.into(),
            payload,
        }
    }
}
