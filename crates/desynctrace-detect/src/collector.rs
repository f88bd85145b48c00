use std::sync::Arc;

use desynctrace_protocol::DetectionResult;
use tokio::sync::Mutex;

/// Append-only, concurrency-safe finding list. Every worker holds a clone of
/// the same collector; ordering across vectors is not guaranteed, matching
/// the concurrency model.
#[derive(Debug, Clone, Default)]
pub struct FindingCollector {
    inner: Arc<Mutex<Vec<DetectionResult>>>,
}

impl FindingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, finding: DetectionResult) {
        self.inner.lock().await.push(finding);
    }

    pub async fn append_all(&self, findings: impl IntoIterator<Item = DetectionResult>) {
        self.inner.lock().await.extend(findings);
    }

    pub async fn snapshot(&self) -> Vec<DetectionResult> {
        self.inner.lock().await.clone()
    }
}
