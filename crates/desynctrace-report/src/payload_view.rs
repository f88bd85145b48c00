use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use desynctrace_protocol::Request;
use serde::{Deserialize, Serialize};

/// JSON-shaped view of a [`Request`]. Kept separate from the core type
/// instead of deriving `Serialize` on it directly: the core descriptor's
/// `Vec<(String, String)>` header order and raw byte suffix exist for wire
/// fidelity, not for a readable report, so this view flattens headers into a
/// map and renders the body as base64.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayloadView {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl From<&Request> for PayloadView {
    fn from(req: &Request) -> Self {
        let mut headers = BTreeMap::new();
        for (name, value) in &req.headers {
            headers.insert(name.clone(), value.clone());
        }
        Self {
            method: req.method.clone(),
            url: req.url.clone(),
            headers,
            body: BASE64.encode(&req.body),
        }
    }
}
