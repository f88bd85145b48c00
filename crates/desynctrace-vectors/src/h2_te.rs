use desynctrace_protocol::{HttpVersion, Request};

use crate::common::templated;

/// Includes `transfer-encoding: chunked`, a header HTTP/2 forbids outright.
/// A front-end with insufficient validation passes it through on downgrade,
/// handing the back-end a framing mechanism the HTTP/2 leg never negotiated.
pub fn generate(base: &Request) -> Vec<Request> {
    let mut req = templated(base, "POST", HttpVersion::Http2);
    req.transfer_encoding = Some("chunked".to_string());
    req.body = b"SMUGGLED".to_vec();
    vec![req]
}

pub use crate::common::suspicious as verify;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_forbidden_transfer_encoding_header() {
        let base = Request::new("GET", "https://example.com/", HttpVersion::Http1);
        let payload = &generate(&base)[0];
        assert_eq!(payload.transfer_encoding.as_deref(), Some("chunked"));
    }
}
