use desynctrace_protocol::{HttpVersion, Request};

use crate::common::templated;

/// Declares `content-length: 0` but carries a non-empty DATA frame. A
/// front-end that downgrades to HTTP/1.1 using the declared length reads zero
/// bytes of body and treats the DATA payload as the start of the next
/// request.
pub fn generate(base: &Request) -> Vec<Request> {
    let mut req = templated(base, "POST", HttpVersion::Http2);
    req.content_length = 0;
    req.body = b"SMUGGLED".to_vec();
    vec![req]
}

pub use crate::common::suspicious as verify;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_zero_length_with_nonempty_body() {
        let base = Request::new("GET", "https://example.com/", HttpVersion::Http1);
        let payload = &generate(&base)[0];
        assert_eq!(payload.content_length, 0);
        assert!(!payload.body.is_empty());
        assert_eq!(payload.version, HttpVersion::Http2);
    }
}
