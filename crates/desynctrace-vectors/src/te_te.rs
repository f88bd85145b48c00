use desynctrace_protocol::{HttpVersion, Request};

use crate::common::templated;

/// One payload per header obfuscation that a conforming serializer could
/// never emit — which is exactly why each one goes through the descriptor's
/// raw-header-suffix channel instead of the ordinary header sequence.
const OBFUSCATIONS: &[(&str, &str)] = &[
    ("Transfer-Encoding ", "chunked"),
    ("Transfer-Encoding", " chunked"),
    ("Transfer-Encoding\t", "chunked"),
    ("Transfer-Encoding", "chunked\u{0B}"),
    ("Transfer-Encoding", "\r\n chunked"),
    ("Transfer-Encoding", "cow"),
    ("Transfer-Encoding", "x-chunked"),
    ("Transfer-Encoding", "chunked, cow"),
];

pub fn generate(base: &Request) -> Vec<Request> {
    OBFUSCATIONS
        .iter()
        .map(|(name, value)| {
            let mut req = templated(base, "POST", HttpVersion::Http1);
            req.content_length = 4;
            req.body = b"5c\r\n".to_vec();
            req.raw_header_suffix = format!("{name}: {value}\r\n").into_bytes();
            req
        })
        .collect()
}

pub use crate::common::suspicious as verify;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_one_payload_per_obfuscation() {
        let base = Request::new("GET", "http://example.com/", HttpVersion::Http1);
        assert_eq!(generate(&base).len(), OBFUSCATIONS.len());
    }

    #[test]
    fn space_before_colon_is_literal_in_raw_suffix() {
        let base = Request::new("GET", "http://example.com/", HttpVersion::Http1);
        let payload = &generate(&base)[0];
        assert_eq!(payload.raw_header_suffix, b"Transfer-Encoding : chunked\r\n".to_vec());
    }

    #[test]
    fn none_of_the_obfuscations_go_through_the_ordinary_header_sequence() {
        let base = Request::new("GET", "http://example.com/", HttpVersion::Http1);
        for payload in generate(&base) {
            assert!(payload.headers.is_empty());
        }
    }
}
