use std::fmt;

/// HTTP version a [`Request`] is meant to be emitted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http1,
    Http2,
}

/// Sentinel for "the descriptor did not set a content-length".
pub const CONTENT_LENGTH_UNSET: i64 = -1;

/// An abstract HTTP request descriptor, deliberately unlike a conventional HTTP
/// library's request type: it can carry contradictions (both `content-length`
/// and `transfer-encoding`, malformed header names) that a conforming library
/// would refuse to construct. The transport emits exactly what is described
/// here and nothing else.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub host_override: Option<String>,
    /// Ordered, possibly-duplicated header pairs. Names and values are taken
    /// as literal bytes; no trimming or case-folding happens anywhere on this
    /// path.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// -1 = unset, 0 = explicit `content-length: 0`, >0 = explicit value
    /// (need not match `body.len()`).
    pub content_length: i64,
    pub transfer_encoding: Option<String>,
    /// Bytes appended verbatim after the header sequence, before the
    /// terminating CRLF. Used to smuggle header names a serializer can't
    /// otherwise emit (e.g. `Transfer-Encoding :`).
    pub raw_header_suffix: Vec<u8>,
    pub version: HttpVersion,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>, version: HttpVersion) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            host_override: None,
            headers: Vec::new(),
            body: Vec::new(),
            content_length: CONTENT_LENGTH_UNSET,
            transfer_encoding: None,
            raw_header_suffix: Vec::new(),
            version,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host_override = Some(host.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_content_length(mut self, len: i64) -> Self {
        self.content_length = len;
        self
    }

    pub fn with_transfer_encoding(mut self, te: impl Into<String>) -> Self {
        self.transfer_encoding = Some(te.into());
        self
    }

    pub fn with_raw_header_suffix(mut self, suffix: impl Into<Vec<u8>>) -> Self {
        self.raw_header_suffix = suffix.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Whether the descriptor's header sequence carries a `Connection: close`
    /// (case-insensitively). The poisoning detector skips payloads for which
    /// this is true, since they would tear down the socket before the victim
    /// probe can reuse it.
    pub fn has_connection_close(&self) -> bool {
        self.headers.iter().any(|(name, value)| {
            name.eq_ignore_ascii_case("connection") && value.to_ascii_lowercase().contains("close")
        })
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({:?})", self.method, self.url, self.version)
    }
}
