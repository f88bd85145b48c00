use std::time::Duration;

/// A response as observed on the wire: status, ordered headers, body bytes and
/// the wall-clock duration of the probe that produced it. There is
/// deliberately no notion of "parsed" vs "raw" here, since the transport never
/// trusts the bytes enough to normalize them beyond recovering a status line.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub duration: Duration,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
