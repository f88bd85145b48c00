use std::time::Duration;

use desynctrace_protocol::{HttpVersion, Request, Response};

/// Builds a plain request carrying the same target url/host-override as
/// `base`, for a generator to then layer its framing ambiguity onto.
pub fn templated(base: &Request, method: &str, version: HttpVersion) -> Request {
    let mut req = Request::new(method, base.url.clone(), version);
    req.host_override = base.host_override.clone();
    req
}

/// The weak response predicate shared by every vector except CL.0: a
/// suspicious status or a response that took far longer than the fingerprint
/// baseline. Intentionally weak — the poisoning detector carries the real
/// verdict.
pub fn suspicious(response: &Response, baseline: Option<Duration>) -> bool {
    if response.status >= 500 {
        return true;
    }
    if let Some(baseline) = baseline {
        if !baseline.is_zero() && response.duration > baseline * 5 {
            return true;
        }
    }
    false
}

/// CL.0 is confirmed only via poisoning; a suspicious-looking immediate
/// response tells us nothing.
pub fn never(_response: &Response, _baseline: Option<Duration>) -> bool {
    false
}
