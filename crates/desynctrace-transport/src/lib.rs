//! Framing-preserving wire transport: raw HTTP/1.1 byte I/O and raw HTTP/2
//! framing over TLS, plus the proxy dialing both share.
//!
//! Nothing here parses a request into a standard library's HTTP type first —
//! the whole point is to emit exactly the bytes a [`desynctrace_protocol::Request`]
//! describes, including the ones a conforming client would refuse to send.

mod error;
mod h2;
mod http1;
mod stream;
mod tls;

use std::time::{Duration, Instant};

use desynctrace_protocol::{HttpVersion, Request, Response};
use tokio_util::sync::CancellationToken;
use url::Url;

pub use error::TransportError;
pub use stream::ProxyConfig;

/// One vector probe's outcome: a response or an error, paired with the
/// wall-clock duration the attempt took. The duration is preserved on the
/// error path because it is itself the blind detector's signal.
pub type ProbeOutcome = (Result<Response, TransportError>, Duration);

/// Bundles the knobs every send needs: the proxy (if any), whether TLS
/// certificate verification runs, and the two timeout budgets from the
/// concurrency model. One `Transport` is owned per worker so that connection
/// affinity is never accidentally shared across concurrent vector probes.
#[derive(Debug, Clone)]
pub struct Transport {
    proxy: Option<ProxyConfig>,
    insecure_tls: bool,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl Transport {
    pub fn new(
        proxy: Option<ProxyConfig>,
        insecure_tls: bool,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            proxy,
            insecure_tls,
            connect_timeout,
            request_timeout,
        }
    }

    /// Sends `req` against `target`, dispatching to the raw HTTP/1.1 or raw
    /// HTTP/2 sender based on the descriptor's declared version. Races the
    /// send against `cancel`: if the scan-wide token fires first, whatever
    /// socket I/O was in flight is dropped and a [`TransportError::Cancelled`]
    /// is reported instead.
    #[tracing::instrument(level = "debug", skip(self, req, cancel), fields(method = %req.method, version = ?req.version))]
    pub async fn send(&self, req: &Request, target: &Url, cancel: &CancellationToken) -> ProbeOutcome {
        let started = Instant::now();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => (Err(TransportError::Cancelled), started.elapsed()),
            outcome = self.dispatch(req, target) => outcome,
        }
    }

    async fn dispatch(&self, req: &Request, target: &Url) -> ProbeOutcome {
        match req.version {
            HttpVersion::Http1 => {
                http1::send(
                    req,
                    target,
                    self.proxy.as_ref(),
                    self.insecure_tls,
                    self.connect_timeout,
                    self.request_timeout,
                )
                .await
            }
            HttpVersion::Http2 => {
                h2::send(
                    req,
                    target,
                    self.proxy.as_ref(),
                    self.insecure_tls,
                    self.connect_timeout,
                    self.request_timeout,
                )
                .await
            }
        }
    }

    /// Sends `requests` over one shared HTTP/1.1 connection, in order,
    /// pinning every request in the batch to the same client socket. Only
    /// meaningful for `HttpVersion::Http1` requests — callers are
    /// responsible for not mixing HTTP/2 descriptors into a batch, since a
    /// raw HTTP/2 frame stream cannot share a socket with HTTP/1.1 bytes.
    #[tracing::instrument(level = "debug", skip(self, requests, cancel), fields(count = requests.len()))]
    pub async fn send_pinned(
        &self,
        requests: &[&Request],
        target: &Url,
        cancel: &CancellationToken,
    ) -> Vec<ProbeOutcome> {
        let started = Instant::now();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => requests
                .iter()
                .map(|_| (Err(TransportError::Cancelled), started.elapsed()))
                .collect(),
            outcomes = http1::send_pinned(
                requests,
                target,
                self.proxy.as_ref(),
                self.insecure_tls,
                self.connect_timeout,
                self.request_timeout,
            ) => outcomes,
        }
    }
}

/// Re-exported so callers building request batches (vectors, detectors) can
/// assemble an HTTP/1.1 byte stream directly for byte-fidelity tests without
/// going through a live socket.
pub fn assemble_http1(req: &Request, target: &Url) -> Vec<u8> {
    http1::assemble(req, target)
}

/// Re-exported for HPACK-level frame tests without a live socket.
pub fn assemble_h2_header_block(req: &Request, target: &Url) -> Vec<u8> {
    h2::build_header_block(req, target)
}
