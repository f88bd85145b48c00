use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use desynctrace_protocol::{Request, Response};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use url::Url;

use crate::error::TransportError;
use crate::stream::{dial, BoxedStream, ProxyConfig};
use crate::tls;

/// Upper bound on how much of a response this transport will buffer. The
/// scanner never needs more than enough to see a status line and a handful of
/// banner headers.
pub const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Assembles the exact HTTP/1.1 byte stream for `req` against `target`,
/// following the spec's byte-assembly order verbatim. No header is
/// lowercased, deduplicated, or trimmed; `content-length` and
/// `transfer-encoding` both appear on the wire whenever both are set on the
/// descriptor.
pub fn assemble(req: &Request, target: &Url) -> Vec<u8> {
    let mut out = Vec::with_capacity(256 + req.body.len());

    let request_target = request_target(target);
    out.extend_from_slice(format!("{} {} HTTP/1.1\r\n", req.method, request_target).as_bytes());

    let host = req.host_override.clone().unwrap_or_else(|| authority(target));
    out.extend_from_slice(format!("Host: {host}\r\n").as_bytes());

    for (name, value) in &req.headers {
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }

    if let Some(te) = &req.transfer_encoding {
        out.extend_from_slice(format!("Transfer-Encoding: {te}\r\n").as_bytes());
    }

    if req.content_length >= 0 {
        out.extend_from_slice(format!("Content-Length: {}\r\n", req.content_length).as_bytes());
    }

    out.extend_from_slice(&req.raw_header_suffix);
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&req.body);

    out
}

fn request_target(url: &Url) -> String {
    let mut target = if url.path().is_empty() {
        "/".to_string()
    } else {
        url.path().to_string()
    };
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    target
}

fn authority(url: &Url) -> String {
    match url.port() {
        Some(port) => format!("{}:{}", url.host_str().unwrap_or_default(), port),
        None => url.host_str().unwrap_or_default().to_string(),
    }
}

/// Sends one fully-materialized HTTP/1.1 request and returns whatever
/// response was recovered together with the wall-clock duration of the whole
/// attempt — the duration is returned even on failure, since it is itself
/// the blind-detector's timing signal.
pub async fn send(
    req: &Request,
    target: &Url,
    proxy: Option<&ProxyConfig>,
    insecure_tls: bool,
    connect_timeout: Duration,
    request_timeout: Duration,
) -> (Result<Response, TransportError>, Duration) {
    let started = Instant::now();
    let result = send_inner(
        req,
        target,
        proxy,
        insecure_tls,
        connect_timeout,
        request_timeout,
    )
    .await
    .map(|mut response| {
        response.duration = started.elapsed();
        response
    });
    (result, started.elapsed())
}

async fn send_inner(
    req: &Request,
    target: &Url,
    proxy: Option<&ProxyConfig>,
    insecure_tls: bool,
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<Response, TransportError> {
    let host = target
        .host_str()
        .ok_or_else(|| TransportError::InvalidUrl("target url has no host".into()))?
        .to_string();
    let port = target
        .port_or_known_default()
        .unwrap_or(if target.scheme() == "https" { 443 } else { 80 });

    let raw = dial(&host, port, proxy, connect_timeout).await?;
    let mut stream: BoxedStream = if target.scheme() == "https" {
        let config = tls::build_client_config(insecure_tls, &[])?;
        tls::wrap(raw, &host, Arc::new(config), connect_timeout).await?
    } else {
        raw
    };

    let bytes = assemble(req, target);

    let attempt = async {
        stream.write_all(&bytes).await.map_err(TransportError::Connect)?;
        read_response(&mut stream).await
    };

    tokio::time::timeout(request_timeout, attempt)
        .await
        .map_err(|_| TransportError::Timeout(request_timeout))?
}

async fn read_response(stream: &mut BoxedStream) -> Result<Response, TransportError> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.map_err(TransportError::Connect)?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() >= MAX_RESPONSE_BYTES {
            break;
        }
    }
    parse_response(&buf)
}

fn parse_response(buf: &[u8]) -> Result<Response, TransportError> {
    if buf.is_empty() {
        return Err(TransportError::Malformed("empty response".into()));
    }

    let line_end = buf.iter().position(|&b| b == b'\r' || b == b'\n').unwrap_or(buf.len());
    let status_line = std::str::from_utf8(&buf[..line_end])
        .map_err(|err| TransportError::Malformed(err.to_string()))?;
    let mut parts = status_line.splitn(3, ' ');
    let _version = parts
        .next()
        .ok_or_else(|| TransportError::Malformed("missing http version".into()))?;
    let status: u16 = parts
        .next()
        .ok_or_else(|| TransportError::Malformed("missing status code".into()))?
        .parse()
        .map_err(|_| TransportError::Malformed("non-numeric status code".into()))?;

    let mut headers = Vec::new();
    let mut body_start = buf.len();
    if let Some(header_end) = find_double_crlf(buf) {
        body_start = header_end + 4;
        for line in buf[..header_end].split(|&b| b == b'\n').skip(1) {
            let line = strip_trailing_cr(line);
            if line.is_empty() {
                continue;
            }
            if let Some(idx) = line.iter().position(|&b| b == b':') {
                let name = String::from_utf8_lossy(&line[..idx]).trim().to_string();
                let value = String::from_utf8_lossy(&line[idx + 1..]).trim().to_string();
                headers.push((name, value));
            }
        }
    }

    Ok(Response {
        status,
        headers,
        body: buf.get(body_start..).unwrap_or_default().to_vec(),
        duration: Duration::default(),
    })
}

/// Sends `requests` in order over a single dialed connection, so that
/// whatever effect an earlier request has on the server's request-framing
/// state is visible to the requests that follow it on the same socket. Used
/// by the poisoning detector to pin an attack request and its victim probe
/// to the same client connection.
///
/// Unlike [`send`], this does not wait for the peer to close the connection
/// between requests — it reads exactly one response per request by parsing
/// `Content-Length`, since a keep-alive socket has no end-of-stream to read
/// until. Once a request on the shared socket fails (write error, malformed
/// response, or per-request timeout), every remaining request is reported as
/// failed without attempting more I/O on the now-unreliable connection.
pub async fn send_pinned(
    requests: &[&Request],
    target: &Url,
    proxy: Option<&ProxyConfig>,
    insecure_tls: bool,
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Vec<(Result<Response, TransportError>, Duration)> {
    let host = match target
        .host_str()
        .ok_or_else(|| TransportError::InvalidUrl("target url has no host".into()))
    {
        Ok(host) => host.to_string(),
        Err(err) => return synthesized_failures(requests.len(), &err),
    };
    let port = target
        .port_or_known_default()
        .unwrap_or(if target.scheme() == "https" { 443 } else { 80 });

    let dialed = async {
        let raw = dial(&host, port, proxy, connect_timeout).await?;
        let stream: BoxedStream = if target.scheme() == "https" {
            let config = tls::build_client_config(insecure_tls, &[])?;
            tls::wrap(raw, &host, Arc::new(config), connect_timeout).await?
        } else {
            raw
        };
        Ok::<_, TransportError>(stream)
    };

    let mut stream = match dialed.await {
        Ok(stream) => stream,
        Err(err) => return synthesized_failures(requests.len(), &err),
    };

    let mut outcomes = Vec::with_capacity(requests.len());
    let mut broken = false;

    for req in requests {
        if broken {
            outcomes.push(connection_already_closed());
            continue;
        }

        let started = Instant::now();
        let bytes = assemble(req, target);
        let attempt = async {
            stream.write_all(&bytes).await.map_err(TransportError::Connect)?;
            read_response_keepalive(&mut stream).await
        };

        let result = match tokio::time::timeout(request_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(request_timeout)),
        };

        let result = result.map(|mut response| {
            response.duration = started.elapsed();
            response
        });
        if result.is_err() {
            broken = true;
        }
        outcomes.push((result, started.elapsed()));
    }

    outcomes
}

fn synthesized_failures(
    count: usize,
    err: &TransportError,
) -> Vec<(Result<Response, TransportError>, Duration)> {
    let message = err.to_string();
    (0..count)
        .map(|_| {
            (
                Err(TransportError::Connect(io::Error::other(message.clone()))),
                Duration::default(),
            )
        })
        .collect()
}

fn connection_already_closed() -> (Result<Response, TransportError>, Duration) {
    (
        Err(TransportError::Connect(io::Error::other(
            "connection already closed by a prior request on this pinned socket",
        ))),
        Duration::default(),
    )
}

/// Reads exactly one HTTP/1.1 response from a connection that may stay open
/// afterward: headers are read up to the double-CRLF, then `Content-Length`
/// (defaulting to 0 when absent, matching how servers in this scanner's
/// probe matrix respond to the bodyless GETs used as victim probes) tells us
/// exactly how many more body bytes to read. No read waits for EOF.
async fn read_response_keepalive(stream: &mut BoxedStream) -> Result<Response, TransportError> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(idx) = find_double_crlf(&buf) {
            break idx;
        }
        if buf.len() >= MAX_RESPONSE_BYTES {
            return Err(TransportError::Malformed("response headers exceeded size cap".into()));
        }
        let n = stream.read(&mut chunk).await.map_err(TransportError::Connect)?;
        if n == 0 {
            return Err(TransportError::Malformed("connection closed before headers completed".into()));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let body_start = header_end + 4;
    let content_length = parse_content_length(&buf[..header_end]).unwrap_or(0);
    let body_end = body_start + content_length;

    while buf.len() < body_end {
        if buf.len() >= MAX_RESPONSE_BYTES {
            return Err(TransportError::Malformed("response body exceeded size cap".into()));
        }
        let n = stream.read(&mut chunk).await.map_err(TransportError::Connect)?;
        if n == 0 {
            return Err(TransportError::Malformed("connection closed before body completed".into()));
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    parse_response(&buf[..body_end])
}

fn parse_content_length(header_bytes: &[u8]) -> Option<usize> {
    for line in header_bytes.split(|&b| b == b'\n') {
        let line = strip_trailing_cr(line);
        let Some(idx) = line.iter().position(|&b| b == b':') else {
            continue;
        };
        let Ok(name) = std::str::from_utf8(&line[..idx]) else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            let Ok(value) = std::str::from_utf8(&line[idx + 1..]) else {
                continue;
            };
            return value.trim().parse().ok();
        }
    }
    None
}

fn find_double_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

fn strip_trailing_cr(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desynctrace_protocol::HttpVersion;

    #[test]
    fn assembles_in_spec_order_with_both_cl_and_te() {
        let target = Url::parse("http://example.com/path").unwrap();
        let req = Request::new("POST", "http://example.com/path", HttpVersion::Http1)
            .with_header("X-Custom", "v")
            .with_transfer_encoding("chunked")
            .with_content_length(6)
            .with_raw_header_suffix(b"X-Extra: 1\r\n".to_vec())
            .with_body(b"0\r\n\r\nG".to_vec());

        let bytes = assemble(&req, &target);
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.starts_with("POST /path HTTP/1.1\r\n"));
        assert!(text.contains("Host: example.com\r\n"));
        assert!(text.contains("X-Custom: v\r\n"));
        assert!(text.contains("Transfer-Encoding: chunked\r\n"));
        assert!(text.contains("Content-Length: 6\r\n"));
        assert!(text.contains("X-Extra: 1\r\n"));
        assert!(text.ends_with("0\r\n\r\nG"));

        let te_pos = text.find("Transfer-Encoding").unwrap();
        let cl_pos = text.find("Content-Length").unwrap();
        assert!(te_pos < cl_pos);
    }

    #[test]
    fn preserves_malformed_header_name_verbatim() {
        let target = Url::parse("http://example.com/").unwrap();
        let req = Request::new("GET", "http://example.com/", HttpVersion::Http1)
            .with_raw_header_suffix(b"Transfer-Encoding : chunked\r\n".to_vec());
        let bytes = assemble(&req, &target);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("Transfer-Encoding : chunked\r\n"));
    }

    #[test]
    fn parses_status_line_and_headers() {
        let raw = b"HTTP/1.1 404 Not Found\r\nServer: nginx\r\nContent-Length: 2\r\n\r\nhi";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.header("server"), Some("nginx"));
        assert_eq!(response.body, b"hi");
    }

    #[test]
    fn content_length_lookup_is_case_insensitive() {
        let headers = b"HTTP/1.1 200 OK\r\ncontent-LENGTH: 5\r\nServer: x";
        assert_eq!(parse_content_length(headers), Some(5));
    }

    #[test]
    fn content_length_lookup_returns_none_when_absent() {
        let headers = b"HTTP/1.1 200 OK\r\nServer: x";
        assert_eq!(parse_content_length(headers), None);
    }
}
