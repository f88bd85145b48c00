use std::sync::Arc;
use std::time::{Duration, Instant};

use desynctrace_protocol::{Request, Response};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use url::Url;

use crate::error::TransportError;
use crate::stream::{dial, BoxedStream, ProxyConfig};
use crate::tls;

const PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

const TYPE_DATA: u8 = 0x0;
const TYPE_HEADERS: u8 = 0x1;
const TYPE_RST_STREAM: u8 = 0x3;
const TYPE_SETTINGS: u8 = 0x4;
const TYPE_GOAWAY: u8 = 0x7;

const FLAG_END_STREAM: u8 = 0x1;
const FLAG_END_HEADERS: u8 = 0x4;
const FLAG_PADDED: u8 = 0x8;
const FLAG_PRIORITY: u8 = 0x20;

const SETTINGS_INITIAL_WINDOW_SIZE: u16 = 0x4;

struct FrameHeader {
    length: u32,
    frame_type: u8,
    flags: u8,
    stream_id: u32,
}

fn write_frame_header(out: &mut Vec<u8>, length: u32, frame_type: u8, flags: u8, stream_id: u32) {
    out.push((length >> 16) as u8);
    out.push((length >> 8) as u8);
    out.push(length as u8);
    out.push(frame_type);
    out.push(flags);
    out.extend_from_slice(&(stream_id & 0x7fff_ffff).to_be_bytes());
}

fn parse_frame_header(buf: &[u8; 9]) -> FrameHeader {
    let length = ((buf[0] as u32) << 16) | ((buf[1] as u32) << 8) | (buf[2] as u32);
    let stream_id = u32::from_be_bytes([buf[5], buf[6], buf[7], buf[8]]) & 0x7fff_ffff;
    FrameHeader {
        length,
        frame_type: buf[3],
        flags: buf[4],
        stream_id,
    }
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

/// Builds the raw HPACK header block for `req`: pseudo-headers first, then
/// the descriptor's own headers lowercased but otherwise byte-for-byte
/// (embedded CR/LF included — this is what makes H2.CRLF possible), then an
/// optional `content-length` iff the descriptor set one, including zero.
///
/// This deliberately bypasses any HTTP/2-conformant header validation: the
/// whole point of this transport is to emit header blocks a standard H2
/// client would refuse to construct.
pub fn build_header_block(req: &Request, target: &Url) -> Vec<u8> {
    let mut pairs: Vec<(Vec<u8>, Vec<u8>)> = vec![
        (b":method".to_vec(), req.method.as_bytes().to_vec()),
        (b":scheme".to_vec(), target.scheme().as_bytes().to_vec()),
        (b":path".to_vec(), request_target(target).into_bytes()),
        (
            b":authority".to_vec(),
            req.host_override
                .clone()
                .unwrap_or_else(|| authority(target))
                .into_bytes(),
        ),
    ];

    for (name, value) in &req.headers {
        pairs.push((name.to_ascii_lowercase().into_bytes(), value.as_bytes().to_vec()));
    }

    if let Some(te) = &req.transfer_encoding {
        pairs.push((b"transfer-encoding".to_vec(), te.as_bytes().to_vec()));
    }

    if req.content_length >= 0 {
        pairs.push((
            b"content-length".to_vec(),
            req.content_length.to_string().into_bytes(),
        ));
    }

    let mut encoder = hpack::Encoder::new();
    encoder.encode(pairs.iter().map(|(name, value)| (name.as_slice(), value.as_slice())))
}

fn strip_headers_framing(payload: &[u8], flags: u8) -> Vec<u8> {
    let mut offset = 0usize;
    let mut pad_len = 0usize;
    if flags & FLAG_PADDED != 0 {
        if payload.is_empty() {
            return Vec::new();
        }
        pad_len = payload[0] as usize;
        offset += 1;
    }
    if flags & FLAG_PRIORITY != 0 {
        offset += 5;
    }
    let end = payload.len().saturating_sub(pad_len);
    if offset >= end {
        return Vec::new();
    }
    payload[offset..end].to_vec()
}

/// Sends one HTTP/2 request over a fresh TLS connection (ALPN `h2`):
/// preface, a SETTINGS frame advertising an initial window of 65535, a
/// HEADERS frame on stream 1, and a closing DATA frame — even when the
/// descriptor's `content-length` and body length disagree. Reads stream 1
/// until END_STREAM, GOAWAY, or RST_STREAM.
pub async fn send(
    req: &Request,
    target: &Url,
    proxy: Option<&ProxyConfig>,
    insecure_tls: bool,
    connect_timeout: Duration,
    request_timeout: Duration,
) -> (Result<Response, TransportError>, Duration) {
    let started = Instant::now();
    let result = send_inner(req, target, proxy, insecure_tls, connect_timeout, request_timeout)
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
    let port = target.port_or_known_default().unwrap_or(443);

    let raw = dial(&host, port, proxy, connect_timeout).await?;
    let config = tls::build_client_config(insecure_tls, &[b"h2"])?;
    let mut stream = tls::wrap(raw, &host, Arc::new(config), connect_timeout).await?;

    let attempt = async {
        stream.write_all(PREFACE).await.map_err(TransportError::Connect)?;

        let mut settings = Vec::new();
        write_frame_header(&mut settings, 6, TYPE_SETTINGS, 0, 0);
        settings.extend_from_slice(&SETTINGS_INITIAL_WINDOW_SIZE.to_be_bytes());
        settings.extend_from_slice(&65535u32.to_be_bytes());
        stream.write_all(&settings).await.map_err(TransportError::Connect)?;

        let header_block = build_header_block(req, target);
        let mut headers_frame = Vec::with_capacity(9 + header_block.len());
        write_frame_header(
            &mut headers_frame,
            header_block.len() as u32,
            TYPE_HEADERS,
            FLAG_END_HEADERS,
            1,
        );
        headers_frame.extend_from_slice(&header_block);
        stream.write_all(&headers_frame).await.map_err(TransportError::Connect)?;

        let mut data_frame = Vec::with_capacity(9 + req.body.len());
        write_frame_header(&mut data_frame, req.body.len() as u32, TYPE_DATA, FLAG_END_STREAM, 1);
        data_frame.extend_from_slice(&req.body);
        stream.write_all(&data_frame).await.map_err(TransportError::Connect)?;

        read_stream(&mut stream).await
    };

    tokio::time::timeout(request_timeout, attempt)
        .await
        .map_err(|_| TransportError::Timeout(request_timeout))?
}

async fn read_stream(stream: &mut BoxedStream) -> Result<Response, TransportError> {
    let mut status: u16 = 0;
    let mut headers = Vec::new();
    let mut body = Vec::new();

    loop {
        let mut header_buf = [0u8; 9];
        stream
            .read_exact(&mut header_buf)
            .await
            .map_err(TransportError::Connect)?;
        let frame = parse_frame_header(&header_buf);

        let mut payload = vec![0u8; frame.length as usize];
        if frame.length > 0 {
            stream
                .read_exact(&mut payload)
                .await
                .map_err(TransportError::Connect)?;
        }

        match frame.frame_type {
            TYPE_HEADERS if frame.stream_id == 1 => {
                let block = strip_headers_framing(&payload, frame.flags);
                let decoded = hpack::Decoder::new().decode(&block).unwrap_or_default();
                for (name, value) in decoded {
                    let name = String::from_utf8_lossy(&name).to_string();
                    let value = String::from_utf8_lossy(&value).to_string();
                    if name == ":status" {
                        status = value.parse().unwrap_or(0);
                    } else if !name.starts_with(':') {
                        headers.push((name, value));
                    }
                }
                if frame.flags & FLAG_END_STREAM != 0 {
                    break;
                }
            }
            TYPE_DATA if frame.stream_id == 1 => {
                body.extend_from_slice(&payload);
                if frame.flags & FLAG_END_STREAM != 0 {
                    break;
                }
            }
            TYPE_GOAWAY => return Err(TransportError::GoAway),
            TYPE_RST_STREAM if frame.stream_id == 1 => return Err(TransportError::StreamReset),
            _ => {}
        }
    }

    Ok(Response {
        status,
        headers,
        body,
        duration: Duration::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use desynctrace_protocol::HttpVersion;

    #[test]
    fn header_block_carries_explicit_zero_content_length_with_body() {
        let target = Url::parse("https://example.com/").unwrap();
        let req = Request::new("POST", "https://example.com/", HttpVersion::Http2)
            .with_content_length(0)
            .with_body(b"SMUGGLED".to_vec());

        let block = build_header_block(&req, &target);
        let decoded = hpack::Decoder::new().decode(&block).unwrap();
        let content_length = decoded
            .iter()
            .find(|(name, _)| name == b"content-length")
            .map(|(_, value)| value.clone());
        assert_eq!(content_length, Some(b"0".to_vec()));
    }

    #[test]
    fn header_block_preserves_embedded_crlf_in_value() {
        let target = Url::parse("https://example.com/").unwrap();
        let req = Request::new("GET", "https://example.com/", HttpVersion::Http2)
            .with_header("x-foo", "bar\r\nTransfer-Encoding: chunked");

        let block = build_header_block(&req, &target);
        let decoded = hpack::Decoder::new().decode(&block).unwrap();
        let value = decoded
            .iter()
            .find(|(name, _)| name == b"x-foo")
            .map(|(_, value)| value.clone())
            .unwrap();
        assert_eq!(value, b"bar\r\nTransfer-Encoding: chunked".to_vec());
    }

    #[test]
    fn frame_header_round_trips() {
        let mut buf = Vec::new();
        write_frame_header(&mut buf, 42, TYPE_DATA, FLAG_END_STREAM, 1);
        let mut arr = [0u8; 9];
        arr.copy_from_slice(&buf);
        let parsed = parse_frame_header(&arr);
        assert_eq!(parsed.length, 42);
        assert_eq!(parsed.frame_type, TYPE_DATA);
        assert_eq!(parsed.flags, FLAG_END_STREAM);
        assert_eq!(parsed.stream_id, 1);
    }
}
