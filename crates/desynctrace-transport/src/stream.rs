use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use url::Url;

use crate::error::TransportError;

/// Any connected, optionally proxied, optionally TLS-wrapped byte stream.
/// Boxed so HTTP/1.1 and HTTP/2 senders share one dialing path regardless of
/// which proxy (if any) sits in front of the target.
pub trait IoStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> IoStream for T {}
pub type BoxedStream = Box<dyn IoStream>;

/// Upstream proxy the transport should dial through instead of the target
/// directly.
#[derive(Debug, Clone)]
pub enum ProxyConfig {
    Http(Url),
    Https(Url),
    Socks5(Url),
}

impl ProxyConfig {
    pub fn parse(raw: &str) -> Result<Self, TransportError> {
        let url = Url::parse(raw).map_err(|err| TransportError::InvalidUrl(err.to_string()))?;
        match url.scheme() {
            "http" => Ok(ProxyConfig::Http(url)),
            "https" => Ok(ProxyConfig::Https(url)),
            "socks5" | "socks5h" => Ok(ProxyConfig::Socks5(url)),
            other => Err(TransportError::UnsupportedProxyScheme(other.to_string())),
        }
    }

    fn host_port(&self, default_port: u16) -> Result<(String, u16), TransportError> {
        let url = match self {
            ProxyConfig::Http(u) | ProxyConfig::Https(u) | ProxyConfig::Socks5(u) => u,
        };
        let host = url
            .host_str()
            .ok_or_else(|| TransportError::InvalidUrl("proxy url missing host".into()))?
            .to_string();
        Ok((host, url.port().unwrap_or(default_port)))
    }
}

/// Opens a TCP connection to `host:port`, optionally tunneled through
/// `proxy`, bounded by `connect_timeout`. Never performs a TLS handshake;
/// callers wrap the result themselves when the target requires TLS.
pub async fn dial(
    host: &str,
    port: u16,
    proxy: Option<&ProxyConfig>,
    connect_timeout: Duration,
) -> Result<BoxedStream, TransportError> {
    tokio::time::timeout(connect_timeout, dial_inner(host, port, proxy))
        .await
        .map_err(|_| TransportError::Timeout(connect_timeout))?
}

async fn dial_inner(
    host: &str,
    port: u16,
    proxy: Option<&ProxyConfig>,
) -> Result<BoxedStream, TransportError> {
    match proxy {
        None => {
            let stream = TcpStream::connect((host, port)).await?;
            Ok(Box::new(stream))
        }
        Some(ProxyConfig::Socks5(proxy_url)) => {
            let (proxy_host, proxy_port) = ProxyConfig::Socks5(proxy_url.clone()).host_port(1080)?;
            let stream = tokio_socks::tcp::Socks5Stream::connect(
                (proxy_host.as_str(), proxy_port),
                (host, port),
            )
            .await
            .map_err(|err| TransportError::Connect(io::Error::other(err.to_string())))?;
            Ok(Box::new(stream))
        }
        Some(proxy @ (ProxyConfig::Http(_) | ProxyConfig::Https(_))) => {
            let (proxy_host, proxy_port) = proxy.host_port(8080)?;
            let mut stream = TcpStream::connect((proxy_host.as_str(), proxy_port)).await?;
            connect_tunnel(&mut stream, host, port).await?;
            Ok(Box::new(stream))
        }
    }
}

/// Issues an HTTP `CONNECT` through an already-dialed proxy connection and
/// consumes the proxy's response headers, leaving the socket positioned at
/// the start of the tunneled byte stream.
async fn connect_tunnel(stream: &mut TcpStream, host: &str, port: u16) -> Result<(), TransportError> {
    let request = format!("CONNECT {host}:{port} HTTP/1.1\r\nHost: {host}:{port}\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut buf = Vec::with_capacity(512);
    let mut chunk = [0u8; 512];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(TransportError::Connect(io::Error::other(
                "proxy closed connection during CONNECT",
            )));
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if buf.len() > 8192 {
            return Err(TransportError::Malformed("oversized CONNECT response".into()));
        }
    }

    let status_line = buf
        .split(|&b| b == b'\r' || b == b'\n')
        .next()
        .unwrap_or(&[]);
    let status_line = String::from_utf8_lossy(status_line);
    if !status_line.contains(" 200") {
        return Err(TransportError::Connect(io::Error::other(format!(
            "CONNECT tunnel rejected: {status_line}"
        ))));
    }
    Ok(())
}
