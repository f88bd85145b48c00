//! Mock TCP server used only by this crate's own behavioral tests. Accepts
//! plain-text HTTP/1.1 connections and replays a fixed queue of actions
//! against the requests it receives, in order, across however many
//! connections the detector under test opens.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

#[derive(Clone, Copy)]
pub enum MockAction {
    /// Write `body` verbatim, then close the connection.
    Respond(&'static str),
    /// Write `body` verbatim and keep the connection open for the next
    /// request in the queue.
    RespondKeepAlive(&'static str),
    /// Never respond; used to force the client side into a timeout.
    Stall,
}

enum Schedule {
    Sequence(VecDeque<MockAction>),
    Repeat(MockAction),
}

/// Binds an ephemeral port, serves `actions` in order against whatever
/// requests arrive (possibly over several connections — a new connection
/// continues pulling from the same shared queue), and returns the
/// `host:port` string to dial. Once the queue is exhausted, further
/// connections stall.
pub async fn spawn_mock(actions: Vec<MockAction>) -> String {
    spawn(Schedule::Sequence(VecDeque::from(actions))).await
}

/// Binds an ephemeral port and applies the same action to every connection
/// it receives, indefinitely. Used for "this server always answers the same
/// way" scenarios where the number of connections a detector will open isn't
/// fixed in advance.
pub async fn spawn_repeating(action: MockAction) -> String {
    spawn(Schedule::Repeat(action)).await
}

async fn spawn(schedule: Schedule) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock listener");
    let addr = listener.local_addr().expect("mock listener local addr");
    let schedule = Arc::new(Mutex::new(schedule));

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(serve_connection(stream, schedule.clone()));
        }
    });

    format!("127.0.0.1:{}", addr.port())
}

async fn serve_connection(mut stream: TcpStream, schedule: Arc<Mutex<Schedule>>) {
    loop {
        if read_one_request(&mut stream).await.is_none() {
            return;
        }
        let action = {
            let mut schedule = schedule.lock().await;
            match &mut *schedule {
                Schedule::Sequence(queue) => queue.pop_front(),
                Schedule::Repeat(action) => Some(*action),
            }
        };
        match action {
            Some(MockAction::Respond(body)) => {
                let _ = stream.write_all(body.as_bytes()).await;
                return;
            }
            Some(MockAction::RespondKeepAlive(body)) => {
                if stream.write_all(body.as_bytes()).await.is_err() {
                    return;
                }
            }
            Some(MockAction::Stall) | None => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                return;
            }
        }
    }
}

/// Reads one HTTP/1.1 request off `stream`: headers up to the double CRLF,
/// then exactly `Content-Length` more body bytes (0 when the header is
/// absent, which covers every bodyless GET this test suite sends).
async fn read_one_request(stream: &mut TcpStream) -> Option<()> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        if let Some(idx) = find_double_crlf(&buf) {
            break idx;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let content_length = parse_content_length(&buf[..header_end]).unwrap_or(0);
    let body_end = header_end + 4 + content_length;
    while buf.len() < body_end {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Some(())
}

fn find_double_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

fn parse_content_length(header_bytes: &[u8]) -> Option<usize> {
    for line in header_bytes.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
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
