//! Query API.
//!
//! Minimal HTTP/1.1 server on `std::net` for the count endpoints. One accept
//! thread, non-blocking accept with a shutdown flag; requests are handled
//! inline. The read path only takes the shared-state read lock, it never
//! waits on the acquisition loop.
//!
//! Surface:
//! - `GET /health` - liveness, independent of shared state
//! - `GET /person_count` (alias `GET /count`) - the latest published count
//! - `POST /update_count` - push mode; overwrites the count

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use crate::state::{CountSnapshot, SharedCount};

const MAX_REQUEST_BYTES: usize = 8192;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:5000".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ApiHandle {
    pub addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl ApiHandle {
    pub fn stop(mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("api server thread panicked"))?;
        }
        Ok(())
    }
}

pub struct ApiServer {
    cfg: ApiConfig,
    shared: SharedCount,
}

impl ApiServer {
    pub fn new(cfg: ApiConfig, shared: SharedCount) -> Self {
        Self { cfg, shared }
    }

    pub fn spawn(self) -> Result<ApiHandle> {
        let configured_addr: SocketAddr = self
            .cfg
            .addr
            .parse()
            .with_context(|| format!("invalid api address '{}'", self.cfg.addr))?;
        let listener = TcpListener::bind(configured_addr)
            .with_context(|| format!("bind api listener on {}", configured_addr))?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = shutdown.clone();
        let shared = self.shared;
        let join = std::thread::spawn(move || {
            if let Err(err) = run_api(listener, shared, shutdown_thread) {
                log::error!("query api stopped: {}", err);
            }
        });

        Ok(ApiHandle {
            addr,
            shutdown,
            join: Some(join),
        })
    }
}

fn run_api(listener: TcpListener, shared: SharedCount, shutdown: Arc<AtomicBool>) -> Result<()> {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match listener.accept() {
            Ok((stream, _)) => {
                if let Err(err) = handle_connection(stream, &shared) {
                    log::warn!("query api request failed: {}", err);
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct CountResponse {
    person_count: u64,
    updated_at: u64,
}

impl From<CountSnapshot> for CountResponse {
    fn from(snapshot: CountSnapshot) -> Self {
        Self {
            person_count: snapshot.count,
            updated_at: snapshot
                .updated_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }
}

fn handle_connection(mut stream: TcpStream, shared: &SharedCount) -> Result<()> {
    let request = read_request(&mut stream)?;

    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/health") => write_json_response(&mut stream, 200, r#"{"status":"healthy"}"#),
        ("GET", "/person_count") | ("GET", "/count") => {
            let body = serde_json::to_string(&CountResponse::from(shared.snapshot()))?;
            write_json_response(&mut stream, 200, &body)
        }
        ("POST", "/update_count") => match parse_pushed_count(&request.body) {
            Ok(count) => {
                shared.publish(count);
                write_json_response(&mut stream, 200, r#"{"status":"success"}"#)
            }
            Err(reason) => {
                log::warn!("rejected pushed count: {}", reason);
                let body = format!(r#"{{"status":"error","error":"{}"}}"#, reason);
                write_json_response(&mut stream, 400, &body)
            }
        },
        (_, "/health") | (_, "/person_count") | (_, "/count") | (_, "/update_count") => {
            write_json_response(&mut stream, 405, r#"{"error":"method_not_allowed"}"#)
        }
        _ => write_json_response(&mut stream, 404, r#"{"error":"not_found"}"#),
    }
}

/// Validate a pushed count payload. State stays untouched on any failure.
fn parse_pushed_count(body: &[u8]) -> std::result::Result<u64, &'static str> {
    if body.is_empty() {
        return Err("empty_body");
    }
    let value: serde_json::Value = serde_json::from_slice(body).map_err(|_| "invalid_json")?;
    let count = value.get("count").ok_or("missing_count")?;
    count.as_u64().ok_or("count_must_be_a_non_negative_integer")
}

fn read_request(stream: &mut TcpStream) -> Result<HttpRequest> {
    stream.set_read_timeout(Some(Duration::from_secs(2)))?;
    let mut buf = [0u8; 1024];
    let mut data = Vec::new();
    let header_end = loop {
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Err(anyhow!("connection closed before headers were complete"));
        }
        data.extend_from_slice(&buf[..n]);
        if data.len() > MAX_REQUEST_BYTES {
            return Err(anyhow!("request too large"));
        }
    };

    let header_text = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let mut lines = header_text.split("\r\n");
    let request_line = lines.next().ok_or_else(|| anyhow!("empty request"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().ok_or_else(|| anyhow!("missing method"))?;
    let raw_path = parts.next().ok_or_else(|| anyhow!("missing path"))?;
    let mut headers = HashMap::new();
    for line in lines {
        if let Some((k, v)) = line.split_once(':') {
            headers.insert(k.trim().to_lowercase(), v.trim().to_string());
        }
    }

    let body_start = header_end + 4;
    let content_length = match headers.get("content-length") {
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| anyhow!("invalid content-length"))?,
        None => 0,
    };
    if body_start + content_length > MAX_REQUEST_BYTES {
        return Err(anyhow!("request too large"));
    }
    while data.len() < body_start + content_length {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Err(anyhow!("request body truncated"));
        }
        data.extend_from_slice(&buf[..n]);
    }
    let body = data[body_start..body_start + content_length].to_vec();

    let path = raw_path.split('?').next().unwrap_or(raw_path).to_string();
    Ok(HttpRequest {
        method: method.to_string(),
        path,
        body,
    })
}

fn write_json_response(stream: &mut TcpStream, status: u16, body: &str) -> Result<()> {
    let status_line = match status {
        200 => "HTTP/1.1 200 OK",
        400 => "HTTP/1.1 400 Bad Request",
        404 => "HTTP/1.1 404 Not Found",
        405 => "HTTP/1.1 405 Method Not Allowed",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    let header = format!(
        "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {len}\r\nCache-Control: no-store\r\n\r\n",
        status_line = status_line,
        len = body.len()
    );
    stream.write_all(header.as_bytes())?;
    stream.write_all(body.as_bytes())?;
    Ok(())
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pushed_count_accepts_non_negative_integers() {
        assert_eq!(parse_pushed_count(br#"{"count":7}"#), Ok(7));
        assert_eq!(parse_pushed_count(br#"{"count":0}"#), Ok(0));
    }

    #[test]
    fn parse_pushed_count_rejects_bad_payloads() {
        assert_eq!(parse_pushed_count(b""), Err("empty_body"));
        assert_eq!(parse_pushed_count(b"not json"), Err("invalid_json"));
        assert_eq!(parse_pushed_count(br#"{}"#), Err("missing_count"));
        assert_eq!(
            parse_pushed_count(br#"{"count":-2}"#),
            Err("count_must_be_a_non_negative_integer")
        );
        assert_eq!(
            parse_pushed_count(br#"{"count":"7"}"#),
            Err("count_must_be_a_non_negative_integer")
        );
        assert_eq!(
            parse_pushed_count(br#"{"count":7.5}"#),
            Err("count_must_be_a_non_negative_integer")
        );
    }
}
