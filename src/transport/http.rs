//! Blocking HTTP/1.1 client for streamed inference responses

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use serde_json::Value;

use super::{InferenceTransport, ResponseLines};
use crate::core::types::Result;
use crate::core::Error;

/// Default time to wait for the next byte of a streamed response
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts JSON to `http://host:port/base/<route>` and streams the body back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpTransport {
    host: String,
    port: u16,
    base_path: String,
    read_timeout: Option<Duration>,
}

impl HttpTransport {
    /// Parse an endpoint such as `http://localhost:8001` or `127.0.0.1:8001/api`.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = endpoint.trim();
        let rest = if let Some(rest) = endpoint.strip_prefix("http://") {
            rest
        } else if endpoint.contains("://") {
            return Err(Error::InvalidConfig(format!(
                "unsupported endpoint scheme in {:?}, only http:// is supported",
                endpoint
            )));
        } else {
            endpoint
        };

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };

        let (host, port) = split_host_port(authority)
            .ok_or_else(|| Error::InvalidConfig(format!("invalid endpoint {:?}", endpoint)))?;

        Ok(Self {
            host: host.to_string(),
            port,
            base_path: path.trim_end_matches('/').to_string(),
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
        })
    }

    /// Read timeout for the streamed body; `None` waits forever.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Request path for `route`
    pub fn path_for(&self, route: &str) -> String {
        format!("{}/{}", self.base_path, route.trim_start_matches('/'))
    }
}

fn split_host_port(authority: &str) -> Option<(&str, u16)> {
    if authority.is_empty() {
        return None;
    }
    // Bracketed IPv6 literal
    if let Some(rest) = authority.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        let port = match after.strip_prefix(':') {
            Some(p) => p.parse().ok()?,
            None if after.is_empty() => 80,
            None => return None,
        };
        return Some((host, port));
    }
    match authority.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => Some((host, port.parse().ok()?)),
        Some(_) => None,
        None => Some((authority, 80)),
    }
}

impl InferenceTransport for HttpTransport {
    fn post_lines(&self, route: &str, body: &Value) -> Result<ResponseLines> {
        let payload = serde_json::to_vec(body)?;
        let path = self.path_for(route);
        let transport_err = |what: &str, e: io::Error| {
            Error::Transport(format!("{} {}:{}{}: {}", what, self.host, self.port, path, e))
        };

        let mut stream = TcpStream::connect((self.host.as_str(), self.port))
            .map_err(|e| transport_err("cannot connect to", e))?;
        stream
            .set_read_timeout(self.read_timeout)
            .map_err(|e| transport_err("cannot configure", e))?;

        let head = format!(
            "POST {} HTTP/1.1\r\nHost: {}:{}\r\nContent-Type: application/json\r\nAccept: application/x-ndjson\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            path,
            self.host,
            self.port,
            payload.len()
        );
        stream
            .write_all(head.as_bytes())
            .and_then(|_| stream.write_all(&payload))
            .and_then(|_| stream.flush())
            .map_err(|e| transport_err("failed to send request to", e))?;

        log::debug!("POST {}:{}{} ({} bytes)", self.host, self.port, path, payload.len());

        let mut reader = BufReader::new(stream);
        let head = read_response_head(&mut reader)
            .map_err(|e| transport_err("bad response from", e))?;

        if head.status != 200 {
            let mut detail = String::new();
            let _ = reader.take(512).read_to_string(&mut detail);
            return Err(Error::Transport(format!(
                "HTTP {} from {}:{}{}: {}",
                head.status,
                self.host,
                self.port,
                path,
                detail.trim()
            )));
        }

        Ok(match head.body {
            BodyFraming::Chunked => ResponseLines::new(BufReader::new(ChunkedReader::new(reader))),
            BodyFraming::Length(len) => ResponseLines::new(reader.take(len)),
            BodyFraming::UntilClose => ResponseLines::new(reader),
        })
    }
}

/// How the response body is delimited
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyFraming {
    Chunked,
    Length(u64),
    UntilClose,
}

/// Status code and body framing of an HTTP response
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub body: BodyFraming,
}

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

/// Read the status line and headers, leaving `reader` at the start of the body.
pub fn read_response_head(reader: &mut impl BufRead) -> io::Result<ResponseHead> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed before status line"));
    }
    let mut parts = line.split_whitespace();
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(invalid_data(format!("malformed status line {:?}", line.trim())));
    }
    let status: u16 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid_data(format!("malformed status line {:?}", line.trim())))?;

    let mut body = BodyFraming::UntilClose;
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed inside headers"));
        }
        let header = line.trim_end();
        if header.is_empty() {
            break;
        }
        let Some((name, value)) = header.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("transfer-encoding") && value.to_ascii_lowercase().contains("chunked") {
            body = BodyFraming::Chunked;
        } else if name.eq_ignore_ascii_case("content-length") && body != BodyFraming::Chunked {
            let len = value
                .parse()
                .map_err(|_| invalid_data(format!("bad content-length {:?}", value)))?;
            body = BodyFraming::Length(len);
        }
    }

    Ok(ResponseHead { status, body })
}

/// Decodes a `Transfer-Encoding: chunked` body.
pub struct ChunkedReader<R> {
    inner: R,
    remaining: usize,
    done: bool,
}

impl<R: BufRead> ChunkedReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            remaining: 0,
            done: false,
        }
    }

    fn next_chunk_size(&mut self) -> io::Result<usize> {
        let mut line = String::new();
        if self.inner.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "missing chunk header"));
        }
        let size = line.trim().split(';').next().unwrap_or_default().trim();
        usize::from_str_radix(size, 16).map_err(|_| invalid_data(format!("bad chunk size {:?}", size)))
    }

    fn skip_crlf(&mut self) -> io::Result<()> {
        let mut line = String::new();
        self.inner.read_line(&mut line)?;
        if !line.trim().is_empty() {
            return Err(invalid_data("missing CRLF after chunk"));
        }
        Ok(())
    }
}

impl<R: BufRead> Read for ChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.done || buf.is_empty() {
            return Ok(0);
        }
        if self.remaining == 0 {
            let size = self.next_chunk_size()?;
            if size == 0 {
                // Skip optional trailers up to the terminating blank line
                let mut line = String::new();
                while self.inner.read_line(&mut line)? > 0 && !line.trim().is_empty() {
                    line.clear();
                }
                self.done = true;
                return Ok(0);
            }
            self.remaining = size;
        }

        let want = buf.len().min(self.remaining);
        let n = self.inner.read(&mut buf[..want])?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed inside chunk"));
        }
        self.remaining -= n;
        if self.remaining == 0 {
            self.skip_crlf()?;
        }
        Ok(n)
    }
}
