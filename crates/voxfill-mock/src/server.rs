//! HTTP/1.1 server streaming mock inference results

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use crate::error::MockError;
use crate::protocol::{ColorRequest, MockModel, StructureRequest};

/// Largest request body accepted
const MAX_BODY: usize = 64 * 1024 * 1024;

/// Handle to a server running on a background thread; dropping it stops the server.
pub struct MockServer {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl MockServer {
    /// Bind an ephemeral port on 127.0.0.1 and serve `model` from its own runtime.
    pub fn spawn(model: MockModel) -> std::io::Result<Self> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;

        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();
        let (shutdown, stopped) = oneshot::channel();

        let thread = std::thread::spawn(move || {
            runtime.block_on(async move {
                let listener = match TcpListener::from_std(listener) {
                    Ok(l) => l,
                    Err(e) => {
                        log::error!("Failed to register mock listener: {}", e);
                        return;
                    }
                };
                tokio::select! {
                    _ = accept_loop(listener, model, counter) => {}
                    _ = stopped => log::debug!("Mock server on {} stopped", addr),
                }
            });
        });

        log::info!("Mock inference server ({:?}) listening on {}", model, addr);
        Ok(Self {
            addr,
            requests,
            shutdown: Some(shutdown),
            thread: Some(thread),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Endpoint URL to hand to the client
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests answered so far, errors included
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Serve `model` on `listener` until the process exits.
pub async fn serve(listener: TcpListener, model: MockModel) {
    accept_loop(listener, model, Arc::new(AtomicUsize::new(0))).await;
}

async fn accept_loop(listener: TcpListener, model: MockModel, requests: Arc<AtomicUsize>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                log::debug!("Mock client connected from {}", peer);
                let requests = requests.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, model, &requests).await {
                        log::error!("Mock connection {} failed: {}", peer, e);
                    }
                });
            }
            Err(e) => {
                log::error!("Mock server accept error: {}", e);
            }
        }
    }
}

/// A parsed request line, headers and body
struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

async fn read_request(reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>) -> Result<HttpRequest, MockError> {
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Err(MockError::BadRequest("connection closed before request line".to_string()));
    }
    let mut parts = line.split_whitespace();
    let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
        return Err(MockError::BadRequest(format!("malformed request line {:?}", line.trim())));
    };
    let (method, path) = (method.to_string(), path.to_string());

    let mut content_length = 0usize;
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Err(MockError::BadRequest("connection closed inside headers".to_string()));
        }
        let header = line.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value
                    .trim()
                    .parse()
                    .map_err(|_| MockError::BadRequest(format!("bad content-length {:?}", value.trim())))?;
            }
        }
    }
    if content_length > MAX_BODY {
        return Err(MockError::BadRequest(format!("body of {} bytes is too large", content_length)));
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;
    Ok(HttpRequest { method, path, body })
}

fn answer(model: MockModel, request: &HttpRequest) -> Result<Vec<String>, MockError> {
    if request.method != "POST" {
        return Err(MockError::NotFound(format!("{} {}", request.method, request.path)));
    }
    let route = request.path.rsplit('/').next().unwrap_or_default();
    match route {
        "structure" => {
            let body: StructureRequest = serde_json::from_slice(&request.body)?;
            if body.data.iter().any(|tube| tube.len() != body.data[0].len()) {
                return Err(MockError::BadRequest("tubes differ in length".to_string()));
            }
            Ok(model.structure_lines(&body))
        }
        "color" => {
            let body: ColorRequest = serde_json::from_slice(&request.body)?;
            if !(0.0..=1.0).contains(&body.strength) {
                return Err(MockError::BadRequest(format!("strength {} outside [0, 1]", body.strength)));
            }
            Ok(model.color_lines(&body))
        }
        _ => Err(MockError::NotFound(request.path.clone())),
    }
}

async fn handle_connection(stream: TcpStream, model: MockModel, requests: &AtomicUsize) -> Result<(), MockError> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let result = match read_request(&mut reader).await {
        Ok(request) => {
            requests.fetch_add(1, Ordering::SeqCst);
            log::debug!("{} {} ({} bytes)", request.method, request.path, request.body.len());
            answer(model, &request)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(lines) => {
            writer
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
                )
                .await?;
            for line in lines {
                let chunk = format!("{:x}\r\n{}\n\r\n", line.len() + 1, line);
                writer.write_all(chunk.as_bytes()).await?;
                writer.flush().await?;
            }
            writer.write_all(b"0\r\n\r\n").await?;
        }
        Err(e) => {
            log::warn!("Rejecting request: {}", e);
            let (status, reason) = e.status();
            let message = e.to_string();
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                message.len(),
                message
            );
            writer.write_all(response.as_bytes()).await?;
        }
    }
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, path: &str, body: &str) -> HttpRequest {
        HttpRequest {
            method: method.to_string(),
            path: path.to_string(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_routes() {
        let body = r#"{"data": [[1, null]], "y": 0, "sampling": {"strategy": "greedy"}}"#;
        let lines = answer(MockModel::Solid, &request("POST", "/api/structure", body)).unwrap();
        assert_eq!(lines, vec!["[[1,1]]"]);

        assert!(matches!(
            answer(MockModel::Solid, &request("POST", "/voxels", body)),
            Err(MockError::NotFound(_))
        ));
        assert!(matches!(
            answer(MockModel::Solid, &request("GET", "/structure", "")),
            Err(MockError::NotFound(_))
        ));
        assert!(matches!(
            answer(MockModel::Solid, &request("POST", "/structure", "{")),
            Err(MockError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_bad_strength() {
        let body = r#"{"data": [[[[-1]]]], "y": 0, "steps": 1, "strength": 2.0}"#;
        let err = answer(MockModel::Solid, &request("POST", "/color", body)).unwrap_err();
        assert_eq!(err.status().0, 400);
    }

    #[test]
    fn test_spawn_and_drop() {
        let server = MockServer::spawn(MockModel::Empty).unwrap();
        assert!(server.endpoint().starts_with("http://127.0.0.1:"));
        assert_eq!(server.request_count(), 0);
        drop(server);
    }
}
