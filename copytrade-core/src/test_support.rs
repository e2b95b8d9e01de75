// Test doubles: a recording push transport and a canned-response HTTP server

use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::realtime::{ClientMessage, Connection, EventSender, Handshake, RealtimeError, Transport};

// ====================================================================
// PUSH TRANSPORT
// ====================================================================

/// Records everything a client does to its connections. `open` is shared by
/// every connection the fake hands out.
#[derive(Default)]
pub(crate) struct Recorder {
    pub open: AtomicBool,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub emitted: Mutex<Vec<ClientMessage>>,
    pub handshakes: Mutex<Vec<Handshake>>,
    events: Mutex<Vec<EventSender>>,
}

impl Recorder {
    /// Event handles in the order the connections were opened
    pub fn senders(&self) -> Vec<EventSender> {
        self.events.lock().unwrap().clone()
    }
}

pub(crate) struct FakeTransport {
    recorder: Arc<Recorder>,
}

impl FakeTransport {
    pub fn new(recorder: Arc<Recorder>) -> Self {
        Self { recorder }
    }
}

struct FakeConnection {
    recorder: Arc<Recorder>,
}

impl Transport for FakeTransport {
    fn open(
        &self,
        handshake: &Handshake,
        events: EventSender,
    ) -> Result<Box<dyn Connection>, RealtimeError> {
        self.recorder.opened.fetch_add(1, Ordering::SeqCst);
        self.recorder
            .handshakes
            .lock()
            .unwrap()
            .push(handshake.clone());
        self.recorder.events.lock().unwrap().push(events);
        Ok(Box::new(FakeConnection {
            recorder: self.recorder.clone(),
        }))
    }
}

impl Connection for FakeConnection {
    fn is_open(&self) -> bool {
        self.recorder.open.load(Ordering::SeqCst)
    }

    fn emit(&self, message: &ClientMessage) -> Result<(), RealtimeError> {
        self.recorder.emitted.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn close(&self) {
        self.recorder.open.store(false, Ordering::SeqCst);
        self.recorder.closed.fetch_add(1, Ordering::SeqCst);
    }
}

// ====================================================================
// HTTP
// ====================================================================

/// Canned-response HTTP server, one response per connection
pub(crate) struct MockHttpServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockHttpServer {
    /// Serves `responses` in order with status 200, one per connection
    pub async fn start(responses: Vec<Value>) -> Self {
        Self::start_with_status(responses.into_iter().map(|body| (200, body)).collect()).await
    }

    pub async fn start_with_status(responses: Vec<(u16, Value)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        tokio::spawn(async move {
            let mut responses = responses.into_iter();
            while let Ok((mut stream, _)) = listener.accept().await {
                let request = read_request(&mut stream).await;
                log.lock().unwrap().push(request);

                let (status, body) = responses
                    .next()
                    .unwrap_or((404, json!({ "message": "no canned response left" })));
                let body = body.to_string();
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    if status < 400 { "OK" } else { "Error" },
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self { addr, requests }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Raw requests received so far (request line, headers and body)
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
