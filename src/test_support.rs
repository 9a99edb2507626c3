use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::completion::{CompletionClient, CompletionFuture};
use crate::config::Config;
use crate::error::ChatError;
use crate::model::{GenerationParams, Message};

#[derive(Debug)]
pub(crate) struct CapturedRequest {
    pub head: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then_some(value.trim())
        })
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body should be JSON")
    }
}

pub(crate) fn test_config(api_url: &str) -> Config {
    let vars = HashMap::from([
        ("CHAT_API_URL", api_url.to_string()),
        ("CHAT_MODEL", "test/model".to_string()),
        ("SYSTEM_PROMPT", "sys".to_string()),
        ("REQUEST_TIMEOUT_SECS", "5".to_string()),
    ]);
    Config::from_env_with(|key| vars.get(key).cloned())
}

fn read_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos + 4;
        }
        let read = stream.read(&mut chunk).expect("read should succeed");
        if read == 0 {
            break buf.len();
        }
        buf.extend_from_slice(&chunk[..read]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let captured = CapturedRequest {
        head,
        body: String::new(),
    };
    let content_length = captured
        .header("content-length")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let read = stream.read(&mut chunk).expect("read should succeed");
        if read == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..read]);
    }

    CapturedRequest {
        body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
        ..captured
    }
}

/// Serves exactly one canned HTTP response and hands back what the client sent.
pub(crate) fn serve_once(
    status_line: &'static str,
    body: &'static str,
) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let addr = listener.local_addr().expect("address should be available");
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept should succeed");
        let request = read_request(&mut stream);
        let response = format!(
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream
            .write_all(response.as_bytes())
            .expect("write should succeed");
        request
    });
    (format!("http://{addr}/api/v1/chat/completions"), handle)
}

/// Accepts one request and never answers it.
pub(crate) fn serve_silently(hold: Duration) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let addr = listener.local_addr().expect("address should be available");
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept should succeed");
        let _ = read_request(&mut stream);
        thread::sleep(hold);
    });
    (format!("http://{addr}/api/v1/chat/completions"), handle)
}

#[derive(Debug)]
enum StubOutcome {
    Reply(String),
    Status(u16, String),
    Hang,
}

/// Records every request it sees and answers with a fixed outcome.
#[derive(Debug)]
pub(crate) struct StubClient {
    pub calls: RefCell<Vec<Vec<Message>>>,
    outcome: StubOutcome,
}

impl StubClient {
    pub fn reply(content: impl Into<String>) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            outcome: StubOutcome::Reply(content.into()),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            outcome: StubOutcome::Status(status, body.into()),
        }
    }

    /// Never answers, like a request stuck on a slow endpoint.
    pub fn hanging() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            outcome: StubOutcome::Hang,
        }
    }
}

impl CompletionClient for StubClient {
    fn model(&self) -> &str {
        "stub/model"
    }

    fn complete<'a>(
        &'a self,
        messages: &'a [Message],
        _params: &'a GenerationParams,
    ) -> CompletionFuture<'a> {
        self.calls.borrow_mut().push(messages.to_vec());
        let result = match &self.outcome {
            StubOutcome::Reply(content) => Ok(content.clone()),
            StubOutcome::Status(status, body) => Err(ChatError::Http {
                status: *status,
                body: body.clone(),
            }),
            StubOutcome::Hang => return Box::pin(std::future::pending()),
        };
        Box::pin(async move { result })
    }
}
