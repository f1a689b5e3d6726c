//! Minimal HTTP/1.1 stand-in for the KVFinder-web API, for integration tests.
//!
//! `POST .../create` hands out ids "1", "2", ... (or replays queued replies);
//! `GET .../<id>` replays the script set for that id, repeating the last
//! entry. Unknown ids get 404. While offline, connections are closed without
//! a reply.

use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct State {
    next_id: u64,
    create_replies: VecDeque<(u16, String)>,
    scripts: HashMap<String, VecDeque<(u16, String)>>,
    created: Vec<serde_json::Value>,
    requests: Vec<String>,
    offline: bool,
}

#[derive(Clone)]
pub struct KvServer {
    base_url: String,
    state: Arc<Mutex<State>>,
}

impl KvServer {
    /// Starts the server on a background thread. It runs until the process exits.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(State::default()));
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Replies for `GET /<id>`, in order; the last one repeats.
    pub fn script(&self, id: &str, replies: Vec<(u16, String)>) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(id.to_string(), replies.into());
    }

    /// Next `POST /create` gets this reply instead of a fresh id.
    pub fn queue_create(&self, code: u16, body: &str) {
        self.state
            .lock()
            .unwrap()
            .create_replies
            .push_back((code, body.to_string()));
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// JSON bodies received on `POST /create`.
    pub fn created(&self) -> Vec<serde_json::Value> {
        self.state.lock().unwrap().created.clone()
    }

    /// Request lines seen so far, e.g. `GET /1 HTTP/1.1`.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn status_requests_for(&self, id: &str) -> usize {
        let suffix = format!("/{}", id);
        self.requests()
            .iter()
            .filter(|r| {
                let mut parts = r.split_whitespace();
                parts.next() == Some("GET") && parts.next().is_some_and(|path| path.ends_with(&suffix))
            })
            .count()
    }
}

/// JSON body of a pending job.
pub fn pending(status: &str) -> String {
    serde_json::json!({ "status": status }).to_string()
}

/// JSON body of a completed job with nested output and fixed timestamps.
pub fn completed(id: &str, pdb_kv: &str, report: &str, log: &str) -> String {
    serde_json::json!({
        "id": id,
        "status": "completed",
        "output": { "pdb_kv": pdb_kv, "report": report, "log": log },
        "created_at": "2021-09-15T12:00:00.000000",
        "started_at": "2021-09-15T12:00:01.000000",
        "ended_at": "2021-09-15T12:00:03.500000"
    })
    .to_string()
}

fn handle(mut stream: TcpStream, state: &Mutex<State>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some((request_line, body)) = read_request(&mut stream) else {
        return;
    };

    let (code, reply) = {
        let mut st = state.lock().unwrap();
        if st.offline {
            return;
        }
        st.requests.push(request_line.clone());
        route(&mut st, &request_line, &body)
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        code,
        reason(code),
        reply.len(),
        reply
    );
    let _ = stream.write_all(response.as_bytes());
}

fn route(st: &mut State, request_line: &str, body: &[u8]) -> (u16, String) {
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("");
    let last = path.rsplit('/').next().unwrap_or("");

    match (method, last) {
        ("POST", "create") => {
            if let Ok(json) = serde_json::from_slice::<serde_json::Value>(body) {
                st.created.push(json);
            }
            if let Some(queued) = st.create_replies.pop_front() {
                return queued;
            }
            st.next_id += 1;
            let id = st.next_id.to_string();
            st.scripts
                .entry(id.clone())
                .or_insert_with(|| VecDeque::from(vec![(200, pending("queued"))]));
            (200, serde_json::json!({ "id": id }).to_string())
        }
        ("GET", id) => match st.scripts.get_mut(id) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap(),
            Some(script) => script.front().cloned().unwrap_or((200, pending("queued"))),
            None => (404, r#"{"error": "Not Found"}"#.to_string()),
        },
        _ => (405, String::new()),
    }
}

fn reason(code: u16) -> &'static str {
    match code {
        200 => "OK",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Reads the request line and the body (per Content-Length).
fn read_request(stream: &mut TcpStream) -> Option<(String, Vec<u8>)> {
    let mut data = Vec::new();
    let mut buf = [0u8; 8192];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let request_line = head.lines().next()?.trim().to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while data.len() < header_end + content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }
    let body = data[header_end..].to_vec();
    Some((request_line, body))
}
