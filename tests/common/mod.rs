//! Shared utilities for integration tests: a canned-response HTTP backend
//! and a scripted `Prompt`.

#![allow(dead_code)]

use anyhow::{bail, Result};
use inventory_cli::output::Console;
use inventory_cli::ui::Prompt;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

/// One request as the backend saw it. Header names are lowercased.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Backend that answers each connection with the next canned
/// `(status, body)` pair and records what it received.
pub struct MockBackend {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockBackend {
    pub fn start(responses: Vec<(u16, &str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let mut responses: VecDeque<(u16, String)> = responses
            .into_iter()
            .map(|(status, body)| (status, body.to_string()))
            .collect();

        let recorded = requests.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let (status, body) = responses
                    .pop_front()
                    .unwrap_or((500, r#"{"error":"no canned response"}"#.to_string()));
                if let Some(request) = read_request(&stream) {
                    recorded.lock().unwrap().push(request);
                }
                write_response(stream, status, &body);
            }
        });

        Self { base_url, requests }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_request(stream: &TcpStream) -> Option<Recorded> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = HashMap::new();
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).ok()?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }

    let length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).ok()?;

    Some(Recorded {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn write_response(mut stream: TcpStream, status: u16, body: &str) {
    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// A URL nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Writer that keeps everything written to it, shared between clones.
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    /// A console whose output and error streams both land here, in order.
    pub fn console(&self) -> Console {
        Console::new(Box::new(self.clone()), Box::new(self.clone()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Answer {
    Choose(usize),
    Text(&'static str),
    Number(i64),
    Price(f64),
}

/// `Prompt` that replays a fixed list of answers in order.
pub struct Scripted {
    answers: VecDeque<Answer>,
}

impl Scripted {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: answers.into(),
        }
    }

    fn next(&mut self, prompt: &str) -> Result<Answer> {
        match self.answers.pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("script exhausted at prompt {prompt:?}"),
        }
    }
}

impl Prompt for Scripted {
    fn select(&mut self, prompt: &str, items: &[&str]) -> Result<usize> {
        match self.next(prompt)? {
            Answer::Choose(index) if index < items.len() => Ok(index),
            other => bail!("expected a choice among {items:?} for {prompt:?}, got {other:?}"),
        }
    }

    fn text(&mut self, prompt: &str) -> Result<String> {
        match self.next(prompt)? {
            Answer::Text(text) => Ok(text.to_string()),
            other => bail!("expected text for {prompt:?}, got {other:?}"),
        }
    }

    fn password(&mut self, prompt: &str) -> Result<String> {
        self.text(prompt)
    }

    fn whole_number(&mut self, prompt: &str) -> Result<i64> {
        match self.next(prompt)? {
            Answer::Number(n) => Ok(n),
            other => bail!("expected a whole number for {prompt:?}, got {other:?}"),
        }
    }

    fn price(&mut self, prompt: &str) -> Result<f64> {
        match self.next(prompt)? {
            Answer::Price(p) => Ok(p),
            other => bail!("expected a price for {prompt:?}, got {other:?}"),
        }
    }
}
