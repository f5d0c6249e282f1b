#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use proof_sdk::{Client, ClientBuilder};
use serde_json::{json, Value};
use wiremock::{Request, Respond, ResponseTemplate};

pub const API_KEY: &str = "pk_test_123";

/// A client pointed at `server_uri` with the given retry budget.
pub fn client(server_uri: &str, max_retries: u32) -> Client {
    ClientBuilder::new()
        .api_key(API_KEY)
        .base_url(server_uri)
        .max_retries(max_retries)
        .timeout(Duration::from_secs(5))
        .build()
        .expect("client should build")
}

/// Body of a `{"error": {...}}` response.
pub fn error_body(code: &str, message: &str) -> Value {
    json!({ "error": { "code": code, "message": message } })
}

/// Answers with `pending` until the `terminal_after`-th call, then `terminal`.
pub struct StatusSequence {
    calls: AtomicUsize,
    terminal_after: usize,
    terminal: &'static str,
}

impl StatusSequence {
    pub fn new(terminal_after: usize, terminal: &'static str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            terminal_after,
            terminal,
        }
    }
}

impl Respond for StatusSequence {
    fn respond(&self, _: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let status = if n >= self.terminal_after {
            self.terminal
        } else {
            "pending"
        };
        ResponseTemplate::new(200).set_body_json(json!({ "id": "res_1", "status": status }))
    }
}

/// JSON body of the `index`-th request the server received.
pub fn request_json(requests: &[Request], index: usize) -> Value {
    serde_json::from_slice(&requests[index].body).expect("request body should be JSON")
}
