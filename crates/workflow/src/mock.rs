//! Scripted `Api` double: canned responses per path, every request recorded.

use async_trait::async_trait;
use ecourts_client::Api;
use ecourts_core::{Error, Result};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
}

#[derive(Default)]
pub struct MockApi {
    responses: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    requests: Mutex<Vec<Recorded>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, body: Value) -> &Self {
        self.push(path, Ok(body))
    }

    pub fn fail(&self, path: &str, err: Error) -> &Self {
        self.push(path, Err(err))
    }

    fn push(&self, path: &str, response: Result<Value>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    pub fn last_body(&self, path: &str) -> Option<Value> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.path == path)
            .map(|r| r.body)
    }

    fn next(&self, method: &'static str, path: &str, body: Value) -> Result<Value> {
        self.requests.lock().unwrap().push(Recorded {
            method,
            path: path.to_string(),
            body,
        });
        self.responses
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(Error::Other(format!("no canned response for {}", path))))
    }
}

#[async_trait]
impl Api for MockApi {
    async fn get(&self, path: &str) -> Result<Value> {
        self.next("GET", path, Value::Null)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.next("POST", path, body.clone())
    }
}
