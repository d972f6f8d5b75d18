//! Scripted in-memory [`Provider`] for unit tests.
//!
//! Responses are queued per method and consumed in order. Once a method's
//! queue runs dry the last response it served is repeated, so a single
//! `respond` covers any number of identical calls.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{Result, RpcError};
use crate::provider::Provider;

#[derive(Debug, Clone)]
enum Scripted {
    Ok(Value),
    Err {
        code: i64,
        message: String,
        data: Option<Value>,
    },
}

#[derive(Default)]
struct Script {
    queue: VecDeque<Scripted>,
    last: Option<Scripted>,
}

#[derive(Default)]
pub struct MockProvider {
    responses: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful result for `method`.
    pub fn respond(&self, method: &str, result: Value) -> &Self {
        self.push(method, Scripted::Ok(result))
    }

    /// Queue a JSON-RPC error object for `method`.
    pub fn fail(&self, method: &str, code: i64, message: &str, data: Option<Value>) -> &Self {
        self.push(
            method,
            Scripted::Err {
                code,
                message: message.to_string(),
                data,
            },
        )
    }

    /// Every request seen so far, in order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    /// Params of every request to `method`, in order.
    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    fn push(&self, method: &str, scripted: Scripted) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .queue
            .push_back(scripted);
        self
    }

    fn next(&self, method: &str) -> Option<Scripted> {
        let mut responses = self.responses.lock().unwrap();
        let script = responses.get_mut(method)?;
        if let Some(next) = script.queue.pop_front() {
            script.last = Some(next.clone());
            return Some(next);
        }
        script.last.clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));

        match self.next(method) {
            Some(Scripted::Ok(value)) => Ok(value),
            Some(Scripted::Err {
                code,
                message,
                data,
            }) => Err(RpcError::from_payload(code, message, data.as_ref())),
            None => Err(RpcError::Node {
                code: -32601,
                message: format!("method {method} not scripted"),
            }),
        }
    }
}
