//! Provider abstraction and the HTTP JSON-RPC implementation.
//!
//! ## Resilience
//!
//! * [`HttpProvider`] retries transport failures and HTTP 429 responses with
//!   exponential back-off, at most `max_retries` times (zero by default).
//! * JSON-RPC error objects are never retried: they carry the node's verdict
//!   (revert, rejection) and are classified into [`RpcError`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{Result, RpcError};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

/// Anything that answers EIP-1193 style `request(method, params)` calls.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorPayload>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorPayload {
    code: i64,
    message: String,
    data: Option<Value>,
}

/// JSON-RPC 2.0 over HTTP.
pub struct HttpProvider {
    client: Client,
    url: String,
    max_retries: u32,
    next_id: AtomicU64,
}

impl HttpProvider {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            max_retries: 0,
            next_id: AtomicU64::new(1),
        }
    }

    /// Retry transport failures up to `max_retries` times.
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn backoff(&self, attempt: &mut u32, backoff: &mut u64) -> bool {
        if *attempt >= self.max_retries {
            return false;
        }
        *attempt += 1;
        tokio::time::sleep(Duration::from_secs(*backoff)).await;
        *backoff = (*backoff * 2).min(MAX_BACKOFF_SECS);
        true
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let mut attempt = 0;
        let mut backoff = INITIAL_BACKOFF_SECS;

        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let response = self
                .client
                .post(&self.url)
                .json(&json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "method": method,
                    "params": params,
                }))
                .send()
                .await;

            let resp = match response {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(method, "RPC request failed (retry in {backoff}s): {e}");
                    if self.backoff(&mut attempt, &mut backoff).await {
                        continue;
                    }
                    return Err(e.into());
                }
            };

            if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                warn!(method, "Rate-limited by RPC (retry in {backoff}s)");
                if self.backoff(&mut attempt, &mut backoff).await {
                    continue;
                }
                return Err(RpcError::RateLimited);
            }

            let body: RpcResponse = resp.json().await?;
            if let Some(err) = body.error {
                debug!(method, code = err.code, "RPC returned error: {}", err.message);
                return Err(RpcError::from_payload(
                    err.code,
                    err.message,
                    err.data.as_ref(),
                ));
            }

            debug!(method, id, "RPC call succeeded");
            return Ok(body.result);
        }
    }
}
