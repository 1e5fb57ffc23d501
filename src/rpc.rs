//! HttpProvider - JSON-RPC over HTTP as a [`ProviderClient`].
//!
//! For nodes that hold unlocked accounts (local dev nodes). There is no
//! prompt, so `eth_requestAccounts` is answered with `eth_accounts`, and
//! HTTP has no push channel, so account changes are never reported.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::cell::Cell;
use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{ProviderClient, POLL_INTERVAL_MS};

#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

pub struct HttpProvider {
    client: reqwest::Client,
    url: String,
    next_id: Cell<u64>,
    poll_interval: Duration,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            next_id: Cell::new(1),
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
        }
    }
}

#[async_trait(?Send)]
impl ProviderClient for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
        let method = match method {
            "eth_requestAccounts" => "eth_accounts",
            other => other,
        };
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        tracing::trace!(method, id, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("{}: {}", self.url, e)))?;
        if !response.status().is_success() {
            return Err(ProviderError::Transport(format!("{}: HTTP {}", self.url, response.status())));
        }
        let reply: RpcReply = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("{}: {}", method, e)))?;

        if let Some(err) = reply.error {
            return Err(ProviderError::rpc(err.code, err.message));
        }
        Ok(reply.result.unwrap_or(Value::Null))
    }

    async fn pause(&self) {
        tokio::time::sleep(self.poll_interval).await;
    }
}
