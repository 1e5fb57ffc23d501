//! Wallet provider boundary.
//!
//! [`ProviderClient`] is the raw EIP-1193 surface (`request`, `accountsChanged`).
//! [`Web3`] layers typed calls on top of it; the contract binding and the
//! bridge only ever talk to a provider through `Web3`.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use futures::channel::mpsc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;

use crate::config::Network;
use crate::error::{ProviderError, ProviderResult};

/// Delay between receipt polls for providers that need one.
pub const POLL_INTERVAL_MS: u64 = 1_000;

/// Injected wallet capability.
///
/// Single-threaded: implementations may hold `Rc`/`RefCell` and JS handles.
#[async_trait(?Send)]
pub trait ProviderClient {
    /// Whether a wallet is present at all (e.g. `window.ethereum` exists).
    fn is_available(&self) -> bool {
        true
    }

    /// EIP-1193 `request({ method, params })`.
    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value>;

    /// Stream of `accountsChanged` payloads. `None` if the provider emits no events.
    fn subscribe_accounts(&self) -> Option<mpsc::UnboundedReceiver<Vec<String>>> {
        None
    }

    /// Wait between receipt polls.
    async fn pause(&self) {}
}

/// A wallet handle looked up on demand and kept once found.
///
/// Extensions may inject after the page starts, so a miss is never cached.
pub struct Detected<T> {
    found: RefCell<Option<T>>,
}

impl<T> Default for Detected<T> {
    fn default() -> Self {
        Self { found: RefCell::new(None) }
    }
}

impl<T: Clone> Detected<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached handle, or the result of `lookup` if it finds one now.
    pub fn get_or_lookup(&self, lookup: impl FnOnce() -> Option<T>) -> Option<T> {
        if let Some(found) = self.found.borrow().as_ref() {
            return Some(found.clone());
        }
        let found = lookup()?;
        *self.found.borrow_mut() = Some(found.clone());
        Some(found)
    }
}

/// Outgoing transaction, serialized as an `eth_sendTransaction` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
}

impl TransactionRequest {
    pub fn transfer(from: Address, to: Address, value: U256) -> Self {
        Self { from, to, value: Some(value), data: None }
    }

    pub fn call(from: Address, to: Address, data: Bytes) -> Self {
        Self { from, to, value: None, data: Some(data) }
    }
}

/// The subset of a transaction receipt the bridge cares about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub status: Option<U64>,
}

impl Receipt {
    /// Pre-Byzantium receipts carry no status; treat them as success.
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| s != U64::ZERO)
    }
}

/// Typed JSON-RPC calls over a [`ProviderClient`].
pub struct Web3<P> {
    provider: Rc<P>,
}

impl<P> Clone for Web3<P> {
    fn clone(&self) -> Self {
        Self { provider: self.provider.clone() }
    }
}

impl<P: ProviderClient> Web3<P> {
    pub fn new(provider: Rc<P>) -> Self {
        Self { provider }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_available()
    }

    async fn request<T: for<'de> Deserialize<'de>>(&self, method: &str, params: Value) -> ProviderResult<T> {
        if !self.provider.is_available() {
            return Err(ProviderError::Unavailable);
        }
        let value = self.provider.request(method, params).await?;
        serde_json::from_value(value)
            .map_err(|e| ProviderError::Decode(format!("{}: {}", method, e)))
    }

    /// Already-authorized accounts (`eth_accounts`); never prompts.
    pub async fn accounts(&self) -> ProviderResult<Vec<Address>> {
        let raw: Vec<String> = self.request("eth_accounts", json!([])).await?;
        parse_accounts(&raw)
    }

    /// Prompt for account access (`eth_requestAccounts`).
    pub async fn request_accounts(&self) -> ProviderResult<Vec<Address>> {
        let raw: Vec<String> = self.request("eth_requestAccounts", json!([])).await?;
        parse_accounts(&raw)
    }

    pub async fn chain_id(&self) -> ProviderResult<u64> {
        let id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    pub async fn get_balance(&self, address: Address) -> ProviderResult<U256> {
        self.request("eth_getBalance", json!([address, "latest"])).await
    }

    /// Read-only `eth_call` against `to`.
    pub async fn call(&self, to: Address, data: Bytes) -> ProviderResult<Bytes> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"])).await
    }

    pub async fn send_transaction(&self, tx: &TransactionRequest) -> ProviderResult<B256> {
        self.request("eth_sendTransaction", json!([tx])).await
    }

    /// Poll until the transaction has one confirmation. No timeout.
    pub async fn wait_for_receipt(&self, tx_hash: B256) -> ProviderResult<Receipt> {
        loop {
            let receipt: Option<Receipt> =
                self.request("eth_getTransactionReceipt", json!([tx_hash])).await?;
            match receipt {
                Some(r) if r.block_number.is_some() => return Ok(r),
                _ => self.provider.pause().await,
            }
        }
    }

    pub async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()> {
        let _: Value = self
            .request("wallet_switchEthereumChain", json!([{ "chainId": U64::from(chain_id) }]))
            .await?;
        Ok(())
    }

    pub async fn add_chain(&self, network: &Network) -> ProviderResult<()> {
        let _: Value = self.request("wallet_addEthereumChain", json!([network.to_add_chain_params()])).await?;
        Ok(())
    }

    pub fn subscribe_accounts(&self) -> Option<mpsc::UnboundedReceiver<Vec<String>>> {
        if !self.provider.is_available() {
            return None;
        }
        self.provider.subscribe_accounts()
    }
}

/// Parse provider account strings; any hex case is accepted.
pub fn parse_accounts(raw: &[String]) -> ProviderResult<Vec<Address>> {
    raw.iter()
        .map(|s| {
            s.parse::<Address>()
                .map_err(|e| ProviderError::Decode(format!("account {}: {}", s, e)))
        })
        .collect()
}
