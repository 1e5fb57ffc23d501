//! In-memory wallet for integration tests.
//!
//! Answers EIP-1193 requests against a scripted single-contract chain.

#![allow(dead_code)]

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use futures::channel::mpsc;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use usd_withdrawer::contract::IUsdWithdrawer;
use usd_withdrawer::error::{ProviderError, ProviderResult, USER_REJECTED, UNRECOGNIZED_CHAIN};
use usd_withdrawer::logging::line_subscriber;
use usd_withdrawer::{ProviderClient, Recorder, Session};

/// EIP-55 example address, used as the owner.
pub const OWNER_LOWER: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
pub const OWNER_UPPER: &str = "0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED";
pub const STRANGER: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";
pub const CONTRACT: &str = "0xb0e53957BCC04aeD42C69755070B5AfD187d53DA";

/// 0.016 ETH for 50 USD.
pub const QUOTE_WEI: u64 = 16_000_000_000_000_000;

pub fn addr(s: &str) -> Address {
    s.parse().expect("address")
}

pub fn eth(s: &str) -> U256 {
    usd_withdrawer::parse_ether(s).expect("amount")
}

fn word(bytes: &[u8]) -> String {
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(bytes);
    format!("0x{}", hex::encode(out))
}

fn selector_of(data: &str) -> String {
    data.trim_start_matches("0x").chars().take(8).collect()
}

pub struct ChainState {
    pub available: bool,
    pub accounts: Vec<String>,
    pub owner: Address,
    pub contract: Address,
    pub quote: U256,
    pub balances: HashMap<Address, U256>,
    pub receipts: HashMap<B256, Value>,
    pub sent: Vec<Value>,
    pub methods: Vec<String>,
    pub pending_polls: u32,
    pub reject_prompt: bool,
    pub reject_send: bool,
    pub fail_sends: bool,
    pub fail_reads: bool,
    pub revert_on_chain: bool,
    pub chains: Vec<u64>,
    pub chain_id: u64,
    pub events: Option<mpsc::UnboundedSender<Vec<String>>>,
    nonce: u8,
}

impl Default for ChainState {
    fn default() -> Self {
        let contract = addr(CONTRACT);
        Self {
            available: true,
            accounts: vec![OWNER_LOWER.to_string()],
            owner: addr(OWNER_UPPER),
            contract,
            quote: U256::from(QUOTE_WEI),
            balances: HashMap::from([(contract, eth("0.05"))]),
            receipts: HashMap::new(),
            sent: Vec::new(),
            methods: Vec::new(),
            pending_polls: 0,
            reject_prompt: false,
            reject_send: false,
            fail_sends: false,
            fail_reads: false,
            revert_on_chain: false,
            chains: vec![1, 534351],
            chain_id: 534351,
            events: None,
            nonce: 0,
        }
    }
}

#[derive(Default)]
pub struct FakeWallet {
    pub state: RefCell<ChainState>,
}

impl FakeWallet {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn without_extension() -> Rc<Self> {
        let wallet = Self::default();
        wallet.state.borrow_mut().available = false;
        Rc::new(wallet)
    }

    pub fn with_accounts(accounts: &[&str]) -> Rc<Self> {
        let wallet = Self::default();
        wallet.state.borrow_mut().accounts = accounts.iter().map(|s| s.to_string()).collect();
        Rc::new(wallet)
    }

    pub fn balance_of(&self, who: Address) -> U256 {
        self.state.borrow().balances.get(&who).copied().unwrap_or_default()
    }

    pub fn contract_balance(&self) -> U256 {
        let contract = self.state.borrow().contract;
        self.balance_of(contract)
    }

    pub fn methods(&self) -> Vec<String> {
        self.state.borrow().methods.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.state.borrow().methods.iter().filter(|m| *m == method).count()
    }

    pub fn sent(&self) -> Vec<Value> {
        self.state.borrow().sent.clone()
    }

    /// Emit `accountsChanged` to the subscriber.
    pub fn emit_accounts(&self, accounts: &[&str]) {
        let state = self.state.borrow();
        let tx = state.events.as_ref().expect("no subscriber");
        tx.unbounded_send(accounts.iter().map(|s| s.to_string()).collect())
            .expect("send");
    }

    /// Drop the event sender so a watch loop ends after queued events.
    pub fn close_events(&self) {
        self.state.borrow_mut().events = None;
    }

    fn call(&self, params: &Value) -> ProviderResult<Value> {
        let state = self.state.borrow();
        if state.fail_reads {
            return Err(ProviderError::Transport("connection reset".into()));
        }
        let data = params[0]["data"].as_str().unwrap_or_default();
        let selector = selector_of(data);
        if selector == hex::encode(IUsdWithdrawer::ownerCall::SELECTOR) {
            Ok(json!(word(state.owner.as_slice())))
        } else if selector == hex::encode(IUsdWithdrawer::getETHAmountFor50USDCall::SELECTOR) {
            Ok(json!(word(&state.quote.to_be_bytes::<32>())))
        } else {
            Err(ProviderError::rpc(-32000, "execution reverted"))
        }
    }

    fn send(&self, params: &Value) -> ProviderResult<Value> {
        let mut state = self.state.borrow_mut();
        if state.reject_send {
            return Err(ProviderError::rpc(USER_REJECTED, "User denied transaction signature."));
        }
        if state.fail_sends {
            return Err(ProviderError::Transport("connection reset".into()));
        }
        let tx = params[0].clone();
        let from: Address = serde_json::from_value(tx["from"].clone()).map_err(ProviderError::from)?;
        let to: Address = serde_json::from_value(tx["to"].clone()).map_err(ProviderError::from)?;
        let value: U256 = match tx.get("value") {
            Some(v) => serde_json::from_value(v.clone()).map_err(ProviderError::from)?,
            None => U256::ZERO,
        };
        let data = tx.get("data").and_then(|d| d.as_str()).unwrap_or("0x").to_string();

        if to == state.contract && selector_of(&data) == hex::encode(IUsdWithdrawer::withdraw50USDInETHCall::SELECTOR) {
            // Wallet gas estimation surfaces the contract's require() failure.
            if from != state.owner {
                return Err(ProviderError::rpc(-32603, "execution reverted: Only owner can withdraw"));
            }
            let contract = state.contract;
            let quote = state.quote;
            let held = state.balances.get(&contract).copied().unwrap_or_default();
            if held < quote {
                return Err(ProviderError::rpc(-32603, "execution reverted: Insufficient balance"));
            }
            if !state.revert_on_chain {
                state.balances.insert(contract, held - quote);
                *state.balances.entry(from).or_default() += quote;
            }
        } else if !state.revert_on_chain {
            *state.balances.entry(to).or_default() += value;
        }

        state.nonce += 1;
        let nonce = state.nonce;
        let hash = B256::repeat_byte(nonce);
        let status = if state.revert_on_chain { "0x0" } else { "0x1" };
        state.receipts.insert(
            hash,
            json!({
                "transactionHash": hash,
                "blockNumber": format!("0x{:x}", 100 + nonce as u64),
                "status": status,
            }),
        );
        state.sent.push(tx);
        Ok(json!(hash))
    }

    fn receipt(&self, params: &Value) -> ProviderResult<Value> {
        let mut state = self.state.borrow_mut();
        if state.pending_polls > 0 {
            state.pending_polls -= 1;
            return Ok(Value::Null);
        }
        let hash: B256 = serde_json::from_value(params[0].clone()).map_err(ProviderError::from)?;
        Ok(state.receipts.get(&hash).cloned().unwrap_or(Value::Null))
    }
}

#[async_trait(?Send)]
impl ProviderClient for FakeWallet {
    fn is_available(&self) -> bool {
        self.state.borrow().available
    }

    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
        self.state.borrow_mut().methods.push(method.to_string());
        match method {
            "eth_accounts" => Ok(json!(self.state.borrow().accounts)),
            "eth_requestAccounts" => {
                let state = self.state.borrow();
                if state.reject_prompt {
                    return Err(ProviderError::rpc(USER_REJECTED, "User rejected the request."));
                }
                Ok(json!(state.accounts))
            }
            "eth_chainId" => Ok(json!(format!("0x{:x}", self.state.borrow().chain_id))),
            "eth_call" => self.call(&params),
            "eth_getBalance" => {
                if self.state.borrow().fail_reads {
                    return Err(ProviderError::Transport("connection reset".into()));
                }
                let who: Address = serde_json::from_value(params[0].clone()).map_err(ProviderError::from)?;
                Ok(json!(self.balance_of(who)))
            }
            "eth_sendTransaction" => self.send(&params),
            "eth_getTransactionReceipt" => self.receipt(&params),
            "wallet_switchEthereumChain" => {
                let id = u64::from_str_radix(
                    params[0]["chainId"].as_str().unwrap_or_default().trim_start_matches("0x"),
                    16,
                )
                .unwrap_or_default();
                let mut state = self.state.borrow_mut();
                if !state.chains.contains(&id) {
                    return Err(ProviderError::rpc(UNRECOGNIZED_CHAIN, "Unrecognized chain ID"));
                }
                state.chain_id = id;
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                let id = u64::from_str_radix(
                    params[0]["chainId"].as_str().unwrap_or_default().trim_start_matches("0x"),
                    16,
                )
                .unwrap_or_default();
                let mut state = self.state.borrow_mut();
                state.chains.push(id);
                state.chain_id = id;
                Ok(Value::Null)
            }
            other => Err(ProviderError::rpc(-32601, format!("method {} not found", other))),
        }
    }

    fn subscribe_accounts(&self) -> Option<mpsc::UnboundedReceiver<Vec<String>>> {
        let (tx, rx) = mpsc::unbounded();
        self.state.borrow_mut().events = Some(tx);
        Some(rx)
    }
}

pub type TestBridge = usd_withdrawer::Bridge<FakeWallet, usd_withdrawer::Contract<FakeWallet>, Recorder>;

pub fn bridge_for(wallet: &Rc<FakeWallet>) -> (TestBridge, Recorder) {
    let contract = usd_withdrawer::Contract::new(addr(CONTRACT), wallet.clone());
    let recorder = Recorder::new();
    let bridge = usd_withdrawer::Bridge::with_session(wallet.clone(), contract, recorder.clone(), Session::new());
    (bridge, recorder)
}

pub type LogLines = Arc<Mutex<Vec<(tracing::Level, String)>>>;

/// Collect log events emitted on this thread until the guard drops.
pub fn capture_logs() -> (LogLines, tracing::subscriber::DefaultGuard) {
    let lines: LogLines = Arc::default();
    let sink = {
        let lines = lines.clone();
        move |level: tracing::Level, line: &str| lines.lock().unwrap().push((level, line.to_string()))
    };
    let guard = tracing::subscriber::set_default(line_subscriber(sink));
    (lines, guard)
}
