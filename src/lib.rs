//! USD Withdrawer: wallet-contract bridge.
//!
//! # Architecture
//!
//! ```text
//! Presentation (WasmApp in the browser, CLI natively)
//!   │
//!   └── Bridge
//!         ├── Web3<P: ProviderClient>   injected wallet / JSON-RPC node
//!         ├── C: ContractClient         owner, 50 USD quote, withdraw
//!         ├── Session                   account, owner flag, loading
//!         └── N: Notifier               success / warning / error toasts
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Wallet / contract call |
//! |-----------|--------|------------------------|
//! | connect | `bridge.connect()` | `eth_requestAccounts` |
//! | check ownership | `bridge.check_ownership(a)` | `owner()` |
//! | quote | `bridge.get_quote()` | `getETHAmountFor50USD()` |
//! | balance | `bridge.get_balance()` | `eth_getBalance(contract)` |
//! | deposit | `bridge.deposit("0.03")` | `eth_sendTransaction { to: contract, value }` |
//! | withdraw | `bridge.withdraw()` | `withdraw50USDInETH()` |
//! | disconnect | `bridge.disconnect()` | none (local only) |
//!
//! # Features
//!
//! - `native` - HTTP JSON-RPC provider, CLI, tracing subscriber
//! - `wasm` - `window.ethereum` provider and the `WasmApp` JS bindings
//!
//! # Usage
//!
//! ```ignore
//! use std::rc::Rc;
//! use usd_withdrawer::{AppConfig, Bridge, Contract, HttpProvider, Recorder};
//!
//! let config = AppConfig::from_env()?;
//! let provider = Rc::new(HttpProvider::new(config.rpc_url()));
//! let contract = Contract::new(config.contract, provider.clone());
//! let bridge = Bridge::new(provider, contract, Recorder::new());
//!
//! bridge.connect().await?;
//! let quote = bridge.get_quote().await?;
//! bridge.deposit("0.03").await?;
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod bridge;
pub mod config;
pub mod contract;
pub mod error;
pub mod notify;
pub mod provider;
pub mod session;
pub mod units;

// =============================================================================
// Native-only modules (CLI, HTTP, tokio)
// =============================================================================
#[cfg(feature = "native")]
pub mod rpc;

// Subscriber setup: stderr for the CLI, console for the browser
#[cfg(any(feature = "native", feature = "wasm"))]
pub mod logging;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports: Shared
// =============================================================================
pub use bridge::Bridge;
pub use config::{AppConfig, Network};
pub use contract::{Contract, ContractClient};
pub use error::{BridgeError, BridgeResult, ConfigError, ProviderError, ProviderResult};
pub use notify::{Level, Notification, Notifier, Recorder};
pub use provider::{ProviderClient, Receipt, TransactionRequest, Web3};
pub use session::{Session, ViewState};
pub use units::{format_ether, parse_ether, shorten_address};

pub use alloy_primitives::{Address, B256, U256};

// =============================================================================
// Re-exports: Native
// =============================================================================
#[cfg(feature = "native")]
pub use rpc::HttpProvider;

// =============================================================================
// Re-exports: WASM
// =============================================================================
#[cfg(feature = "wasm")]
pub use wasm::{InjectedProvider, WasmApp};
