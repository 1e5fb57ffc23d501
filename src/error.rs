//! Error taxonomy for provider, contract and bridge operations.

use thiserror::Error;

/// EIP-1193 code for "user rejected the request".
pub const USER_REJECTED: i64 = 4001;
/// EIP-3085/3326 code for "unrecognized chain".
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

pub type ProviderResult<T> = Result<T, ProviderError>;
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised at the wallet provider boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("no wallet provider available")]
    Unavailable,

    /// JSON-RPC / EIP-1193 error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        ProviderError::Rpc { code, message: message.into() }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, ProviderError::Rpc { code, .. } if *code == USER_REJECTED)
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Decode(e.to_string())
    }
}

impl From<alloy_sol_types::Error> for ProviderError {
    fn from(e: alloy_sol_types::Error) -> Self {
        ProviderError::Decode(e.to_string())
    }
}

/// Errors surfaced by the bridge to the presentation layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("no wallet provider installed")]
    MissingProvider,

    #[error("request rejected by user")]
    Rejected,

    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("provider transport failed: {0}")]
    Transport(String),

    #[error("unexpected provider response: {0}")]
    Decode(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("no account connected")]
    NotConnected,

    #[error("another transaction is in progress")]
    Busy,
}

impl BridgeError {
    /// Network/provider faults, as opposed to user or contract outcomes.
    pub fn is_transport(&self) -> bool {
        matches!(self, BridgeError::Transport(_) | BridgeError::Decode(_))
    }
}

impl From<ProviderError> for BridgeError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Unavailable => BridgeError::MissingProvider,
            e if e.is_user_rejection() => BridgeError::Rejected,
            ProviderError::Rpc { code, message } => BridgeError::Rpc { code, message },
            ProviderError::Transport(s) => BridgeError::Transport(s),
            ProviderError::Decode(s) => BridgeError::Decode(s),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Project ID is not defined")]
    MissingProjectId,

    #[error("invalid contract address: {0}")]
    InvalidAddress(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}
