//! Wei ⇄ ETH conversion for display and input.
//!
//! 10^18 wei = 1 ETH. Display strings keep at least one fractional digit
//! (`"1.0"`, `"0.0"`) and drop trailing zeros otherwise.

use alloy_primitives::{utils, Address, U256};

use crate::error::BridgeError;

pub const ETHER_DECIMALS: usize = 18;

/// Whole-ether digits that still fit in a U256 once scaled to wei.
const MAX_WHOLE_DIGITS: usize = 59;

/// Format a wei amount as decimal ETH.
pub fn format_ether(wei: U256) -> String {
    let full = utils::format_ether(wei);
    let trimmed = full.trim_end_matches('0');
    match trimmed.strip_suffix('.') {
        Some(whole) => format!("{}.0", whole),
        None => trimmed.to_string(),
    }
}

/// Parse decimal ETH text (`"0.03"`, `"1"`, `".5"`) into wei.
///
/// Stricter than [`utils::parse_ether`]: signs, exponents and excess
/// decimals are rejected instead of being absorbed or truncated.
pub fn parse_ether(text: &str) -> Result<U256, BridgeError> {
    let text = text.trim();
    let invalid = || BridgeError::InvalidAmount(text.to_string());

    let (whole, frac) = text.split_once('.').unwrap_or((text, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > ETHER_DECIMALS {
        return Err(BridgeError::InvalidAmount(format!(
            "{} has more than {} decimals",
            text, ETHER_DECIMALS
        )));
    }
    if whole.trim_start_matches('0').len() > MAX_WHOLE_DIGITS {
        return Err(BridgeError::InvalidAmount(format!("{} is too large", text)));
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    };
    utils::parse_ether(&normalized).map_err(|_| invalid())
}

/// `0x1234...abcd` form of an address for headers and badges.
pub fn shorten_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
