//! In-memory session state shared between the bridge and the page.
//!
//! Lives only as long as the page (or process). Nothing here is persisted.

use alloy_primitives::Address;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

use crate::units::shorten_address;

pub const DEFAULT_DEPOSIT: &str = "0.03";
pub const DEPOSIT_STEP: &str = "0.001";
pub const DEPOSIT_MIN: &str = "0.001";

const PROCESSING_LABEL: &str = "Processing...";

#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionState {
    account: Option<Address>,
    is_owner: bool,
    loading: bool,
    quote: String,
    balance: String,
    deposit_amount: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            account: None,
            is_owner: false,
            loading: false,
            quote: "0".into(),
            balance: "0".into(),
            deposit_amount: DEFAULT_DEPOSIT.into(),
        }
    }
}

/// Shared handle to the session. Cloning shares state.
#[derive(Clone, Default)]
pub struct Session {
    state: Rc<RefCell<SessionState>>,
    listeners: Rc<RefCell<Vec<Rc<dyn Fn()>>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback fired after every state change.
    pub fn on_change(&self, listener: Rc<dyn Fn()>) {
        self.listeners.borrow_mut().push(listener);
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        let changed = {
            let mut state = self.state.borrow_mut();
            let before = state.clone();
            f(&mut *state);
            *state != before
        };
        if changed {
            let listeners = self.listeners.borrow().clone();
            for listener in listeners {
                listener();
            }
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.state.borrow().account
    }

    pub fn is_owner(&self) -> bool {
        self.state.borrow().is_owner
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn quote(&self) -> String {
        self.state.borrow().quote.clone()
    }

    pub fn balance(&self) -> String {
        self.state.borrow().balance.clone()
    }

    pub fn deposit_amount(&self) -> String {
        self.state.borrow().deposit_amount.clone()
    }

    /// A new account always starts as non-owner until ownership is re-read.
    pub fn set_account(&self, account: Address) {
        self.update(|s| {
            if s.account != Some(account) {
                s.is_owner = false;
            }
            s.account = Some(account);
        });
    }

    pub fn set_owner(&self, is_owner: bool) {
        self.update(|s| s.is_owner = is_owner && s.account.is_some());
    }

    /// Drop account and owner flag. Wallet permissions are untouched.
    pub fn clear(&self) {
        self.update(|s| {
            s.account = None;
            s.is_owner = false;
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.update(|s| s.loading = loading);
    }

    pub fn set_quote(&self, quote: String) {
        self.update(|s| s.quote = quote);
    }

    pub fn set_balance(&self, balance: String) {
        self.update(|s| s.balance = balance);
    }

    pub fn set_deposit_amount(&self, amount: impl Into<String>) {
        let amount = amount.into();
        self.update(|s| s.deposit_amount = amount);
    }

    /// Deposit needs an account and no transaction in flight.
    pub fn can_deposit(&self) -> bool {
        let s = self.state.borrow();
        s.account.is_some() && !s.loading
    }

    /// Withdraw is offered to the owner only, and not while a transaction is in flight.
    pub fn can_withdraw(&self) -> bool {
        let s = self.state.borrow();
        s.is_owner && !s.loading
    }

    pub fn view(&self) -> ViewState {
        let s = self.state.borrow();
        ViewState {
            account: s.account.map(|a| a.to_checksum(None)),
            account_short: s.account.as_ref().map(shorten_address),
            connected: s.account.is_some(),
            is_owner: s.is_owner,
            loading: s.loading,
            quote: s.quote.clone(),
            balance: s.balance.clone(),
            deposit_amount: s.deposit_amount.clone(),
            deposit_step: DEPOSIT_STEP,
            deposit_min: DEPOSIT_MIN,
            deposit_enabled: self.can_deposit(),
            withdraw_visible: s.is_owner,
            withdraw_enabled: self.can_withdraw(),
            deposit_label: if s.loading { PROCESSING_LABEL } else { "Deposit" },
            withdraw_label: if s.loading { PROCESSING_LABEL } else { "Withdraw" },
        }
    }
}

/// Render-ready snapshot of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub account: Option<String>,
    pub account_short: Option<String>,
    pub connected: bool,
    pub is_owner: bool,
    pub loading: bool,
    pub quote: String,
    pub balance: String,
    pub deposit_amount: String,
    pub deposit_step: &'static str,
    pub deposit_min: &'static str,
    pub deposit_enabled: bool,
    pub withdraw_visible: bool,
    pub withdraw_enabled: bool,
    pub deposit_label: &'static str,
    pub withdraw_label: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address::from(bytes)
    }

    #[test]
    fn starts_disconnected_with_defaults() {
        let session = Session::new();
        let view = session.view();
        assert!(!view.connected);
        assert_eq!(view.quote, "0");
        assert_eq!(view.balance, "0");
        assert_eq!(view.deposit_amount, "0.03");
        assert!(!view.deposit_enabled);
        assert!(!view.withdraw_visible);
    }

    #[test]
    fn switching_account_resets_ownership() {
        let session = Session::new();
        session.set_account(addr(1));
        session.set_owner(true);
        assert!(session.is_owner());

        session.set_account(addr(1));
        assert!(session.is_owner());

        session.set_account(addr(2));
        assert!(!session.is_owner());
    }

    #[test]
    fn owner_flag_requires_account() {
        let session = Session::new();
        session.set_owner(true);
        assert!(!session.is_owner());
    }

    #[test]
    fn clear_keeps_quote_and_balance() {
        let session = Session::new();
        session.set_account(addr(3));
        session.set_owner(true);
        session.set_balance("1.5".into());
        session.clear();
        assert_eq!(session.account(), None);
        assert!(!session.is_owner());
        assert_eq!(session.balance(), "1.5");
    }

    #[test]
    fn loading_disables_controls() {
        let session = Session::new();
        session.set_account(addr(4));
        session.set_owner(true);
        session.set_loading(true);
        let view = session.view();
        assert!(!view.deposit_enabled);
        assert!(view.withdraw_visible);
        assert!(!view.withdraw_enabled);
        assert_eq!(view.deposit_label, "Processing...");

        session.set_loading(false);
        assert!(session.can_deposit());
        assert!(session.can_withdraw());
        assert_eq!(session.view().withdraw_label, "Withdraw");
    }

    #[test]
    fn listeners_fire_only_on_change() {
        let session = Session::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        session.on_change(Rc::new(move || counter.set(counter.get() + 1)));

        session.set_quote("0.02".into());
        session.set_quote("0.02".into());
        session.set_loading(false);
        assert_eq!(hits.get(), 1);
    }
}
