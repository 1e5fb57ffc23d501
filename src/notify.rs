//! User-facing notifications (toasts).

use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

pub const MSG_INSTALL_WALLET: &str = "Please install MetaMask!";
pub const MSG_DEPOSIT_OK: &str = "ETH deposited successfully!";
pub const MSG_DEPOSIT_FAILED: &str = "Error while depositing";
pub const MSG_WITHDRAW_OK: &str = "Withdrawal successful!";
pub const MSG_WITHDRAW_FAILED: &str = "Error while withdrawing";
pub const MSG_LOAD_FAILED: &str = "Failed to load contract data";
pub const MSG_CONNECT_FAILED: &str = "Failed to connect wallet";
pub const MSG_BUSY: &str = "A transaction is already in progress";
pub const MSG_NOT_CONNECTED: &str = "Connect a wallet first";
pub const MSG_SWITCH_FAILED: &str = "Failed to switch network";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: Level::Success, message: message.into() }
    }
    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: Level::Warning, message: message.into() }
    }
    pub fn error(message: impl Into<String>) -> Self {
        Self { level: Level::Error, message: message.into() }
    }
}

/// Sink for notifications. The page renders them as toasts; the CLI prints them.
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

/// Keeps every notification in order. Used by the CLI summary and by tests.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Rc<RefCell<Vec<Notification>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.seen.borrow().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.seen.borrow().last().cloned()
    }

    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.seen.borrow_mut())
    }
}

impl Notifier for Recorder {
    fn notify(&self, notification: Notification) {
        self.seen.borrow_mut().push(notification);
    }
}
