//! WASM module: the bridge in the browser
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           WasmApp (JS API)              │
//! │  load, connect, deposit, withdraw, ...  │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │           Bridge + Session              │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │   InjectedProvider (window.ethereum)    │
//! └─────────────────────────────────────────┘
//! ```

mod app;
mod injected;

pub use app::{JsNotifier, WasmApp};
pub use injected::InjectedProvider;

use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    crate::logging::init_console_logging();
}

/// Log to browser console
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

macro_rules! log {
    ($($t:tt)*) => {
        crate::wasm::console_log(&format!($($t)*))
    }
}

pub(crate) use log;
