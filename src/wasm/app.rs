//! WasmApp: the bridge exposed to the page.
//!
//! The page owns rendering. It registers `onNotify` (toasts) and `onChange`
//! (re-render) callbacks, calls `load()` once, and reads `viewState()`.

use alloy_primitives::Address;
use js_sys::Function;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use super::injected::InjectedProvider;
use super::log;
use crate::bridge::Bridge;
use crate::config::{AppConfig, ENV_CONTRACT, ENV_NETWORK, ENV_PROJECT_ID, ENV_RPC_URL};
use crate::contract::Contract;
use crate::notify::{Notification, Notifier};

/// Values baked in at build time.
fn build_env(key: &str) -> Option<String> {
    let value = match key {
        ENV_PROJECT_ID => option_env!("USD_WITHDRAWER_PROJECT_ID"),
        ENV_CONTRACT => option_env!("USD_WITHDRAWER_CONTRACT"),
        ENV_NETWORK => option_env!("USD_WITHDRAWER_NETWORK"),
        ENV_RPC_URL => option_env!("USD_WITHDRAWER_RPC_URL"),
        _ => None,
    };
    value.map(String::from)
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    value.serialize(&serializer).unwrap_or(JsValue::NULL)
}

/// Forwards notifications to the page's toast callback and the console.
#[derive(Clone, Default)]
pub struct JsNotifier {
    callback: Rc<RefCell<Option<Function>>>,
}

impl Notifier for JsNotifier {
    fn notify(&self, notification: Notification) {
        log!("[{:?}] {}", notification.level, notification.message);
        if let Some(callback) = self.callback.borrow().as_ref() {
            let _ = callback.call1(&JsValue::NULL, &to_js(&notification));
        }
    }
}

type PageBridge = Bridge<InjectedProvider, Contract<InjectedProvider>, JsNotifier>;

#[wasm_bindgen]
pub struct WasmApp {
    bridge: Rc<PageBridge>,
    notifier: JsNotifier,
    config: AppConfig,
}

impl WasmApp {
    fn with_config(config: AppConfig) -> Self {
        log!("[WasmApp] contract {} on {}", config.contract, config.default_network.name);
        let provider = Rc::new(InjectedProvider::detect());
        let contract = Contract::new(config.contract, provider.clone());
        let notifier = JsNotifier::default();
        let bridge = Bridge::new(provider, contract, notifier.clone());
        Self { bridge: Rc::new(bridge), notifier, config }
    }

    /// No-op once subscribed; retried from `connect` for late-injected wallets.
    fn watch_accounts(&self) {
        if self.bridge.is_subscribed() {
            return;
        }
        let bridge = self.bridge.clone();
        wasm_bindgen_futures::spawn_local(async move {
            bridge.watch_accounts().await;
        });
    }
}

#[wasm_bindgen]
impl WasmApp {
    /// Fails when no connector project id was configured at build time.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmApp, JsValue> {
        let config = AppConfig::from_lookup(build_env).map_err(|e| JsValue::from_str(&e.to_string()))?;
        config.require_project_id().map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self::with_config(config))
    }

    /// Build with an explicit contract address (e.g. for a local deployment).
    #[wasm_bindgen(js_name = "withContract")]
    pub fn with_contract(project_id: String, contract: &str) -> Result<WasmApp, JsValue> {
        let contract: Address = contract
            .parse()
            .map_err(|_| JsValue::from_str(&format!("invalid contract address: {}", contract)))?;
        Ok(Self::with_config(AppConfig::new(project_id).with_contract(contract)))
    }

    #[wasm_bindgen(js_name = "onNotify")]
    pub fn on_notify(&self, callback: Function) {
        *self.notifier.callback.borrow_mut() = Some(callback);
    }

    #[wasm_bindgen(js_name = "onChange")]
    pub fn on_change(&self, callback: Function) {
        self.bridge.session().on_change(Rc::new(move || {
            let _ = callback.call0(&JsValue::NULL);
        }));
    }

    /// One-time startup: authorized account, quote, balance, account-change subscription.
    #[wasm_bindgen]
    pub async fn load(&self) {
        self.watch_accounts();
        self.bridge.load().await;
    }

    /// Re-read quote and balance.
    #[wasm_bindgen]
    pub async fn refresh(&self) {
        let _ = self.bridge.get_quote().await;
        let _ = self.bridge.get_balance().await;
    }

    /// Returns the connected account, or null.
    #[wasm_bindgen]
    pub async fn connect(&self) -> JsValue {
        match self.bridge.connect().await {
            Ok(Some(account)) => {
                self.watch_accounts();
                JsValue::from_str(&account.to_checksum(None))
            }
            _ => JsValue::NULL,
        }
    }

    #[wasm_bindgen]
    pub fn disconnect(&self) {
        self.bridge.disconnect();
    }

    #[wasm_bindgen(js_name = "setDepositAmount")]
    pub fn set_deposit_amount(&self, amount: String) {
        self.bridge.session().set_deposit_amount(amount);
    }

    /// Deposit the amount currently in the form. Outcome arrives via `onNotify`.
    #[wasm_bindgen]
    pub async fn deposit(&self) -> bool {
        let amount = self.bridge.session().deposit_amount();
        self.bridge.deposit(&amount).await.is_ok()
    }

    #[wasm_bindgen]
    pub async fn withdraw(&self) -> bool {
        self.bridge.withdraw().await.is_ok()
    }

    /// Switch the wallet to a configured network (chain id or slug).
    #[wasm_bindgen(js_name = "switchNetwork")]
    pub async fn switch_network(&self, key: String) -> bool {
        match self.config.network(&key) {
            Ok(network) => self.bridge.switch_network(&network).await.is_ok(),
            Err(e) => {
                self.notifier.notify(Notification::error(e.to_string()));
                false
            }
        }
    }

    #[wasm_bindgen(js_name = "viewState")]
    pub fn view_state(&self) -> JsValue {
        to_js(&self.bridge.session().view())
    }

    #[wasm_bindgen(getter, js_name = "projectId")]
    pub fn project_id(&self) -> Option<String> {
        self.config.project_id.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn networks(&self) -> JsValue {
        to_js(&self.config.networks)
    }

    #[wasm_bindgen(getter, js_name = "defaultNetwork")]
    pub fn default_network(&self) -> JsValue {
        to_js(&self.config.default_network)
    }
}
