//! InjectedProvider: `window.ethereum` as a [`ProviderClient`].

use async_trait::async_trait;
use futures::channel::mpsc;
use js_sys::{Function, Promise, Reflect};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::log;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{Detected, ProviderClient, POLL_INTERVAL_MS};

/// EIP-1193 provider injected by a wallet extension, if any.
///
/// `window.ethereum` is looked up on every use until a wallet shows up.
#[derive(Default)]
pub struct InjectedProvider {
    ethereum: Detected<JsValue>,
}

impl InjectedProvider {
    /// A missing wallet is not an error here.
    pub fn detect() -> Self {
        let provider = Self::default();
        if provider.lookup().is_none() {
            log!("[InjectedProvider] window.ethereum not found yet");
        }
        provider
    }

    fn lookup(&self) -> Option<JsValue> {
        self.ethereum.get_or_lookup(|| {
            web_sys::window()
                .and_then(|w| Reflect::get(&w, &JsValue::from_str("ethereum")).ok())
                .filter(|v| !v.is_undefined() && !v.is_null())
        })
    }

    fn ethereum(&self) -> ProviderResult<JsValue> {
        self.lookup().ok_or(ProviderError::Unavailable)
    }

    fn method(&self, name: &str) -> ProviderResult<Function> {
        Reflect::get(&self.ethereum()?, &JsValue::from_str(name))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| ProviderError::Transport(format!("ethereum.{} is not a function", name)))
    }
}

fn to_js(value: &Value) -> ProviderResult<JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    value
        .serialize(&serializer)
        .map_err(|e| ProviderError::Decode(e.to_string()))
}

/// Wallet rejections arrive as `{ code, message }` objects.
fn provider_error(err: JsValue) -> ProviderError {
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|c| c.as_f64());
    let message = Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", err));
    match code {
        Some(code) => ProviderError::rpc(code as i64, message),
        None => ProviderError::Transport(message),
    }
}

#[async_trait(?Send)]
impl ProviderClient for InjectedProvider {
    fn is_available(&self) -> bool {
        self.lookup().is_some()
    }

    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
        let request = self.method("request")?;
        let args = to_js(&serde_json::json!({ "method": method, "params": params }))?;
        let promise: Promise = request
            .call1(&self.ethereum()?, &args)
            .map_err(provider_error)?
            .dyn_into()
            .map_err(|_| ProviderError::Transport("request did not return a promise".into()))?;
        let result = JsFuture::from(promise).await.map_err(provider_error)?;
        if result.is_undefined() || result.is_null() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result).map_err(|e| ProviderError::Decode(e.to_string()))
    }

    fn subscribe_accounts(&self) -> Option<mpsc::UnboundedReceiver<Vec<String>>> {
        let ethereum = self.lookup()?;
        let on = self.method("on").ok()?;
        let (tx, rx) = mpsc::unbounded();
        let handler = Closure::<dyn FnMut(JsValue)>::new(move |accounts: JsValue| {
            match serde_wasm_bindgen::from_value::<Vec<String>>(accounts) {
                Ok(accounts) => {
                    let _ = tx.unbounded_send(accounts);
                }
                Err(e) => log!("[InjectedProvider] bad accountsChanged payload: {}", e),
            }
        });
        let subscribed = on
            .call2(&ethereum, &JsValue::from_str("accountsChanged"), handler.as_ref())
            .is_ok();
        // Lives as long as the page.
        handler.forget();
        subscribed.then_some(rx)
    }

    async fn pause(&self) {
        let promise = Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    &resolve,
                    POLL_INTERVAL_MS as i32,
                );
            }
        });
        let _ = JsFuture::from(promise).await;
    }
}
