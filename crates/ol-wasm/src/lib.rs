//! WebAssembly bindings for originlist
//!
//! The JS WebView host passes its permission-table function to `init`; every
//! origin entry the engine installs is forwarded to it as
//! `(webview, sourceOrigin, destinationOrigin, allowSubdomains)`.

use std::cell::RefCell;
use std::sync::Arc;

use wasm_bindgen::prelude::*;

use ol_compiler::{build_whitelist, parse_config};
use ol_core::{OriginPermissionHost, OriginSync, Whitelist};

/// One permission-table entry waiting to be handed to the host.
struct PendingEntry {
    webview: u32,
    source: String,
    destination: String,
    allow_subdomains: bool,
}

/// Queues permission entries for the JS host function.
///
/// Entries are delivered by [`with_sync`] once the engine state is no longer
/// borrowed, so the host may call back into the engine from its callback.
struct JsHost {
    callback: js_sys::Function,
    pending: RefCell<Vec<PendingEntry>>,
}

impl JsHost {
    fn new(callback: js_sys::Function) -> Self {
        Self {
            callback,
            pending: RefCell::new(Vec::new()),
        }
    }
}

impl OriginPermissionHost for JsHost {
    type Handle = u32;

    fn add_origin_permission(
        &self,
        webview: &u32,
        source_origin: &str,
        destination_origin: &str,
        allow_subdomains: bool,
    ) {
        self.pending.borrow_mut().push(PendingEntry {
            webview: *webview,
            source: source_origin.to_string(),
            destination: destination_origin.to_string(),
            allow_subdomains,
        });
    }
}

fn deliver(callback: &js_sys::Function, entries: Vec<PendingEntry>) {
    for entry in entries {
        let args = js_sys::Array::new();
        args.push(&JsValue::from(entry.webview));
        args.push(&JsValue::from_str(&entry.source));
        args.push(&JsValue::from_str(&entry.destination));
        args.push(&JsValue::from(entry.allow_subdomains));

        if let Err(err) = callback.apply(&JsValue::NULL, &args) {
            web_sys::console::warn_2(&"originlist: host rejected origin entry".into(), &err);
        }
    }
}

struct EngineState {
    whitelist: Arc<Whitelist>,
    sync: OriginSync<JsHost>,
}

// wasm is single-threaded and js_sys::Function is not Sync.
thread_local! {
    static ENGINE_STATE: RefCell<Option<EngineState>> = const { RefCell::new(None) };
}

#[wasm_bindgen]
pub fn init(config_json: &str, host: js_sys::Function) -> Result<(), JsValue> {
    if is_initialized() {
        return Err(JsValue::from_str("Already initialized. Reload the page to reinitialize."));
    }

    let document = parse_config(config_json)
        .map_err(|e| JsValue::from_str(&format!("Failed to load configuration: {}", e)))?;
    let compiled = build_whitelist(&document)
        .map_err(|e| JsValue::from_str(&format!("Failed to load configuration: {}", e)))?;

    let whitelist = Arc::new(compiled.whitelist);
    let sync = OriginSync::new(Arc::clone(&whitelist), JsHost::new(host))
        .with_internal_endpoint(compiled.internal_endpoint);

    ENGINE_STATE.with(|state| match state.try_borrow_mut() {
        Ok(mut slot) => {
            *slot = Some(EngineState { whitelist, sync });
            Ok(())
        }
        Err(_) => Err(JsValue::from_str("Engine is busy; init() cannot run from a host callback.")),
    })
}

#[wasm_bindgen]
pub fn is_initialized() -> bool {
    ENGINE_STATE.with(|state| state.try_borrow().map_or(true, |engine| engine.is_some()))
}

#[wasm_bindgen]
pub fn get_config_info() -> JsValue {
    let result = js_sys::Object::new();
    ENGINE_STATE.with(|state| match state.try_borrow().ok().as_deref().and_then(Option::as_ref) {
        Some(engine) => {
            let resolver = engine.whitelist.resolver();
            let _ = js_sys::Reflect::set(&result, &"initialized".into(), &JsValue::from(true));
            let _ = js_sys::Reflect::set(&result, &"rules".into(), &JsValue::from(resolver.rules().len() as u32));
            let _ = js_sys::Reflect::set(&result, &"globalAccess".into(), &JsValue::from(resolver.global_access()));
            let _ = js_sys::Reflect::set(&result, &"domains".into(), &JsValue::from(engine.sync.domains().len() as u32));
            let _ = js_sys::Reflect::set(&result, &"webviews".into(), &JsValue::from(engine.sync.webviews().len() as u32));
        }
        None => {
            let _ = js_sys::Reflect::set(&result, &"initialized".into(), &JsValue::from(false));
        }
    });
    result.into()
}

/// Denies everything until `init` has run.
#[wasm_bindgen]
pub fn is_access_allowed(url: &str, is_xhr: bool) -> bool {
    with_whitelist(|whitelist| whitelist.is_access_allowed(url, is_xhr)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn get_features_for_url(url: &str) -> js_sys::Array {
    let features = js_sys::Array::new();
    with_whitelist(|whitelist| {
        for feature in whitelist.get_features_for_url(url) {
            features.push(&JsValue::from_str(feature.as_str()));
        }
    });
    features
}

#[wasm_bindgen]
pub fn is_feature_allowed(url: &str, feature: &str) -> bool {
    with_whitelist(|whitelist| whitelist.is_feature_allowed(url, feature)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn add_webview(handle: u32) -> Result<(), JsValue> {
    with_sync(|sync| sync.add_webview(handle))
}

#[wasm_bindgen]
pub fn add_origin_access(origin: &str, allow_subdomains: bool) -> Result<(), JsValue> {
    with_sync(|sync| sync.add_origin_access(origin, allow_subdomains))
}

fn with_whitelist<T>(f: impl FnOnce(&Whitelist) -> T) -> Option<T> {
    ENGINE_STATE.with(|state| {
        let engine = state.try_borrow().ok()?;
        engine.as_ref().map(|engine| f(&engine.whitelist))
    })
}

/// Run `f` against the sync state, then hand the entries it queued to the
/// host with the state released.
fn with_sync(f: impl FnOnce(&mut OriginSync<JsHost>)) -> Result<(), JsValue> {
    let (callback, entries) = ENGINE_STATE.with(|state| {
        let mut slot = state
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("Engine is busy."))?;
        let engine = slot
            .as_mut()
            .ok_or_else(|| JsValue::from_str("Not initialized. Call init() first."))?;

        f(&mut engine.sync);

        let host = engine.sync.host();
        let entries = std::mem::take(&mut *host.pending.borrow_mut());
        Ok::<_, JsValue>((host.callback.clone(), entries))
    })?;

    deliver(&callback, entries);
    Ok(())
}
