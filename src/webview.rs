use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::{
    config::BridgeConfig,
    error::BridgeError,
    events::{Event, EventEmitter, GlobalListener, Listener, SET_CUSTOM_STYLE},
    host::{
        decode_envelope, CallbackSlot, DeliveryMechanism, HostEnvironment, InboundMessage,
        MessageSource, ReceiveEvent,
    },
    location::{parse_hash, SearchParams},
    storage::BridgeStorage,
};

/// Launch parameter that switches on debug logging.
const DEBUG_PARAM: &str = "tgWebAppDebug";

/// Event sent to the parent frame once an embedded app is listening.
const IFRAME_READY: &str = "iframe_ready";

/// Layer between the page and the host: sends events out, validates events
/// coming in and publishes them on the event bus.
///
/// A `WebView` only exists fully initialized. Its environment, flags and
/// launch parameters are fixed by [`WebView::init`]; only the listener
/// registry changes afterwards.
pub struct WebView {
    env: HostEnvironment,
    config: BridgeConfig,
    storage: BridgeStorage,
    init_params: SearchParams,
    debug: bool,
    events: EventEmitter<Event>,
}

impl WebView {
    /// Resolves launch parameters, wires inbound channels and, inside an
    /// iframe, tells the parent the app is ready.
    pub fn init(env: HostEnvironment, config: BridgeConfig) -> Result<Arc<Self>, BridgeError> {
        let storage = BridgeStorage::new(env.storage.clone(), config.storage_namespace.clone());
        let init_params = resolve_init_params(&env.location, &storage);
        storage.set_init_params(&init_params);

        let debug = config.debug || init_params.get(DEBUG_PARAM) == Some("true");
        let webview = Arc::new(WebView {
            env,
            config,
            storage,
            init_params,
            debug,
            events: EventEmitter::new(),
        });

        if debug {
            webview.subscribe(Arc::new(|name: &str, event: &Event| {
                tracing::debug!(event = name, data = ?event, "event received");
            }));
        }

        if webview.is_iframe() {
            webview.attach_iframe()?;
        } else {
            webview.install_legacy_callbacks();
        }

        tracing::debug!(
            iframe = webview.is_iframe(),
            debug = webview.is_debug(),
            params = webview.init_params.len(),
            "webview initialized"
        );
        Ok(webview)
    }

    fn attach_iframe(&self) -> Result<(), BridgeError> {
        if let Some(style) = self.env.style.clone() {
            self.on(
                SET_CUSTOM_STYLE,
                Arc::new(move |event: &Event| {
                    if let Event::SetCustomStyle(css) = event {
                        style.set_style(css);
                    }
                }),
            );
        }
        self.post_event_empty(IFRAME_READY)
    }

    /// Legacy hosts call global functions instead of posting messages. Both
    /// slots lead to the same validation as [`WebView::on_message`]; slots a
    /// host already filled are left alone.
    fn install_legacy_callbacks(self: &Arc<Self>) {
        let Some(slots) = self.env.callbacks.clone() else {
            return;
        };
        let webview = Arc::downgrade(self);
        let handler: ReceiveEvent = Arc::new(move |name: &str, payload: Option<Value>| {
            match webview.upgrade() {
                Some(webview) => webview.process_event(name, payload),
                None => Ok(()),
            }
        });
        for slot in [CallbackSlot::ReceiveEventFunction, CallbackSlot::GameProxyReceiveEvent] {
            if !slots.is_installed(slot) {
                slots.install(slot, Arc::clone(&handler));
            }
        }
    }

    pub fn is_iframe(&self) -> bool {
        self.env.is_iframe
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Launch parameters resolved during [`WebView::init`].
    pub fn init_params(&self) -> &SearchParams {
        &self.init_params
    }

    /// Resolves the launch parameters again from the location and the
    /// session store, without touching the ones captured at init.
    pub fn reload_init_params(&self) -> SearchParams {
        resolve_init_params(&self.env.location, &self.storage)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn storage(&self) -> &BridgeStorage {
        &self.storage
    }

    pub fn environment(&self) -> &HostEnvironment {
        &self.env
    }

    /// Handles a window `message` event.
    ///
    /// Messages from anything but the parent frame, non-text messages and
    /// undecodable envelopes are dropped. Validation errors of known events
    /// are returned.
    pub fn on_message(&self, message: &InboundMessage) -> Result<(), BridgeError> {
        if message.source != MessageSource::Parent {
            tracing::debug!("dropping message from untrusted source");
            return Ok(());
        }
        let Value::String(raw) = &message.data else {
            tracing::debug!("dropping non-text message");
            return Ok(());
        };
        let envelope = match decode_envelope(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed message");
                return Ok(());
            }
        };
        self.process_event(&envelope.event_type, envelope.event_data)
    }

    /// Validates `payload` for `name` and emits the resulting event.
    ///
    /// Unknown names are passed through [`WebView::emit_unsafe`] untouched.
    pub fn process_event(&self, name: &str, payload: Option<Value>) -> Result<(), BridgeError> {
        match Event::decode(name, payload)? {
            Event::Unknown { name, payload } => self.emit_unsafe(&name, payload),
            event => self.emit(&event),
        }
        Ok(())
    }

    pub fn emit(&self, event: &Event) {
        self.events.emit(event);
    }

    /// Emits an event this crate does not model, with an unvalidated payload.
    pub fn emit_unsafe(&self, name: &str, payload: Option<Value>) {
        let event = Event::Unknown {
            name: name.to_string(),
            payload,
        };
        self.events.emit_unsafe(name, &event);
    }

    pub fn on(&self, name: impl Into<String>, listener: Listener<Event>) {
        self.events.on(name, listener);
    }

    pub fn off(&self, name: &str, listener: &Listener<Event>) -> bool {
        self.events.off(name, listener)
    }

    pub fn subscribe(&self, listener: GlobalListener<Event>) {
        self.events.subscribe(listener);
    }

    pub fn unsubscribe(&self, listener: &GlobalListener<Event>) -> bool {
        self.events.unsubscribe(listener)
    }

    /// Mechanism the next outbound event would use.
    pub fn delivery_mechanism(&self) -> Result<DeliveryMechanism, BridgeError> {
        self.env
            .probe_delivery()
            .ok_or(BridgeError::TransportUnavailable)
    }

    /// Sends `event` to the host with a JSON-serializable payload.
    pub fn post_event<T: Serialize + ?Sized>(&self, event: &str, data: &T) -> Result<(), BridgeError> {
        let mechanism = self.delivery_mechanism()?;
        mechanism.deliver(event, data, &self.config.target_origin)?;
        if self.debug {
            tracing::debug!(via = mechanism.name(), event, "event posted");
        }
        Ok(())
    }

    /// Sends a command that carries no data.
    pub fn post_event_empty(&self, event: &str) -> Result<(), BridgeError> {
        self.post_event(event, "")
    }
}

/// Parameters from the location fragment, backfilled (never overwritten)
/// from the ones persisted earlier in the session.
fn resolve_init_params(location: &str, storage: &BridgeStorage) -> SearchParams {
    let mut params = parse_hash(location).query;
    if let Some(stored) = storage.init_params() {
        for (key, value) in stored {
            if !params.has(&key) {
                params.append(key, value);
            }
        }
    }
    params
}
