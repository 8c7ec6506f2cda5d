#![allow(dead_code)]

use std::{
    collections::HashMap,
    io,
    sync::{Arc, Mutex},
};

use serde_json::Value;
use twa_bridge::{
    host::{
        decode_envelope, CallbackSlot, CallbackSlots, ExternalNotifier, Navigator, ParentFrame,
        ReceiveEvent, StyleSink, WebviewProxy,
    },
    BridgeConfig, BridgeError, HostEnvironment, WebApp,
};
use url::form_urlencoded;

/// Launch data from the end-to-end example: user 1 named "A".
pub const INIT_DATA: &str =
    "user=%7B%22id%22%3A1%2C%22first_name%22%3A%22A%22%7D&auth_date=1700000000&hash=abc";

pub const DARK_THEME: &str = r##"{"bg_color":"#17212b","button_color":"#5288c1","button_text_color":"#ffffff","secondary_bg_color":"#232e3c","text_color":"#f5f5f5"}"##;

pub const LIGHT_THEME: &str = r##"{"bg_color":"#ffffff","button_color":"#2481cc","button_text_color":"#ffffff","text_color":"#000000"}"##;

/// One outbound event as the host received it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub via: &'static str,
    pub event: String,
    pub data: Value,
}

/// Fake host: implements every capability and records what it was asked to do.
#[derive(Default)]
pub struct RecordingHost {
    sent: Mutex<Vec<Sent>>,
    origins: Mutex<Vec<String>>,
    slots: Mutex<HashMap<CallbackSlot, ReceiveEvent>>,
    styles: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
    navigated: Mutex<Vec<String>>,
    fail_delivery: Mutex<bool>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, via: &'static str, event: &str, data: Value) -> io::Result<()> {
        if *self.fail_delivery.lock().unwrap() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "host went away"));
        }
        self.sent.lock().unwrap().push(Sent {
            via,
            event: event.to_string(),
            data,
        });
        Ok(())
    }

    fn record_envelope(&self, via: &'static str, message: &str) -> io::Result<()> {
        let envelope: Value = serde_json::from_str(message).expect("envelope json");
        let event = envelope["eventType"].as_str().expect("eventType").to_string();
        self.record(via, &event, envelope["eventData"].clone())
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_events(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.event).collect()
    }

    pub fn last(&self) -> Sent {
        self.sent().last().cloned().expect("nothing was sent")
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn origins(&self) -> Vec<String> {
        self.origins.lock().unwrap().clone()
    }

    pub fn styles(&self) -> Vec<String> {
        self.styles.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn navigated(&self) -> Vec<String> {
        self.navigated.lock().unwrap().clone()
    }

    pub fn fail_delivery(&self, fail: bool) {
        *self.fail_delivery.lock().unwrap() = fail;
    }

    pub fn handler(&self, slot: CallbackSlot) -> Option<ReceiveEvent> {
        self.slots.lock().unwrap().get(&slot).cloned()
    }

    /// Calls the legacy receive function the way a native host would.
    pub fn fire(&self, name: &str, payload: Option<Value>) -> Result<(), BridgeError> {
        let handler = self
            .handler(CallbackSlot::ReceiveEventFunction)
            .expect("receive function installed");
        handler(name, payload)
    }
}

impl ParentFrame for RecordingHost {
    fn post_message(&self, message: &str, target_origin: &str) -> io::Result<()> {
        self.origins.lock().unwrap().push(target_origin.to_string());
        // The envelope must survive the crate's own decoder too.
        decode_envelope(message).expect("decodable envelope");
        self.record_envelope("postMessage", message)
    }
}

impl WebviewProxy for RecordingHost {
    fn post_event(&self, event: &str, data: &str) -> io::Result<()> {
        let data = serde_json::from_str(data).expect("proxy data json");
        self.record("TelegramWebviewProxy", event, data)
    }
}

impl ExternalNotifier for RecordingHost {
    fn notify(&self, message: &str) -> io::Result<()> {
        self.record_envelope("external.notify", message)
    }
}

impl StyleSink for RecordingHost {
    fn set_style(&self, css: &str) {
        self.styles.lock().unwrap().push(css.to_string());
    }
}

impl Navigator for RecordingHost {
    fn open_window(&self, url: &str) -> io::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }

    fn navigate(&self, url: &str) -> io::Result<()> {
        self.navigated.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

impl CallbackSlots for RecordingHost {
    fn is_installed(&self, slot: CallbackSlot) -> bool {
        self.slots.lock().unwrap().contains_key(&slot)
    }

    fn install(&self, slot: CallbackSlot, handler: ReceiveEvent) {
        self.slots.lock().unwrap().insert(slot, handler);
    }
}

/// Page location carrying a full set of launch parameters in its fragment.
pub fn launch_url(version: &str, theme: &str, extra: &[(&str, &str)]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("tgWebAppData", INIT_DATA)
        .append_pair("tgWebAppVersion", version)
        .append_pair("tgWebAppPlatform", "tdesktop")
        .append_pair("tgWebAppThemeParams", theme);
    for (key, value) in extra {
        query.append_pair(key, value);
    }
    format!("https://app.example/#{}", query.finish())
}

/// Native webview: proxy, legacy callback slots and navigation.
pub fn native_env(host: &Arc<RecordingHost>, location: &str) -> HostEnvironment {
    HostEnvironment::new(location)
        .with_proxy(host.clone())
        .with_callback_slots(host.clone())
        .with_navigator(host.clone())
        .with_viewport_height(640.0)
}

/// Web client iframe: parent frame and style element.
pub fn iframe_env(host: &Arc<RecordingHost>, location: &str) -> HostEnvironment {
    HostEnvironment::new(location)
        .with_parent_frame(host.clone())
        .with_style_sink(host.clone())
        .with_navigator(host.clone())
}

pub fn native_app(version: &str) -> (Arc<RecordingHost>, WebApp) {
    native_app_with(version, BridgeConfig::default())
}

pub fn native_app_with(version: &str, config: BridgeConfig) -> (Arc<RecordingHost>, WebApp) {
    let host = RecordingHost::new();
    let env = native_env(&host, &launch_url(version, DARK_THEME, &[]));
    let app = twa_bridge::init(env, config).expect("init web app");
    (host, app)
}
