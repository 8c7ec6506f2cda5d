use std::{fmt, io, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    error::BridgeError,
    storage::{MemoryStorage, SessionStorage},
    webview::WebView,
};

/// Wire envelope shared by every delivery mechanism:
/// `{"eventType": "<name>", "eventData": <json>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "eventType")]
    pub event_type: String,
    #[serde(rename = "eventData", default)]
    pub event_data: Option<Value>,
}

/// Serializes an outbound event into its envelope text.
pub fn encode_envelope<T: Serialize + ?Sized>(event: &str, data: &T) -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct Outbound<'a, T: ?Sized> {
        #[serde(rename = "eventType")]
        event_type: &'a str,
        #[serde(rename = "eventData")]
        event_data: &'a T,
    }

    serde_json::to_string(&Outbound {
        event_type: event,
        event_data: data,
    })
}

/// Decodes an inbound envelope.
///
/// `eventData` may be any JSON value. When it is a string that itself holds a
/// JSON object or array, the decoded value replaces it; other strings are
/// kept verbatim (custom style text, for example). `null` counts as absent.
pub fn decode_envelope(raw: &str) -> serde_json::Result<Envelope> {
    let mut envelope: Envelope = serde_json::from_str(raw)?;
    envelope.event_data = match envelope.event_data.take() {
        Some(Value::Null) | None => None,
        Some(Value::String(text)) => Some(unwrap_encoded(text)),
        other => other,
    };
    Ok(envelope)
}

fn unwrap_encoded(text: String) -> Value {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value @ (Value::Object(_) | Value::Array(_))) = serde_json::from_str::<Value>(&text) {
            return value;
        }
    }
    Value::String(text)
}

/// Parent window of an embedding iframe (`window.parent.postMessage`).
pub trait ParentFrame: Send + Sync {
    fn post_message(&self, message: &str, target_origin: &str) -> io::Result<()>;
}

/// Bridge object injected by native webviews (`TelegramWebviewProxy`).
pub trait WebviewProxy: Send + Sync {
    fn post_event(&self, event: &str, data: &str) -> io::Result<()>;
}

/// `window.external.notify` style notifier used by some desktop hosts.
pub trait ExternalNotifier: Send + Sync {
    fn notify(&self, message: &str) -> io::Result<()>;
}

/// The `<style>` element the host may restyle while embedded in an iframe.
pub trait StyleSink: Send + Sync {
    fn set_style(&self, css: &str);
}

/// Page navigation used when the host is too old for link events.
pub trait Navigator: Send + Sync {
    /// Opens `url` in a new browser window.
    fn open_window(&self, url: &str) -> io::Result<()>;

    /// Navigates the current page to `url`.
    fn navigate(&self, url: &str) -> io::Result<()>;
}

/// Entry point legacy hosts call directly with `(event name, payload)`.
pub type ReceiveEvent = Arc<dyn Fn(&str, Option<Value>) -> Result<(), BridgeError> + Send + Sync>;

/// Global callback slots through which legacy hosts push events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackSlot {
    /// `window.TelegramGameProxy_receiveEvent`
    ReceiveEventFunction,
    /// `window.TelegramGameProxy.receiveEvent`
    GameProxyReceiveEvent,
}

pub trait CallbackSlots: Send + Sync {
    fn is_installed(&self, slot: CallbackSlot) -> bool;

    fn install(&self, slot: CallbackSlot, handler: ReceiveEvent);
}

/// Where an inbound window message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    Parent,
    Other,
}

/// A window `message` event as seen by the page.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub source: MessageSource,
    pub data: Value,
}

impl InboundMessage {
    /// Text message from the parent frame.
    pub fn from_parent(data: impl Into<String>) -> Self {
        Self {
            source: MessageSource::Parent,
            data: Value::String(data.into()),
        }
    }
}

/// Capabilities of the page the bridge runs in, probed once at startup.
#[derive(Clone)]
pub struct HostEnvironment {
    pub(crate) location: String,
    pub(crate) is_iframe: bool,
    pub(crate) viewport_height: f64,
    pub(crate) parent: Option<Arc<dyn ParentFrame>>,
    pub(crate) proxy: Option<Arc<dyn WebviewProxy>>,
    pub(crate) external: Option<Arc<dyn ExternalNotifier>>,
    pub(crate) style: Option<Arc<dyn StyleSink>>,
    pub(crate) callbacks: Option<Arc<dyn CallbackSlots>>,
    pub(crate) navigator: Option<Arc<dyn Navigator>>,
    pub(crate) storage: Arc<dyn SessionStorage>,
}

impl HostEnvironment {
    /// Environment for the page at `location`, with no host capabilities yet.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            is_iframe: false,
            viewport_height: 0.0,
            parent: None,
            proxy: None,
            external: None,
            style: None,
            callbacks: None,
            navigator: None,
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    /// Marks the page as embedded in an iframe whose parent is `parent`.
    pub fn with_parent_frame(mut self, parent: Arc<dyn ParentFrame>) -> Self {
        self.is_iframe = true;
        self.parent = Some(parent);
        self
    }

    pub fn with_proxy(mut self, proxy: Arc<dyn WebviewProxy>) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_external(mut self, external: Arc<dyn ExternalNotifier>) -> Self {
        self.external = Some(external);
        self
    }

    pub fn with_style_sink(mut self, style: Arc<dyn StyleSink>) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_callback_slots(mut self, callbacks: Arc<dyn CallbackSlots>) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn SessionStorage>) -> Self {
        self.storage = storage;
        self
    }

    /// Initial visible height (`window.innerHeight`).
    pub fn with_viewport_height(mut self, height: f64) -> Self {
        self.viewport_height = height;
        self
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_iframe(&self) -> bool {
        self.is_iframe
    }

    /// First available delivery mechanism, probing in priority order.
    pub fn probe_delivery(&self) -> Option<DeliveryMechanism> {
        DELIVERY_PROBES.iter().find_map(|probe| probe(self))
    }
}

type Probe = fn(&HostEnvironment) -> Option<DeliveryMechanism>;

/// Embedded frame, then injected proxy, then external notifier.
const DELIVERY_PROBES: [Probe; 3] = [probe_parent_frame, probe_proxy, probe_external];

fn probe_parent_frame(env: &HostEnvironment) -> Option<DeliveryMechanism> {
    if !env.is_iframe {
        return None;
    }
    env.parent.clone().map(DeliveryMechanism::ParentFrame)
}

fn probe_proxy(env: &HostEnvironment) -> Option<DeliveryMechanism> {
    env.proxy.clone().map(DeliveryMechanism::Proxy)
}

fn probe_external(env: &HostEnvironment) -> Option<DeliveryMechanism> {
    env.external.clone().map(DeliveryMechanism::External)
}

/// One way of getting an outbound event to the host.
#[derive(Clone)]
pub enum DeliveryMechanism {
    ParentFrame(Arc<dyn ParentFrame>),
    Proxy(Arc<dyn WebviewProxy>),
    External(Arc<dyn ExternalNotifier>),
}

impl DeliveryMechanism {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ParentFrame(_) => "postMessage",
            Self::Proxy(_) => "TelegramWebviewProxy",
            Self::External(_) => "external.notify",
        }
    }

    /// Sends `event` with `data` through this mechanism.
    pub fn deliver<T: Serialize + ?Sized>(
        &self,
        event: &str,
        data: &T,
        target_origin: &str,
    ) -> Result<(), BridgeError> {
        match self {
            Self::ParentFrame(parent) => {
                parent.post_message(&encode_envelope(event, data)?, target_origin)?
            }
            Self::Proxy(proxy) => proxy.post_event(event, &serde_json::to_string(data)?)?,
            Self::External(external) => external.notify(&encode_envelope(event, data)?)?,
        }
        Ok(())
    }
}

impl fmt::Debug for DeliveryMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Feeds window messages from `inbound` into `webview` until the sender side
/// closes.
///
/// Malformed or untrusted messages are dropped; a known event with a bad
/// payload stops the loop with [`BridgeError::ProtocolViolation`].
///
/// ```no_run
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
/// use twa_bridge::host::{event_loop, InboundMessage};
/// # async fn run(webview: Arc<twa_bridge::WebView>) -> Result<(), twa_bridge::BridgeError> {
/// let (tx, rx) = mpsc::channel(16);
/// let pump = tokio::spawn(event_loop(webview, rx));
/// tx.send(InboundMessage::from_parent(r#"{"eventType":"main_button_pressed"}"#)).await.ok();
/// drop(tx);
/// pump.await.ok();
/// # Ok(())
/// # }
/// ```
pub async fn event_loop(
    webview: Arc<WebView>,
    mut inbound: mpsc::Receiver<InboundMessage>,
) -> Result<(), BridgeError> {
    while let Some(message) = inbound.recv().await {
        webview.on_message(&message)?;
    }
    tracing::debug!("inbound channel closed");
    Ok(())
}
