//! # twa_bridge
//!
//! A typed bridge between a web app running inside a Telegram webview (or an
//! iframe in a web client) and the native host that embeds it:
//!
//! - Send commands to the host over whichever **delivery mechanism** the page offers
//! - Receive host events, **validate** their payloads once and publish them on an **event bus**
//! - Decode launch parameters into typed records with a small **schema engine**
//! - App helpers on top: popups, main/back buttons, haptics, theme and viewport tracking
//!
//! ---
//!
//! ## How the host and the page talk
//!
//! Every message travels in the same envelope:
//!
//! ```json
//! {"eventType": "web_app_ready", "eventData": ""}
//! ```
//!
//! Outbound, the first available mechanism wins, probed in this order:
//!
//! 1. **postMessage** to the parent frame, when the page runs inside an iframe
//! 2. **TelegramWebviewProxy**, the object native webviews inject
//! 3. **external.notify**, used by some desktop hosts
//!
//! If none is present, sending fails with [`BridgeError::TransportUnavailable`].
//!
//! Inbound, hosts either post window messages (iframe) or call one of two
//! legacy global callbacks. Both routes end in the same validation step.
//!
//! ### Most important gotchas (read this first)
//!
//! - **Untrusted messages are dropped silently:** only messages whose source is the parent
//!   frame are looked at, and undecodable envelopes never reach the bus.
//! - **Known events are strict:** a `theme_changed` or `viewport_changed` with the wrong shape
//!   is a [`BridgeError::ProtocolViolation`], not a warning. Unknown events pass through as
//!   [`events::Event::Unknown`] so newer hosts do not break older apps.
//! - **Versions gate features:** most commands need host 6.1 or 6.2 and fail with
//!   [`Precondition::VersionTooLow`] on older hosts. Check with [`WebApp::is_version_at_least`].
//! - **One popup at a time:** a second [`WebApp::show_popup`] while one is open fails with
//!   [`Precondition::PopupAlreadyOpened`].
//!
//! ---
//!
//! ## Crate layout
//!
//! - [`host`]: wire envelope, host capability traits, delivery mechanisms, async inbound pump.
//! - [`webview`]: the transport context: init, send, receive, event bus access.
//! - [`events`]: the closed [`events::Event`] type and the generic [`events::EventEmitter`].
//! - [`parsing`]: schema-driven decoding over query strings and JSON objects.
//! - [`init_data`], [`theme_params`]: the launch records built on [`parsing`].
//! - [`webapp`]: the app façade.
//! - [`colors`], [`location`], [`version`], [`storage`], [`config`]: supporting pieces.
//!
//! ---
//!
//! ## Cargo setup
//!
//! Popup round-trips and the inbound pump are async and use Tokio channels and timers.
//! Your app needs a runtime to await them:
//!
//! ```toml
//! [dependencies]
//! tokio = { version = "1", features = ["macros", "rt", "sync", "time"] }
//! ```
//!
//! ---
//!
//! ## Quick start
//!
//! The embedding layer describes what the page offers in a [`HostEnvironment`]: the page
//! location (which carries the launch parameters in its fragment) and the host objects that
//! exist. Here a native proxy is faked to record what gets sent.
//!
//! ```rust
//! use std::{io, sync::{Arc, Mutex}};
//! use twa_bridge::{host::WebviewProxy, BridgeConfig, HostEnvironment};
//!
//! #[derive(Default)]
//! struct Proxy(Mutex<Vec<String>>);
//!
//! impl WebviewProxy for Proxy {
//!     fn post_event(&self, event: &str, data: &str) -> io::Result<()> {
//!         self.0.lock().unwrap().push(format!("{event} {data}"));
//!         Ok(())
//!     }
//! }
//!
//! let location = "https://app.example/#tgWebAppData=auth_date%3D1700000000%26hash%3Dabc\
//!     &tgWebAppVersion=6.2&tgWebAppPlatform=tdesktop\
//!     &tgWebAppThemeParams=%7B%22bg_color%22%3A%22%23ffffff%22%7D";
//!
//! let proxy = Arc::new(Proxy::default());
//! let env = HostEnvironment::new(location).with_proxy(proxy.clone());
//! let app = twa_bridge::init(env, BridgeConfig::default()).unwrap();
//!
//! assert_eq!(app.platform(), "tdesktop");
//! assert_eq!(app.init_data().hash(), "abc");
//! assert_eq!(app.theme().background_color(), Some("#ffffff"));
//!
//! app.ready().unwrap();
//! app.main_button().set_text("Buy").unwrap();
//!
//! let sent = proxy.0.lock().unwrap();
//! assert_eq!(sent[0], "web_app_ready \"\"");
//! assert!(sent[1].starts_with("web_app_setup_main_button"));
//! ```
//!
//! ---
//!
//! ## Listening to host events
//!
//! Listeners are `Arc`s so the same handle can later be removed. Per-event listeners run in
//! registration order, after global ones.
//!
//! ```rust
//! use std::sync::Arc;
//! use twa_bridge::events::{Event, Listener, VIEWPORT_CHANGED};
//! # use twa_bridge::{BridgeConfig, HostEnvironment, WebView};
//! # let webview = WebView::init(HostEnvironment::new(""), BridgeConfig::default()).unwrap();
//!
//! let on_viewport: Listener<Event> = Arc::new(|event: &Event| {
//!     if let Event::ViewportChanged(viewport) = event {
//!         println!("height is now {}", viewport.height);
//!     }
//! });
//! webview.on(VIEWPORT_CHANGED, on_viewport.clone());
//! // ...
//! assert!(webview.off(VIEWPORT_CHANGED, &on_viewport));
//! ```
//!
//! ### Feeding window messages
//!
//! In an iframe the embedder forwards `message` events to [`WebView::on_message`], or hands a
//! channel to [`event_loop`] which does it until the channel closes.
//!
//! ---
//!
//! ## Popups
//!
//! [`WebApp::show_popup`] returns a [`webapp::PendingPopup`]; awaiting it yields the pressed
//! button id, or `None` when the user dismissed the popup. By default the wait is unbounded;
//! set `popup.timeout_ms` in the configuration to bound it. Giving up on the handle does not
//! close the popup in the host, so the next popup can only open after `popup_closed` arrives.
//!
//! ```no_run
//! use twa_bridge::webapp::{PopupButton, PopupParams};
//! # async fn run(app: twa_bridge::WebApp) -> Result<(), twa_bridge::BridgeError> {
//! let params = PopupParams::new("Delete the draft?")
//!     .with_title("Drafts")
//!     .with_button(PopupButton::destructive("Delete").with_id("delete"))
//!     .with_button(PopupButton::cancel());
//!
//! if app.show_popup(params)?.wait().await?.as_deref() == Some("delete") {
//!     // ...
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ---
//!
//! ## Configuration
//!
//! Defaults are embedded in the crate. A TOML document overrides them key by key:
//!
//! ```rust
//! use twa_bridge::BridgeConfig;
//!
//! let config = BridgeConfig::from_toml_str(r#"
//! debug = true
//!
//! [popup]
//! timeout_ms = 30000
//! "#).unwrap();
//!
//! assert!(config.debug);
//! assert_eq!(config.target_origin, "https://web.telegram.org");
//! ```
//!
//! With `debug` on (or the `tgWebAppDebug=true` launch parameter) every received event and
//! every posted command is logged through `tracing` at `debug` level. The crate never installs
//! a subscriber; that is up to the app.
//!
//! ---
//!
//! ## Troubleshooting
//!
//! ### 1) `TransportUnavailable` on every call
//! The environment has no parent frame, proxy or external notifier. Check that the embedding
//! layer registers the object the host actually injects.
//!
//! ### 2) `init` fails with a field error
//! One of `tgWebAppData`, `tgWebAppVersion`, `tgWebAppPlatform` or `tgWebAppThemeParams` is
//! missing or malformed. [`ParseError::field_key`] names the outermost field that failed.
//!
//! ### 3) `ProtocolViolation` from the inbound pump
//! The host sent a known event with an unexpected payload. This usually means a host version
//! this crate does not know yet changed the event shape.

pub mod colors;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod init_data;
pub mod location;
pub mod parsing;
pub mod storage;
pub mod theme_params;
pub mod version;
pub mod webapp;
pub mod webview;

// -------- Re-exports --------

#[doc(inline)]
pub use config::BridgeConfig;
#[doc(inline)]
pub use error::{BridgeError, ParseError, Precondition};
#[doc(inline)]
pub use host::{event_loop, HostEnvironment};
#[doc(inline)]
pub use init_data::InitData;
#[doc(inline)]
pub use theme_params::ThemeParams;
#[doc(inline)]
pub use version::Version;
#[doc(inline)]
pub use webapp::WebApp;
#[doc(inline)]
pub use webview::WebView;

/// Builds the transport for `env` and the app on top of it.
pub fn init(env: HostEnvironment, config: BridgeConfig) -> Result<WebApp, BridgeError> {
    let webview = WebView::init(env, config)?;
    WebApp::init(webview)
}
