use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use serde::Serialize;

use crate::{
    colors::to_rgb_ext,
    error::BridgeError,
    events::{Event, Listener, BACK_BUTTON_PRESSED, MAIN_BUTTON_PRESSED},
    version::Version,
    webview::WebView,
};

const SETUP_MAIN_BUTTON: &str = "web_app_setup_main_button";
const SETUP_BACK_BUTTON: &str = "web_app_setup_back_button";
const MAX_TEXT: usize = 64;

/// Doubles as the `web_app_setup_main_button` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct MainButtonState {
    is_visible: bool,
    is_active: bool,
    is_progress_visible: bool,
    text: String,
    color: String,
    text_color: String,
}

impl Default for MainButtonState {
    fn default() -> Self {
        Self {
            is_visible: false,
            is_active: true,
            is_progress_visible: false,
            text: "CONTINUE".to_string(),
            color: "#2481cc".to_string(),
            text_color: "#ffffff".to_string(),
        }
    }
}

/// The button displayed at the bottom of the app.
///
/// Every setter sends the full button state to the host, but only when it
/// actually changed.
pub struct MainButton {
    webview: Arc<WebView>,
    state: Mutex<MainButtonState>,
}

impl MainButton {
    pub(crate) fn new(webview: Arc<WebView>) -> Self {
        Self {
            webview,
            state: Mutex::new(MainButtonState::default()),
        }
    }

    /// Takes a theme color without telling the host.
    pub(crate) fn seed_color(&self, color: &str) {
        self.state().color = color.to_string();
    }

    pub(crate) fn seed_text_color(&self, color: &str) {
        self.state().text_color = color.to_string();
    }

    fn state(&self) -> MutexGuard<'_, MainButtonState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, change: impl FnOnce(&mut MainButtonState)) -> Result<&Self, BridgeError> {
        let (before, snapshot) = {
            let mut state = self.state();
            let before = state.clone();
            change(&mut state);
            if *state == before {
                return Ok(self);
            }
            (before, state.clone())
        };
        if let Err(err) = self.webview.post_event(SETUP_MAIN_BUTTON, &snapshot) {
            // Roll back so that retrying the same change is sent again.
            let mut state = self.state();
            if *state == snapshot {
                *state = before;
            }
            return Err(err);
        }
        Ok(self)
    }

    pub fn show(&self) -> Result<&Self, BridgeError> {
        self.update(|s| s.is_visible = true)
    }

    pub fn hide(&self) -> Result<&Self, BridgeError> {
        self.update(|s| s.is_visible = false)
    }

    pub fn enable(&self) -> Result<&Self, BridgeError> {
        self.update(|s| s.is_active = true)
    }

    pub fn disable(&self) -> Result<&Self, BridgeError> {
        self.update(|s| s.is_active = false)
    }

    /// Shows a loading indicator on the button.
    pub fn show_progress(&self) -> Result<&Self, BridgeError> {
        self.update(|s| s.is_progress_visible = true)
    }

    pub fn hide_progress(&self) -> Result<&Self, BridgeError> {
        self.update(|s| s.is_progress_visible = false)
    }

    /// Sets the label. Must be 1 to 64 characters once trimmed.
    pub fn set_text(&self, text: &str) -> Result<&Self, BridgeError> {
        let trimmed = text.trim();
        let len = trimmed.chars().count();
        if !(1..=MAX_TEXT).contains(&len) {
            return Err(BridgeError::length("main button text", len, 1, MAX_TEXT));
        }
        self.update(|s| s.text = trimmed.to_string())
    }

    /// Accepts any RGB notation; stored as `#rrggbb`.
    pub fn set_color(&self, color: &str) -> Result<&Self, BridgeError> {
        let color = to_rgb_ext(color)?;
        self.update(|s| s.color = color)
    }

    pub fn set_text_color(&self, color: &str) -> Result<&Self, BridgeError> {
        let color = to_rgb_ext(color)?;
        self.update(|s| s.text_color = color)
    }

    pub fn text(&self) -> String {
        self.state().text.clone()
    }

    pub fn color(&self) -> String {
        self.state().color.clone()
    }

    pub fn text_color(&self) -> String {
        self.state().text_color.clone()
    }

    pub fn is_visible(&self) -> bool {
        self.state().is_visible
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active
    }

    pub fn is_progress_visible(&self) -> bool {
        self.state().is_progress_visible
    }

    pub fn on_click(&self, listener: Listener<Event>) {
        self.webview.on(MAIN_BUTTON_PRESSED, listener);
    }

    pub fn off_click(&self, listener: &Listener<Event>) -> bool {
        self.webview.off(MAIN_BUTTON_PRESSED, listener)
    }
}

#[derive(Serialize)]
struct BackButtonSetup {
    is_visible: bool,
}

/// The back button in the app header. Requires host 6.1.
pub struct BackButton {
    webview: Arc<WebView>,
    version: Version,
    is_visible: AtomicBool,
}

impl BackButton {
    pub(crate) fn new(webview: Arc<WebView>, version: Version) -> Self {
        Self {
            webview,
            version,
            is_visible: AtomicBool::new(false),
        }
    }

    fn set_visible(&self, is_visible: bool) -> Result<(), BridgeError> {
        self.version.require("6.1")?;
        let before = self.is_visible.swap(is_visible, Ordering::Relaxed);
        let sent = self
            .webview
            .post_event(SETUP_BACK_BUTTON, &BackButtonSetup { is_visible });
        if sent.is_err() {
            self.is_visible.store(before, Ordering::Relaxed);
        }
        sent
    }

    pub fn show(&self) -> Result<(), BridgeError> {
        self.set_visible(true)
    }

    pub fn hide(&self) -> Result<(), BridgeError> {
        self.set_visible(false)
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible.load(Ordering::Relaxed)
    }

    pub fn on_click(&self, listener: Listener<Event>) {
        self.webview.on(BACK_BUTTON_PRESSED, listener);
    }

    pub fn off_click(&self, listener: &Listener<Event>) -> bool {
        self.webview.off(BACK_BUTTON_PRESSED, listener)
    }
}
