//! Application-level helpers on top of the transport: launch metadata,
//! theme and viewport state, host commands gated by protocol version.

mod buttons;
mod haptic;
mod popup;

pub use buttons::{BackButton, MainButton};
pub use haptic::{HapticFeedback, ImpactStyle, NotificationType};
pub use popup::{PendingPopup, PopupButton, PopupButtonKind, PopupParams};

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use serde::Serialize;

use crate::{
    colors::{is_color_dark, to_rgb_ext},
    error::{BridgeError, ParseError, Precondition},
    events::{Event, POPUP_CLOSED, THEME_CHANGED, VIEWPORT_CHANGED},
    init_data::InitData,
    location::{format_url, SearchParams},
    parsing::{self, search_params, Fields, Schema},
    theme_params::ThemeParams,
    version::Version,
    webview::WebView,
};
use popup::{OpenPopup, PopupSlot};

const MAX_DATA_BYTES: usize = 4096;
const TELEGRAM_HOST: &str = "t.me";

/// Launch parameters every app receives from the host.
struct LaunchParams {
    init_data: InitData,
    platform: String,
    version: Version,
    theme: ThemeParams,
}

impl Schema<SearchParams> for LaunchParams {
    fn from_fields(f: &Fields<'_, SearchParams>) -> Result<Self, ParseError> {
        Ok(LaunchParams {
            init_data: f.field("tgWebAppData", |v| InitData::from_raw(&search_params::string(v)?))?,
            platform: f.field("tgWebAppPlatform", search_params::string)?,
            version: f.field("tgWebAppVersion", |v| search_params::string(v).map(Version::new))?,
            theme: f.field("tgWebAppThemeParams", |v| {
                ThemeParams::from_json_str(&search_params::string(v)?)
            })?,
        })
    }
}

/// Theme keys the app may use for its header and background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettableColorKey {
    BgColor,
    SecondaryBgColor,
}

impl SettableColorKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BgColor => "bg_color",
            Self::SecondaryBgColor => "secondary_bg_color",
        }
    }

    fn resolve(self, theme: &ThemeParams) -> Option<String> {
        let color = match self {
            Self::BgColor => theme.background_color(),
            Self::SecondaryBgColor => theme.secondary_background_color(),
        };
        color.map(str::to_string)
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "bg_color" => Some(Self::BgColor),
            "secondary_bg_color" => Some(Self::SecondaryBgColor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BackgroundColor {
    Key(SettableColorKey),
    Rgb(String),
}

impl BackgroundColor {
    fn as_str(&self) -> &str {
        match self {
            Self::Key(key) => key.as_str(),
            Self::Rgb(color) => color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Dark,
    Light,
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dark => "dark",
            Self::Light => "light",
        })
    }
}

/// State the host can change behind the app's back.
#[derive(Debug)]
struct AppState {
    theme: ThemeParams,
    viewport_height: f64,
    viewport_stable_height: f64,
    is_expanded: bool,
    header_color: SettableColorKey,
    background_color: BackgroundColor,
    closing_confirmation: bool,
}

fn lock(state: &Mutex<AppState>) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Serialize)]
struct DataSend<'a> {
    data: &'a str,
}

#[derive(Serialize)]
struct OpenLink<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct HeaderColor {
    color_key: SettableColorKey,
}

#[derive(Serialize)]
struct BackgroundColorPayload<'a> {
    color: &'a str,
}

#[derive(Serialize)]
struct ClosingBehavior {
    need_confirmation: bool,
}

/// The web app as seen from the page.
///
/// Built once by [`WebApp::init`]. Launch metadata is fixed from then on;
/// theme and viewport follow the host through bus listeners.
pub struct WebApp {
    webview: Arc<WebView>,
    version: Version,
    platform: String,
    init_data: InitData,
    state: Arc<Mutex<AppState>>,
    popup: Arc<PopupSlot>,
    popup_timeout: Option<Duration>,
    main_button: MainButton,
    back_button: BackButton,
    haptic: HapticFeedback,
}

impl WebApp {
    /// Reads launch metadata from the webview's init parameters and starts
    /// tracking host state.
    ///
    /// A theme persisted earlier in the session replaces the launch theme,
    /// since the launch URL goes stale after a `theme_changed`.
    pub fn init(webview: Arc<WebView>) -> Result<Self, BridgeError> {
        let launch: LaunchParams = parsing::parse(webview.init_params())?;
        let theme = webview
            .storage()
            .theme_params()
            .and_then(|stored| match ThemeParams::from_json(stored) {
                Ok(theme) => Some(theme),
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring stored theme");
                    None
                }
            })
            .unwrap_or(launch.theme);

        let height = webview.environment().viewport_height;
        let main_button = MainButton::new(Arc::clone(&webview));
        if let Some(color) = theme.button_color() {
            main_button.seed_color(color);
        }
        if let Some(color) = theme.button_text_color() {
            main_button.seed_text_color(color);
        }

        let state = Arc::new(Mutex::new(AppState {
            theme,
            viewport_height: height,
            viewport_stable_height: height,
            is_expanded: false,
            header_color: SettableColorKey::BgColor,
            background_color: BackgroundColor::Key(SettableColorKey::BgColor),
            closing_confirmation: false,
        }));
        let popup = Arc::new(PopupSlot::default());
        track_host_state(&webview, &state, &popup);

        tracing::debug!(
            platform = %launch.platform,
            version = %launch.version,
            "web app initialized"
        );

        Ok(WebApp {
            back_button: BackButton::new(Arc::clone(&webview), launch.version.clone()),
            haptic: HapticFeedback::new(Arc::clone(&webview), launch.version.clone()),
            popup_timeout: webview.config().popup_timeout(),
            webview,
            version: launch.version,
            platform: launch.platform,
            init_data: launch.init_data,
            state,
            popup,
            main_button,
        })
    }

    pub fn webview(&self) -> &Arc<WebView> {
        &self.webview
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn init_data(&self) -> &InitData {
        &self.init_data
    }

    pub fn main_button(&self) -> &MainButton {
        &self.main_button
    }

    /// Requires host 6.1.
    pub fn back_button(&self) -> &BackButton {
        &self.back_button
    }

    /// Requires host 6.1.
    pub fn haptic(&self) -> &HapticFeedback {
        &self.haptic
    }

    pub fn is_version_at_least(&self, version: &str) -> bool {
        self.version.is_at_least(version)
    }

    /// Fails with [`Precondition::VersionTooLow`] below `version`.
    pub fn require_version(&self, version: &str) -> Result<(), BridgeError> {
        Ok(self.version.require(version)?)
    }

    pub fn theme(&self) -> ThemeParams {
        lock(&self.state).theme.clone()
    }

    /// Current height of the visible area. Changes during gestures and
    /// animations; see [`WebApp::viewport_stable_height`].
    pub fn viewport_height(&self) -> f64 {
        lock(&self.state).viewport_height
    }

    /// Height of the visible area in its last stable state.
    pub fn viewport_stable_height(&self) -> f64 {
        lock(&self.state).viewport_stable_height
    }

    pub fn is_expanded(&self) -> bool {
        lock(&self.state).is_expanded
    }

    pub fn is_closing_confirmation_enabled(&self) -> bool {
        lock(&self.state).closing_confirmation
    }

    /// Dark unless the theme has a light background.
    pub fn color_scheme(&self) -> ColorScheme {
        let state = lock(&self.state);
        match state.theme.background_color().map(is_color_dark) {
            Some(Ok(false)) => ColorScheme::Light,
            _ => ColorScheme::Dark,
        }
    }

    pub fn header_color(&self) -> Option<String> {
        let state = lock(&self.state);
        state.header_color.resolve(&state.theme)
    }

    pub fn background_color(&self) -> Option<String> {
        let state = lock(&self.state);
        match &state.background_color {
            BackgroundColor::Key(key) => key.resolve(&state.theme),
            BackgroundColor::Rgb(color) => Some(color.clone()),
        }
    }

    /// Tells the host the app is ready to be displayed.
    pub fn ready(&self) -> Result<(), BridgeError> {
        self.webview.post_event_empty("web_app_ready")
    }

    pub fn close(&self) -> Result<(), BridgeError> {
        self.webview.post_event_empty("web_app_close")
    }

    /// Expands the app to the maximum available height.
    pub fn expand(&self) -> Result<(), BridgeError> {
        self.webview.post_event_empty("web_app_expand")
    }

    /// Sends `data` (1 to 4096 bytes) to the bot. The host closes the app.
    pub fn send_data(&self, data: &str) -> Result<(), BridgeError> {
        if data.is_empty() || data.len() > MAX_DATA_BYTES {
            return Err(BridgeError::length("data", data.len(), 1, MAX_DATA_BYTES));
        }
        self.webview.post_event("web_app_data_send", &DataSend { data })
    }

    /// Opens `url` in an external browser without closing the app.
    pub fn open_link(&self, url: &str) -> Result<(), BridgeError> {
        let url = format_url(url)?;
        if self.version.is_at_least("6.1") {
            return self
                .webview
                .post_event("web_app_open_link", &OpenLink { url: url.as_str() });
        }
        let navigator = self
            .webview
            .environment()
            .navigator
            .as_ref()
            .ok_or(BridgeError::TransportUnavailable)?;
        Ok(navigator.open_window(url.as_str())?)
    }

    /// Opens a `t.me` link inside Telegram. The host closes the app.
    pub fn open_telegram_link(&self, url: &str) -> Result<(), BridgeError> {
        let parsed = format_url(url)?;
        let host = parsed.host_str().unwrap_or_default();
        if host != TELEGRAM_HOST {
            return Err(Precondition::UrlNotAllowed {
                url: url.to_string(),
                reason: format!("host {host} is not allowed, only {TELEGRAM_HOST} is"),
            }
            .into());
        }

        if self.webview.is_iframe() || self.version.is_at_least("6.1") {
            let path = match parsed.query() {
                Some(query) => format!("{}?{}", parsed.path(), query),
                None => parsed.path().to_string(),
            };
            return self
                .webview
                .post_event("web_app_open_tg_link", &OpenLink { url: &path });
        }
        let navigator = self
            .webview
            .environment()
            .navigator
            .as_ref()
            .ok_or(BridgeError::TransportUnavailable)?;
        Ok(navigator.navigate(url)?)
    }

    /// Requires host 6.1.
    pub fn set_header_color(&self, key: SettableColorKey) -> Result<(), BridgeError> {
        self.require_version("6.1")?;
        let before = {
            let mut state = lock(&self.state);
            if state.header_color == key {
                return Ok(());
            }
            std::mem::replace(&mut state.header_color, key)
        };
        let sent = self
            .webview
            .post_event("web_app_set_header_color", &HeaderColor { color_key: key });
        if sent.is_err() {
            let mut state = lock(&self.state);
            if state.header_color == key {
                state.header_color = before;
            }
        }
        sent
    }

    /// Takes `bg_color`, `secondary_bg_color` or a color in any RGB notation.
    /// Requires host 6.1.
    pub fn set_background_color(&self, color: &str) -> Result<(), BridgeError> {
        self.require_version("6.1")?;
        let color = match SettableColorKey::from_name(color) {
            Some(key) => BackgroundColor::Key(key),
            None => BackgroundColor::Rgb(to_rgb_ext(color)?),
        };
        let before = {
            let mut state = lock(&self.state);
            if state.background_color == color {
                return Ok(());
            }
            std::mem::replace(&mut state.background_color, color.clone())
        };
        let sent = self.webview.post_event(
            "web_app_set_background_color",
            &BackgroundColorPayload {
                color: color.as_str(),
            },
        );
        if sent.is_err() {
            let mut state = lock(&self.state);
            if state.background_color == color {
                state.background_color = before;
            }
        }
        sent
    }

    /// Requires host 6.2.
    pub fn enable_closing_confirmation(&self) -> Result<(), BridgeError> {
        self.set_closing_confirmation(true)
    }

    /// Requires host 6.2.
    pub fn disable_closing_confirmation(&self) -> Result<(), BridgeError> {
        self.set_closing_confirmation(false)
    }

    fn set_closing_confirmation(&self, need_confirmation: bool) -> Result<(), BridgeError> {
        self.require_version("6.2")?;
        let before = std::mem::replace(
            &mut lock(&self.state).closing_confirmation,
            need_confirmation,
        );
        let sent = self.webview.post_event(
            "web_app_setup_closing_behavior",
            &ClosingBehavior { need_confirmation },
        );
        if sent.is_err() {
            lock(&self.state).closing_confirmation = before;
        }
        sent
    }

    /// Shows a native popup. Requires host 6.2.
    ///
    /// Only one popup may be open at a time; the returned handle resolves
    /// when the host reports `popup_closed`. Until then further calls fail
    /// with [`Precondition::PopupAlreadyOpened`], even if the handle was
    /// dropped or timed out.
    pub fn show_popup(&self, params: PopupParams) -> Result<PendingPopup, BridgeError> {
        self.require_version("6.2")?;
        if self.popup.is_pending() {
            return Err(Precondition::PopupAlreadyOpened.into());
        }
        let payload = OpenPopup::validate(params)?;
        let pending = self.popup.acquire(self.popup_timeout)?;
        if let Err(err) = self.webview.post_event("web_app_open_popup", &payload) {
            self.popup.release(pending.id());
            return Err(err);
        }
        Ok(pending)
    }

    /// Message with a single close button.
    pub async fn show_alert(&self, message: &str) -> Result<(), BridgeError> {
        let params = PopupParams::new(message).with_button(PopupButton::close());
        self.show_popup(params)?.wait().await?;
        Ok(())
    }

    /// Message with OK and Cancel buttons; `true` when OK was pressed.
    pub async fn show_confirm(&self, message: &str) -> Result<bool, BridgeError> {
        let params = PopupParams::new(message)
            .with_button(PopupButton::ok().with_id("ok"))
            .with_button(PopupButton::cancel());
        let pressed = self.show_popup(params)?.wait().await?;
        Ok(pressed.as_deref() == Some("ok"))
    }
}

/// Registers the listeners that keep `state` and the popup slot current.
fn track_host_state(webview: &WebView, state: &Arc<Mutex<AppState>>, popup: &Arc<PopupSlot>) {
    let theme_state = Arc::clone(state);
    let storage = webview.storage().clone();
    webview.on(
        THEME_CHANGED,
        Arc::new(move |event: &Event| {
            if let Event::ThemeChanged(theme) = event {
                storage.set_theme_params(theme);
                lock(&theme_state).theme = theme.clone();
            }
        }),
    );

    let viewport_state = Arc::clone(state);
    webview.on(
        VIEWPORT_CHANGED,
        Arc::new(move |event: &Event| {
            if let Event::ViewportChanged(viewport) = event {
                let mut state = lock(&viewport_state);
                state.viewport_height = viewport.height;
                state.is_expanded = viewport.is_expanded;
                if viewport.is_state_stable {
                    state.viewport_stable_height = viewport.height;
                }
            }
        }),
    );

    let popup = Arc::clone(popup);
    webview.on(
        POPUP_CLOSED,
        Arc::new(move |event: &Event| {
            if let Event::PopupClosed(button_id) = event {
                popup.resolve(button_id.clone());
            }
        }),
    );
}
