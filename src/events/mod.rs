//! Inbound host events and the bus they are published on.
//!
//! Every recognized event name has its own [`Event`] variant, so a payload is
//! checked once in [`Event::decode`] and listeners receive a known shape.
//! Names this crate does not model travel as [`Event::Unknown`] with their
//! payload untouched.

mod emitter;

pub use emitter::{EventEmitter, EventName, GlobalListener, Listener};

use serde::Deserialize;
use serde_json::Value;

use crate::{error::BridgeError, parsing::JsonObject, theme_params::ThemeParams};

/// User pressed the back button (host 6.1+).
pub const BACK_BUTTON_PRESSED: &str = "back_button_pressed";
/// User pressed the main button.
pub const MAIN_BUTTON_PRESSED: &str = "main_button_pressed";
/// Host requests a new inner HTML for the app `<style>` element.
pub const SET_CUSTOM_STYLE: &str = "set_custom_style";
/// Theme changed in the host (including switching to night mode).
pub const THEME_CHANGED: &str = "theme_changed";
pub const VIEWPORT_CHANGED: &str = "viewport_changed";
pub const POPUP_CLOSED: &str = "popup_closed";

/// Viewport update reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Viewport {
    pub height: f64,
    pub is_expanded: bool,
    pub is_state_stable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    BackButtonPressed,
    MainButtonPressed,
    SetCustomStyle(String),
    ThemeChanged(ThemeParams),
    ViewportChanged(Viewport),
    /// Identifier of the pressed button; `None` when the popup was dismissed.
    PopupClosed(Option<String>),
    /// An event this crate does not model, with its raw payload.
    Unknown { name: String, payload: Option<Value> },
}

#[derive(Deserialize)]
struct ThemeChangedPayload {
    theme_params: JsonObject,
}

#[derive(Deserialize)]
struct PopupClosedPayload {
    button_id: String,
}

impl Event {
    /// Validates a raw payload for `name` and reshapes it into an event.
    ///
    /// Unknown names never fail. A known name with a malformed payload is a
    /// [`BridgeError::ProtocolViolation`].
    pub fn decode(name: &str, payload: Option<Value>) -> Result<Event, BridgeError> {
        match name {
            VIEWPORT_CHANGED => {
                let viewport: Viewport = from_payload(name, payload)?;
                Ok(Event::ViewportChanged(viewport))
            }
            THEME_CHANGED => {
                let p: ThemeChangedPayload = from_payload(name, payload)?;
                let theme = ThemeParams::from_json(p.theme_params).map_err(|cause| {
                    BridgeError::ProtocolViolation {
                        event: name.to_string(),
                        cause: Some(cause),
                    }
                })?;
                Ok(Event::ThemeChanged(theme))
            }
            POPUP_CLOSED => match payload {
                None | Some(Value::Null) => Ok(Event::PopupClosed(None)),
                Some(value) => {
                    let p: PopupClosedPayload = from_payload(name, Some(value))?;
                    Ok(Event::PopupClosed(Some(p.button_id)))
                }
            },
            SET_CUSTOM_STYLE => match payload {
                Some(Value::String(html)) => Ok(Event::SetCustomStyle(html)),
                _ => Err(BridgeError::protocol(name)),
            },
            MAIN_BUTTON_PRESSED => Ok(Event::MainButtonPressed),
            BACK_BUTTON_PRESSED => Ok(Event::BackButtonPressed),
            _ => Ok(Event::Unknown {
                name: name.to_string(),
                payload,
            }),
        }
    }
}

fn from_payload<T: for<'de> Deserialize<'de>>(
    name: &str,
    payload: Option<Value>,
) -> Result<T, BridgeError> {
    let value = payload.ok_or_else(|| BridgeError::protocol(name))?;
    serde_json::from_value(value).map_err(|_| BridgeError::protocol(name))
}

impl EventName for Event {
    fn event_name(&self) -> &str {
        match self {
            Event::BackButtonPressed => BACK_BUTTON_PRESSED,
            Event::MainButtonPressed => MAIN_BUTTON_PRESSED,
            Event::SetCustomStyle(_) => SET_CUSTOM_STYLE,
            Event::ThemeChanged(_) => THEME_CHANGED,
            Event::ViewportChanged(_) => VIEWPORT_CHANGED,
            Event::PopupClosed(_) => POPUP_CLOSED,
            Event::Unknown { name, .. } => name,
        }
    }
}
