use serde_json::Value;

use crate::{
    error::ParseError,
    parsing::{json, parse, Fields, JsonObject, Schema},
};

/// Typed view of the theme colors, all normalized to `#rrggbb`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeColors {
    pub background_color: Option<String>,
    pub button_color: Option<String>,
    pub button_text_color: Option<String>,
    pub hint_color: Option<String>,
    pub link_color: Option<String>,
    pub secondary_background_color: Option<String>,
    pub text_color: Option<String>,
}

impl Schema<JsonObject> for ThemeColors {
    fn from_fields(f: &Fields<'_, JsonObject>) -> Result<Self, ParseError> {
        Ok(ThemeColors {
            background_color: f.field("bg_color", json::opt_rgb)?,
            button_color: f.field("button_color", json::opt_rgb)?,
            button_text_color: f.field("button_text_color", json::opt_rgb)?,
            hint_color: f.field("hint_color", json::opt_rgb)?,
            link_color: f.field("link_color", json::opt_rgb)?,
            secondary_background_color: f.field("secondary_bg_color", json::opt_rgb)?,
            text_color: f.field("text_color", json::opt_rgb)?,
        })
    }
}

/// Theme settings currently used by the host.
///
/// Besides the typed colors the record keeps its source text and the full
/// decoded object, so keys added by newer hosts stay reachable through
/// [`ThemeParams::unchecked`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeParams {
    raw: String,
    unchecked: JsonObject,
    colors: ThemeColors,
}

impl ThemeParams {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses the JSON string form, as carried by `tgWebAppThemeParams`.
    pub fn from_json_str(raw: &str) -> Result<Self, ParseError> {
        let unchecked = json::decode_object(raw)?;
        let colors = parse(&unchecked)?;
        Ok(Self {
            raw: raw.to_string(),
            unchecked,
            colors,
        })
    }

    /// Parses an already decoded object, as carried by `theme_changed`.
    pub fn from_json(unchecked: JsonObject) -> Result<Self, ParseError> {
        let colors = parse(&unchecked)?;
        let raw = Value::Object(unchecked.clone()).to_string();
        Ok(Self {
            raw,
            unchecked,
            colors,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn unchecked(&self) -> &JsonObject {
        &self.unchecked
    }

    pub fn colors(&self) -> &ThemeColors {
        &self.colors
    }

    /// Background color in the `#rrggbb` format.
    pub fn background_color(&self) -> Option<&str> {
        self.colors.background_color.as_deref()
    }

    pub fn button_color(&self) -> Option<&str> {
        self.colors.button_color.as_deref()
    }

    pub fn button_text_color(&self) -> Option<&str> {
        self.colors.button_text_color.as_deref()
    }

    pub fn hint_color(&self) -> Option<&str> {
        self.colors.hint_color.as_deref()
    }

    pub fn link_color(&self) -> Option<&str> {
        self.colors.link_color.as_deref()
    }

    /// Available since host version 6.1.
    pub fn secondary_background_color(&self) -> Option<&str> {
        self.colors.secondary_background_color.as_deref()
    }

    pub fn text_color(&self) -> Option<&str> {
        self.colors.text_color.as_deref()
    }
}
