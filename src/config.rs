//! Bridge configuration.
//!
//! Defaults ship embedded in the crate (`defaults.toml`). User settings are
//! TOML documents whose keys override the defaults one by one.

use std::{fs, path::Path, time::Duration};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

const DEFAULTS_TOML: &str = include_str!("defaults.toml");

static DEFAULTS: Lazy<BridgeConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("embedded defaults.toml must be valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Origin passed along with messages posted to the parent frame.
    pub target_origin: String,
    pub debug: bool,
    /// Prefix for keys in the session store.
    pub storage_namespace: String,
    #[serde(default)]
    pub popup: PopupConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupConfig {
    /// `None` waits for the host indefinitely.
    pub timeout_ms: Option<u64>,
}

/// Partial document: every key is optional and falls back to the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverlay {
    target_origin: Option<String>,
    debug: Option<bool>,
    storage_namespace: Option<String>,
    popup: Option<PopupOverlay>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PopupOverlay {
    timeout_ms: Option<u64>,
}

impl BridgeConfig {
    /// Parses a TOML document on top of the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, BridgeError> {
        let overlay: ConfigOverlay = toml::from_str(text)?;
        let mut config = Self::default();
        if let Some(origin) = overlay.target_origin {
            config.target_origin = origin;
        }
        if let Some(debug) = overlay.debug {
            config.debug = debug;
        }
        if let Some(namespace) = overlay.storage_namespace {
            config.storage_namespace = namespace;
        }
        if let Some(timeout_ms) = overlay.popup.and_then(|p| p.timeout_ms) {
            config.popup.timeout_ms = Some(timeout_ms);
        }
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn popup_timeout(&self) -> Option<Duration> {
        self.popup.timeout_ms.map(Duration::from_millis)
    }

    pub fn with_popup_timeout(mut self, timeout: Duration) -> Self {
        self.popup.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        DEFAULTS.clone()
    }
}
