//! Session storage used to carry launch state across same-session reloads.
//!
//! The host page's storage is reached through the [`SessionStorage`] trait;
//! [`MemoryStorage`] backs tests and environments without one. Values are
//! JSON-encoded under `<namespace><key>`.

use std::{
    collections::HashMap,
    io,
    sync::{Arc, PoisonError, RwLock},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::{location::SearchParams, parsing::JsonObject, theme_params::ThemeParams};

/// String key/value store provided by the page.
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&self, key: &str, value: &str) -> io::Result<()>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

const INIT_PARAMS_KEY: &str = "initParams";
const THEME_PARAMS_KEY: &str = "themeParams";

/// Typed, namespaced access to the two keys the bridge persists.
///
/// Storage failures are never fatal: reads degrade to `None` and writes
/// report `false`.
#[derive(Clone)]
pub struct BridgeStorage {
    backend: Arc<dyn SessionStorage>,
    namespace: String,
}

impl BridgeStorage {
    pub fn new(backend: Arc<dyn SessionStorage>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.backend.get_item(&self.key(key))?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key, error = %e, "ignoring unreadable session storage entry");
                None
            }
        }
    }

    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let stored = serde_json::to_string(value)
            .map_err(io::Error::from)
            .and_then(|json| self.backend.set_item(&self.key(key), &json));
        match stored {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(key, error = %e, "failed to write session storage entry");
                false
            }
        }
    }

    /// Launch parameters seen earlier in this session, in the order they were stored.
    pub fn init_params(&self) -> Option<Vec<(String, String)>> {
        self.get(INIT_PARAMS_KEY)
    }

    pub fn set_init_params(&self, params: &SearchParams) -> bool {
        self.set(INIT_PARAMS_KEY, &params.to_pairs())
    }

    /// Last theme reported by the host, as its raw JSON object.
    pub fn theme_params(&self) -> Option<JsonObject> {
        self.get(THEME_PARAMS_KEY)
    }

    pub fn set_theme_params(&self, theme: &ThemeParams) -> bool {
        self.set(THEME_PARAMS_KEY, theme.unchecked())
    }
}
