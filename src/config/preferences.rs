//! UI preferences (`~/.cavemon/preferences.json`).
//!
//! A flat key-value file for presentation state such as the theme or
//! whether the camera permission prompt was already shown. Record storage,
//! export and sync never read it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::export::atomic_write;

/// Theme key (`"light"` or `"dark"`).
pub const THEME: &str = "theme";

/// Whether the camera permission explanation was already shown.
pub const CAMERA_PROMPT_SEEN: &str = "cameraPermissionPromptSeen";

/// Preference values by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preferences {
    values: BTreeMap<String, Value>,
}

impl Preferences {
    /// Load preferences from `path`. A missing file is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file is not a JSON object.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let values = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid {}: {e}", path.display())))?;
        Ok(Self { values })
    }

    /// Write preferences to `path` atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.values)?;
        atomic_write(path, json.as_bytes())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Set a key. Values that parse as JSON (`true`, `3`) are stored typed,
    /// anything else as a string.
    pub fn set(&mut self, key: &str, raw: &str) {
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        self.values.insert(key.to_string(), value);
    }

    /// Remove a key, returning whether it was present.
    pub fn unset(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}
