//! Settings file (`~/.cavemon/config.json`).
//!
//! Every field is optional in the file; missing fields take their defaults.
//! A missing file is the same as an empty one.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::export::atomic_write;
use crate::sync::{Reachability, SimulatedRemote};

const fn default_latency_ms() -> u64 {
    250
}

const fn default_probe_timeout_ms() -> u64 {
    3_000
}

/// User settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Per-record latency of the simulated remote.
    pub sync_latency_ms: u64,
    /// URL probed before a sync run. Without one the device is assumed online.
    pub probe_url: Option<String>,
    pub probe_timeout_ms: u64,
    /// Where exports are written when `--out` is not given.
    pub export_dir: Option<PathBuf>,
    /// Actor recorded in the audit trail.
    pub actor: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sync_latency_ms: default_latency_ms(),
            probe_url: None,
            probe_timeout_ms: default_probe_timeout_ms(),
            export_dir: None,
            actor: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
            serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("invalid {}: {e}", path.display())))?
        } else {
            debug!(path = %path.display(), "No settings file, using defaults");
            Self::default()
        };

        settings.apply_env();
        Ok(settings)
    }

    /// Load from the default location, or defaults if there is no home dir.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the settings file is unreadable.
    pub fn load_default() -> Result<Self> {
        match super::settings_path() {
            Some(path) => Self::load(&path),
            None => {
                let mut settings = Self::default();
                settings.apply_env();
                Ok(settings)
            }
        }
    }

    /// Write the settings to `path` atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, json.as_bytes())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("CAVEMON_PROBE_URL") {
            self.probe_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Ok(dir) = std::env::var("CAVEMON_EXPORT_DIR") {
            if !dir.trim().is_empty() {
                self.export_dir = Some(PathBuf::from(dir));
            }
        }
    }

    /// The simulated remote with the configured latency.
    #[must_use]
    pub fn remote(&self) -> SimulatedRemote {
        SimulatedRemote::new(Duration::from_millis(self.sync_latency_ms))
    }

    /// How to check the network before a sync run.
    ///
    /// `offline` forces the answer to unreachable.
    #[must_use]
    pub fn reachability(&self, offline: bool) -> Reachability {
        if offline {
            return Reachability::Forced(false);
        }
        match &self.probe_url {
            Some(url) => Reachability::Probe {
                url: url.clone(),
                timeout: Duration::from_millis(self.probe_timeout_ms),
            },
            None => Reachability::Forced(true),
        }
    }

    /// Directory for exports: `explicit`, else the setting, else the current directory.
    #[must_use]
    pub fn export_dir(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.export_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
