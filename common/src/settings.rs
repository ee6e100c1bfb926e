//! Endpoint, URL template, and timing settings shared by every strategy.
//!
//! All base URLs and well-known locations live here so that formats cannot
//! drift apart. Values deserialise from an optional TOML file; every field
//! falls back to the public release infrastructure defaults when omitted.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while loading [`Settings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Read {
        /// Path of the settings file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`Settings`].
    #[error("invalid settings file {path}: {reason}")]
    Parse {
        /// Path of the settings file.
        path: String,
        /// The parser's description of the problem.
        reason: String,
    },
}

/// Settings for one validation run.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Prefix of published release bundles; the project name follows directly.
    pub production_base_url: String,
    /// Prefix of CI staging builds; the project name follows directly.
    pub staging_base_url: String,
    /// Publisher signing key imported before rpm and yum installs.
    pub public_key_url: String,
    /// Host on which the cluster under test listens.
    pub host: String,
    /// HTTP port of the server.
    pub server_port: u16,
    /// HTTP port of the dashboards companion.
    pub dashboards_port: u16,
    /// Install root used by the deb, rpm, and yum packages.
    pub package_install_root: String,
    /// Directory holding yum repository definitions.
    pub yum_repo_dir: String,
    /// Readiness polling policy applied after services start.
    pub readiness: ReadinessSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            production_base_url: "https://artifacts.opensearch.org/releases/bundle/".to_owned(),
            staging_base_url: "https://ci.opensearch.org/ci/dbc/distribution-build-".to_owned(),
            public_key_url: "https://artifacts.opensearch.org/publickeys/opensearch.pgp"
                .to_owned(),
            host: "localhost".to_owned(),
            server_port: 9200,
            dashboards_port: 5601,
            package_install_root: "/usr/share/opensearch".to_owned(),
            yum_repo_dir: "/etc/yum.repos.d".to_owned(),
            readiness: ReadinessSettings::default(),
        }
    }
}

impl Settings {
    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Read`] when the file cannot be read and
    /// [`SettingsError::Parse`] when its contents do not deserialise.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|reason| SettingsError::Parse {
            path: display,
            reason,
        })
    }

    /// Loads settings from `path` when given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::load_from`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        path.map_or_else(|| Ok(Self::default()), Self::load_from)
    }

    fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }
}

/// Bounded polling with exponential backoff.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ReadinessSettings {
    /// Delay before the second attempt, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound for a single backoff interval, in milliseconds.
    pub max_backoff_ms: u64,
    /// Hard limit for the server to come up, in seconds.
    pub server_timeout_secs: u64,
    /// Hard limit for the dashboards companion to come up, in seconds.
    pub dashboards_timeout_secs: u64,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 1_000,
            max_backoff_ms: 15_000,
            server_timeout_secs: 240,
            dashboards_timeout_secs: 180,
        }
    }
}

impl ReadinessSettings {
    /// Returns the first backoff interval.
    #[must_use]
    pub const fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Returns the largest backoff interval.
    #[must_use]
    pub const fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    /// Returns the server start timeout.
    #[must_use]
    pub const fn server_timeout(&self) -> Duration {
        Duration::from_secs(self.server_timeout_secs)
    }

    /// Returns the dashboards start timeout.
    #[must_use]
    pub const fn dashboards_timeout(&self) -> Duration {
        Duration::from_secs(self.dashboards_timeout_secs)
    }
}
