// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de;
use tasksync_caldav::{AuthMethod, CalDavConfig};

use crate::engine::SyncOptions;
use crate::error::ConfigError;
use crate::scheduler::SchedulerOptions;

/// The name of the application.
pub const APP_NAME: &str = "tasksync";

const DATABASE_FILE: &str = "tasksync.db";

/// The `CalDAV` server implementation, used to pick the default collection root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerFlavor {
    /// Collections under `/calendars/<user>/`.
    #[default]
    Generic,
    /// Collections under `/remote.php/dav/calendars/<user>/`.
    Nextcloud,
    /// Collections under `/<user>/`.
    Radicale,
    /// Collections under `/dav.php/calendars/<user>/`.
    Baikal,
}

impl ServerFlavor {
    /// The collection root of `username` on this kind of server.
    #[must_use]
    pub fn collection_root(self, username: &str) -> String {
        let base = match self {
            Self::Generic => "/calendars/",
            Self::Nextcloud => "/remote.php/dav/calendars/",
            Self::Radicale => "/",
            Self::Baikal => "/dav.php/calendars/",
        };
        if username.is_empty() {
            base.to_string()
        } else {
            format!("{base}{username}/")
        }
    }
}

/// Configuration of the sync service.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SyncConfig {
    /// Base URL of the `CalDAV` server.
    pub server_url: String,

    /// User name for basic authentication; empty disables authentication.
    #[serde(default)]
    pub username: String,

    /// Password for basic authentication.
    #[serde(default)]
    pub password: String,

    /// Server implementation.
    #[serde(default)]
    pub server: ServerFlavor,

    /// Path under which task collections live. Derived from `server` if unset.
    #[serde(default)]
    pub collection_root: Option<String>,

    /// Time between periodic passes.
    #[serde(
        default = "default_sync_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub sync_interval: Duration,

    /// Quiet period after a local change before a pass starts.
    #[serde(default = "default_debounce", deserialize_with = "deserialize_duration")]
    pub debounce: Duration,

    /// How long a local deletion keeps suppressing the remote copy.
    #[serde(
        default = "default_tombstone_retention",
        deserialize_with = "deserialize_duration"
    )]
    pub tombstone_retention: Duration,

    /// Timeout of a single HTTP request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Path of the local database. In-memory if no state directory exists.
    #[serde(default)]
    pub database: Option<PathBuf>,
}

const fn default_sync_interval() -> Duration {
    Duration::from_secs(15 * 60)
}

const fn default_debounce() -> Duration {
    Duration::from_secs(2)
}

const fn default_tombstone_retention() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

const fn default_timeout_secs() -> u64 {
    30
}

impl SyncConfig {
    /// Creates a configuration with default settings for `server_url`.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            username: String::new(),
            password: String::new(),
            server: ServerFlavor::default(),
            collection_root: None,
            sync_interval: default_sync_interval(),
            debounce: default_debounce(),
            tombstone_retention: default_tombstone_retention(),
            timeout_secs: default_timeout_secs(),
            database: None,
        }
    }

    /// Validates the configuration and resolves its paths.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is unusable or a path cannot be expanded.
    pub fn normalize(&mut self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::Invalid("server_url must not be empty".into()));
        }
        for (name, value) in [
            ("sync_interval", self.sync_interval),
            ("debounce", self.debounce),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }

        match &self.database {
            Some(path) => self.database = Some(expand_path(path)?),
            None => match get_state_dir() {
                Ok(dir) => self.database = Some(dir.join(APP_NAME).join(DATABASE_FILE)),
                Err(e) => tracing::warn!(error = %e, "no state directory, using an in-memory database"),
            },
        }

        Ok(())
    }

    /// The collection root, explicit or derived from the server flavor.
    #[must_use]
    pub fn collection_root(&self) -> String {
        match &self.collection_root {
            Some(root) => root.clone(),
            None => self.server.collection_root(&self.username),
        }
    }

    /// Settings of the `CalDAV` client.
    #[must_use]
    pub fn caldav_config(&self) -> CalDavConfig {
        let auth = if self.username.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::Basic {
                username: self.username.clone(),
                password: self.password.clone(),
            }
        };

        CalDavConfig {
            base_url: self.server_url.clone(),
            collection_root: self.collection_root(),
            auth,
            timeout_secs: self.timeout_secs,
            ..Default::default()
        }
    }

    /// Settings of the sync engine.
    #[must_use]
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            tombstone_retention: self.tombstone_retention,
        }
    }

    /// Settings of the scheduler.
    #[must_use]
    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            interval: self.sync_interval,
            debounce: self.debounce,
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct DurationVisitor;

    impl de::Visitor<'_> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str(r#"a duration string like "HH:MM", "1d", "24h", "15m", or "2s""#)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            parse_duration(value).map_err(|e| de::Error::custom(e.to_string()))
        }
    }

    deserializer.deserialize_str(DurationVisitor)
}

/// Handle tilde (~) and environment variables in the path
///
/// # Errors
///
/// Returns an error if the path is not valid UTF-8 or the prefix directory is unknown.
pub fn expand_path(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let path = path
        .to_str()
        .ok_or_else(|| ConfigError::Path(format!("invalid path: {}", path.display())))?;

    // Handle tilde and home directory
    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_home_dir()?.join(stripped));
        }
    }

    // Handle config directories
    let config_prefixes: &[&str] = if cfg!(unix) {
        &["$XDG_CONFIG_HOME/", "${XDG_CONFIG_HOME}/"]
    } else {
        &[r"%LOCALAPPDATA%\", "%LOCALAPPDATA%/"]
    };
    for prefix in config_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_config_dir()?.join(stripped));
        }
    }

    Ok(path.into())
}

fn get_home_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or_else(|| ConfigError::Path("user home directory not found".into()))
}

/// The user configuration directory.
///
/// # Errors
///
/// Returns an error if the platform has none.
pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(not(unix))]
    let config_dir = dirs::config_dir();
    config_dir.ok_or_else(|| ConfigError::Path("user config directory not found".into()))
}

fn get_state_dir() -> Result<PathBuf, ConfigError> {
    #[cfg(unix)]
    let state_dir = xdg::BaseDirectories::new().get_state_home();
    #[cfg(not(unix))]
    let state_dir = dirs::data_dir();
    state_dir.ok_or_else(|| ConfigError::Path("user state directory not found".into()))
}

/// Parse a duration string in the format "HH:MM" / "1d" / "24h" / "15m" / "2s".
fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let number = |v: &str| -> Result<u64, ConfigError> {
        v.trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid duration: {s}")))
    };

    // Try to parse "HH:MM" format
    if let Some((h, m)) = s.split_once(':') {
        let minutes = number(h)? * 60 + number(m)?;
        Ok(Duration::from_secs(minutes * 60))
    }
    // Match suffix-based formats
    else if let Some(rest) = s.strip_suffix('d') {
        Ok(Duration::from_secs(number(rest)? * 24 * 60 * 60))
    } else if let Some(rest) = s.strip_suffix('h') {
        Ok(Duration::from_secs(number(rest)? * 60 * 60))
    } else if let Some(rest) = s.strip_suffix('m') {
        Ok(Duration::from_secs(number(rest)? * 60))
    } else if let Some(rest) = s.strip_suffix('s') {
        Ok(Duration::from_secs(number(rest)?))
    } else {
        Err(ConfigError::Invalid(format!("invalid duration format: {s}")))
    }
}
