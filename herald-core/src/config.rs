/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::path::PathBuf;
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::eligibility::EligibilityClass;
use crate::state::{Environment, DEFAULT_POLL_INTERVAL_MS};

/// Configuration for the Herald engine
///
/// This struct contains all configurable values for Herald,
/// loaded from TOML files in XDG-compliant directories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    /// Frequency capping configuration
    pub eligibility: EligibilityConfig,
    /// Catalog polling configuration
    pub polling: PollingConfig,
    /// Realtime channel configuration
    pub sse: SseConfig,
    /// Client identification sent to the backend
    pub client: ClientConfig,
    /// Tracing and logging configuration
    pub tracing: TracingConfig,
    /// Path configuration for various directories
    pub paths: PathsConfig,
    /// Behavioral configuration switches
    pub behavior: BehaviorConfig,
}

/// Frequency capping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityConfig {
    /// Minutes a stored broadcast snapshot stays valid
    pub broadcast_ttl_minutes: u64,
    /// Minutes a stored anonymous snapshot stays valid
    pub anonymous_ttl_minutes: u64,
}

/// Catalog polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Polling interval used until the server sends its own
    pub default_interval_ms: u64,
}

/// Realtime channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SseConfig {
    /// Read timeout of the event stream in seconds
    pub read_timeout_secs: u64,
    /// Heartbeat timeout assumed until the server announces one
    pub default_heartbeat_timeout_ms: u64,
    /// Grace period added to every heartbeat timeout
    pub heartbeat_buffer_ms: u64,
    /// Reconnection attempts before falling back to polling
    pub max_retry_count: u32,
    /// Delay before every reconnection attempt after the first
    pub retry_delay_ms: u64,
    /// Production endpoint
    pub prod_endpoint: String,
    /// Development endpoint
    pub dev_endpoint: String,
    /// Local endpoint
    pub local_endpoint: String,
}

/// Client identification sent to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Value of the client platform header
    pub platform: String,
    /// Value of the client version header
    pub version: String,
}

/// Tracing and logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Base name of rolling log files
    pub log_file_name: String,
}

/// Path configuration for various directories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory for log files
    pub log_directory: String,
    /// Directory for persisted preferences
    pub data_directory: String,
}

/// Behavioral configuration switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Enable tracing
    pub enable_tracing: bool,
    /// Write logs to rolling files as well as stderr
    pub enable_file_logging: bool,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            broadcast_ttl_minutes: 60,
            anonymous_ttl_minutes: 60,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            default_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            read_timeout_secs: 300,
            default_heartbeat_timeout_ms: 30_000,
            heartbeat_buffer_ms: 5_000,
            max_retry_count: 3,
            retry_delay_ms: 5_000,
            prod_endpoint: "https://realtime.cloud.gist.build/api/v3/sse".to_string(),
            dev_endpoint: "https://realtime.cloud.dev.gist.build/api/v3/sse".to_string(),
            local_endpoint: "http://localhost:8000/api/v3/sse".to_string(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            platform: "rust".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file_name: "herald.log".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_directory: "~/.local/share/herald/logs".to_string(),
            data_directory: "~/.local/share/herald".to_string(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            enable_tracing: true,
            enable_file_logging: false,
        }
    }
}

impl EligibilityConfig {
    /// How long a stored snapshot of `class` stays valid.
    #[must_use]
    pub const fn snapshot_ttl(&self, class: EligibilityClass) -> Duration {
        let minutes = match class {
            EligibilityClass::Broadcast => self.broadcast_ttl_minutes,
            EligibilityClass::Anonymous => self.anonymous_ttl_minutes,
        };
        Duration::from_secs(minutes.saturating_mul(60))
    }
}

impl SseConfig {
    /// Read timeout as a Duration
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Delay between reconnection attempts as a Duration
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Endpoint for `environment`
    #[must_use]
    pub fn endpoint(&self, environment: Environment) -> &str {
        match environment {
            Environment::Prod => &self.prod_endpoint,
            Environment::Dev => &self.dev_endpoint,
            Environment::Local => &self.local_endpoint,
        }
    }
}

impl PathsConfig {
    /// Log directory with a leading `~` expanded
    #[must_use]
    pub fn log_directory(&self) -> PathBuf {
        expand_home(&self.log_directory)
    }

    /// Data directory with a leading `~` expanded
    #[must_use]
    pub fn data_directory(&self) -> PathBuf {
        expand_home(&self.data_directory)
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

impl HeraldConfig {
    /// Load configuration from XDG-compliant locations
    ///
    /// Reads `$XDG_CONFIG_HOME/herald/config.toml` (usually
    /// `~/.config/herald/config.toml`).
    ///
    /// If no configuration file is found, returns the default configuration.
    /// If a configuration file exists but is malformed, logs an error and uses defaults.
    pub fn load() -> Self {
        use tracing::{error, info};

        let xdg_dirs = match xdg::BaseDirectories::with_prefix("herald") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let Some(path) = xdg_dirs.find_config_file("config.toml") else {
            info!("No configuration file found, using defaults");
            return Self::default();
        };

        info!("Loading configuration from: {}", path.display());
        match std::fs::read_to_string(&path) {
            Ok(config_str) => Self::from_toml(&config_str).unwrap_or_else(|e| {
                error!("Failed to parse configuration file {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                error!("Failed to read configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parses a TOML document; missing sections and keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns the parser error for malformed documents.
    pub fn from_toml(document: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(document)
    }
}

lazy_static! {
    /// Global configuration instance loaded from XDG-compliant locations
    pub static ref CONFIG: HeraldConfig = HeraldConfig::load();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_keep_defaults() {
        let config = HeraldConfig::from_toml(
            r#"
            [eligibility]
            anonymous_ttl_minutes = 5

            [sse]
            max_retry_count = 7
            "#,
        )
        .unwrap();

        assert_eq!(
            config.eligibility.snapshot_ttl(EligibilityClass::Anonymous),
            Duration::from_secs(300)
        );
        assert_eq!(
            config.eligibility.snapshot_ttl(EligibilityClass::Broadcast),
            Duration::from_secs(3600)
        );
        assert_eq!(config.sse.max_retry_count, 7);
        assert_eq!(config.sse.heartbeat_buffer_ms, 5_000);
        assert_eq!(config.polling.default_interval_ms, 600_000);
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(HeraldConfig::from_toml("[sse]\nmax_retry_count = \"many\"").is_err());
    }

    #[test]
    fn endpoints_follow_the_environment() {
        let sse = SseConfig::default();
        assert!(sse.endpoint(Environment::Dev).contains(".dev."));
        assert!(sse.endpoint(Environment::Local).starts_with("http://localhost"));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let paths = PathsConfig {
            log_directory: "/var/log/herald".to_string(),
            data_directory: "relative/data".to_string(),
        };
        assert_eq!(paths.log_directory(), PathBuf::from("/var/log/herald"));
        assert_eq!(paths.data_directory(), PathBuf::from("relative/data"));
    }
}
