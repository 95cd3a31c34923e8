//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::Workspace;

/// Default session lifetime
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;

/// Default PBKDF2 work factor for new password hashes
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 100_000;

/// Longest session lifetime a config layer may set (one year)
pub const MAX_SESSION_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Largest sheet accepted by `hwatm upload`
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Raw config file contents; every key optional so layers can be merged
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    session_ttl_minutes: Option<i64>,
    password_iterations: Option<u32>,
    forward_fill: Option<bool>,
    default_filter: Option<String>,
    max_upload_bytes: Option<u64>,
}

/// Effective configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Minutes a login session stays valid
    pub session_ttl_minutes: i64,

    /// PBKDF2 iterations used when hashing new passwords
    pub password_iterations: u32,

    /// Fill blank cells from the row above when ingesting a sheet
    pub forward_fill: bool,

    /// Band used by `hwatm fmeca` when `--filter` is omitted
    pub default_filter: String,

    /// Upload size limit in bytes
    pub max_upload_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            password_iterations: DEFAULT_PASSWORD_ITERATIONS,
            forward_fill: true,
            default_filter: "all".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Load configuration for a specific workspace (or none)
    pub fn load_for(workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/hwatm/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(layer) = Self::read_layer(&global_path) {
                config.merge(layer);
            }
        }

        // 3. Workspace config (.hwatm/config.yaml)
        if let Some(ws) = workspace {
            if let Some(layer) = Self::read_layer(&ws.config_path()) {
                config.merge(layer);
            }
        }

        // 4. Environment variables
        config.merge(Self::env_layer());

        config
    }

    fn read_layer(path: &std::path::Path) -> Option<ConfigLayer> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        let only_comments = contents
            .lines()
            .map(str::trim)
            .all(|l| l.is_empty() || l.starts_with('#'));
        if only_comments {
            return None;
        }
        match serde_yml::from_str::<ConfigLayer>(&contents) {
            Ok(layer) => Some(layer),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring unreadable config file"
                );
                None
            }
        }
    }

    fn env_layer() -> ConfigLayer {
        ConfigLayer {
            session_ttl_minutes: std::env::var("HWATM_SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok()),
            password_iterations: std::env::var("HWATM_PASSWORD_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok()),
            forward_fill: None,
            default_filter: std::env::var("HWATM_DEFAULT_FILTER").ok(),
            max_upload_bytes: None,
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "hwatm")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge a layer into this config (layer takes precedence)
    fn merge(&mut self, other: ConfigLayer) {
        if let Some(ttl) = other.session_ttl_minutes {
            self.session_ttl_minutes = ttl.clamp(1, MAX_SESSION_TTL_MINUTES);
        }
        if let Some(iterations) = other.password_iterations {
            self.password_iterations = iterations.max(1);
        }
        if let Some(fill) = other.forward_fill {
            self.forward_fill = fill;
        }
        if let Some(filter) = other.default_filter {
            self.default_filter = filter;
        }
        if let Some(max) = other.max_upload_bytes {
            self.max_upload_bytes = max;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overrides_only_present_keys() {
        let mut config = Config::default();
        let layer: ConfigLayer =
            serde_yml::from_str("session_ttl_minutes: 5\nforward_fill: false\n").unwrap();
        config.merge(layer);

        assert_eq!(config.session_ttl_minutes, 5);
        assert!(!config.forward_fill);
        assert_eq!(config.password_iterations, DEFAULT_PASSWORD_ITERATIONS);
        assert_eq!(config.default_filter, "all");
    }

    #[test]
    fn test_zero_iterations_clamped() {
        let mut config = Config::default();
        config.merge(ConfigLayer {
            password_iterations: Some(0),
            ..Default::default()
        });
        assert_eq!(config.password_iterations, 1);
    }

    #[test]
    fn test_session_ttl_clamped() {
        let mut config = Config::default();
        config.merge(ConfigLayer {
            session_ttl_minutes: Some(i64::MAX),
            ..Default::default()
        });
        assert_eq!(config.session_ttl_minutes, MAX_SESSION_TTL_MINUTES);

        config.merge(ConfigLayer {
            session_ttl_minutes: Some(-5),
            ..Default::default()
        });
        assert_eq!(config.session_ttl_minutes, 1);
    }
}
