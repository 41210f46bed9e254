//! CLI configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use theme_core::ThemeSettings;

/// CLI configuration file (`theme.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Storefront to talk to.
    #[serde(default)]
    pub store: StoreConfig,

    /// Theme settings handed to the components.
    #[serde(default)]
    pub theme: ThemeSettings,

    /// Where recordings are written.
    #[serde(default)]
    pub recordings: RecordingsConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Check values a command would trip over.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if url_scheme(&self.store.base_url).is_none() {
            problems.push(format!(
                "store.base_url must be an http(s) URL, got '{}'",
                self.store.base_url
            ));
        }
        if self.store.timeout_secs == 0 {
            problems.push("store.timeout_secs must be at least 1".to_string());
        }
        let bp = &self.theme.breakpoints;
        if bp.tablet >= bp.desktop {
            problems.push(format!(
                "theme.breakpoints.tablet ({}) must be below desktop ({})",
                bp.tablet, bp.desktop
            ));
        }
        if !self.theme.routes.root.starts_with('/') || !self.theme.routes.cart.starts_with('/') {
            problems.push("theme.routes entries must be absolute paths".to_string());
        }
        problems
    }
}

fn url_scheme(url: &str) -> Option<&str> {
    let (scheme, rest) = url.split_once("://")?;
    (matches!(scheme, "http" | "https") && !rest.is_empty()).then_some(scheme)
}

/// Storefront connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Storefront origin.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Total request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries for timeouts, connection errors and 5xx responses.
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:9292".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    2
}

/// Recording settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingsConfig {
    /// Directory for recordings, relative to the working directory.
    #[serde(default = "default_recordings_dir")]
    pub dir: String,
}

impl Default for RecordingsConfig {
    fn default() -> Self {
        Self {
            dir: default_recordings_dir(),
        }
    }
}

fn default_recordings_dir() -> String {
    ".theme/recordings".to_string()
}

/// Default config file content.
pub fn generate_default_config() -> String {
    r#"# Storefront theme CLI configuration

[store]
base_url = "http://127.0.0.1:9292"
timeout_secs = 10
retries = 2

[theme.breakpoints]
tablet = 750
desktop = 990

[theme.capabilities]
intersection_observer = true
resize_observer = true

[theme.routes]
root = "/"
cart = "/cart"

[recordings]
dir = ".theme/recordings"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses_and_validates() {
        let config: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.store.retries, 2);
        assert_eq!(config.theme.breakpoints.desktop, 990);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_bad_values() {
        let mut config = CliConfig::default();
        config.store.base_url = "ftp://store".to_string();
        config.theme.breakpoints.tablet = 1200;
        let problems = config.validate();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("base_url"));
    }
}
