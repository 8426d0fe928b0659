//! CLI configuration.
//!
//! Loads integration settings from a TOML file with support for environment
//! variable expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! integration_id = "12345"
//! integration_key = "${PAYNOW_KEY}"
//! result_url = "https://example.com/paynow/result"
//! return_url = "https://example.com/paynow/return"
//! timeout_secs = 30
//! ```
//!
//! # Environment Variables
//!
//! - `PAYNOW_CONFIG` - Path to configuration file (default: `paynow.toml`)
//! - `PAYNOW_INTEGRATION_ID`, `PAYNOW_INTEGRATION_KEY`, `PAYNOW_RESULT_URL`,
//!   `PAYNOW_RETURN_URL` - Override the file values

use std::path::{Path, PathBuf};
use std::time::Duration;

use paynow::PaynowConfig;
use serde::Deserialize;
use url::Url;

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "paynow.toml";

/// Errors from loading the CLI configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has the wrong shape.
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required setting is absent from both the file and the environment.
    #[error("missing {0}: set it in the config file or the environment")]
    Missing(&'static str),
}

/// Settings as read from the file, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Integration ID.
    #[serde(default)]
    pub integration_id: Option<String>,

    /// Integration key. Prefer `$VAR` over a literal.
    #[serde(default)]
    pub integration_key: Option<String>,

    /// Result (callback) URL.
    #[serde(default)]
    pub result_url: String,

    /// Return (redirect) URL.
    #[serde(default)]
    pub return_url: String,

    /// Alternative initiation endpoint.
    #[serde(default)]
    pub initiate_url: Option<Url>,

    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl CliConfig {
    /// Loads configuration from a file path, then applies environment
    /// overrides from the process environment.
    ///
    /// A missing file is treated as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };

        let env = |name: &str| std::env::var(name).ok();
        let mut config = Self::parse(&content, env)?;
        config.apply_overrides(env);
        Ok(config)
    }

    /// Parses TOML text after expanding `$VAR` references through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the expanded text does not parse.
    pub fn parse(
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content, lookup);
        Ok(toml::from_str(&expanded)?)
    }

    /// Applies `PAYNOW_*` overrides. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name| lookup(name).filter(|v: &String| !v.is_empty());
        if let Some(id) = get("PAYNOW_INTEGRATION_ID") {
            self.integration_id = Some(id);
        }
        if let Some(key) = get("PAYNOW_INTEGRATION_KEY") {
            self.integration_key = Some(key);
        }
        if let Some(url) = get("PAYNOW_RESULT_URL") {
            self.result_url = url;
        }
        if let Some(url) = get("PAYNOW_RETURN_URL") {
            self.return_url = url;
        }
    }

    /// Request timeout, if configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Builds the SDK configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if the integration ID or key is unset,
    /// or if the key is still an unresolved `$VAR` reference.
    pub fn to_paynow(&self) -> Result<PaynowConfig, ConfigError> {
        let id = non_empty(self.integration_id.as_deref()).ok_or(ConfigError::Missing("integration_id"))?;
        let key = non_empty(self.integration_key.as_deref())
            .filter(|k| !k.starts_with('$'))
            .ok_or(ConfigError::Missing("integration_key"))?;

        let mut config = PaynowConfig::new(id, key)
            .with_result_url(self.result_url.clone())
            .with_return_url(self.return_url.clone());
        if let Some(url) = &self.initiate_url {
            config = config.with_initiate_url(url.clone());
        }
        Ok(config)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Expands `$VAR` and `${VAR}` patterns in a string through `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        match (name.is_empty(), lookup(&name)) {
            (false, Some(value)) => result.push_str(&value),
            _ => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}
