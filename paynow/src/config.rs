//! Merchant integration settings.
//!
//! # Example
//!
//! ```rust
//! use paynow::config::PaynowConfig;
//!
//! let config = PaynowConfig::new("12345", "integration-key")
//!     .with_result_url("https://example.com/paynow/result")
//!     .with_return_url("https://example.com/paynow/return");
//! assert_eq!(config.integration_id, "12345");
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer};
use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Gateway endpoint for initiating a remote (express) transaction.
pub const DEFAULT_INITIATE_URL: &str = "https://www.paynow.co.zw/interface/remotetransaction";

/// The shared secret issued with an integration.
///
/// Never sent over the wire, only mixed into signatures. `Debug` and
/// `Display` are redacted and the buffer is wiped on drop.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct IntegrationKey(String);

impl IntegrationKey {
    /// Wraps a key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key for hashing.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `true` if no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for IntegrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IntegrationKey([REDACTED])")
    }
}

impl fmt::Display for IntegrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for IntegrationKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for IntegrationKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

impl<'de> Deserialize<'de> for IntegrationKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}

/// Settings for one Paynow integration.
#[derive(Debug, Clone, Deserialize)]
pub struct PaynowConfig {
    /// Integration ID, sent as the `id` field.
    pub integration_id: String,

    /// Integration key used to sign requests and verify responses.
    pub integration_key: IntegrationKey,

    /// URL the gateway posts transaction updates to.
    #[serde(default)]
    pub result_url: String,

    /// URL the payer is sent back to after a web checkout.
    #[serde(default)]
    pub return_url: String,

    /// Initiation endpoint. Defaults to [`DEFAULT_INITIATE_URL`].
    #[serde(default = "default_initiate_url")]
    pub initiate_url: Url,
}

fn default_initiate_url() -> Url {
    Url::parse(DEFAULT_INITIATE_URL).expect("default initiate URL is valid")
}

impl PaynowConfig {
    /// Creates a config for the given integration, with empty callback URLs.
    #[must_use]
    pub fn new(integration_id: impl Into<String>, integration_key: impl Into<IntegrationKey>) -> Self {
        Self {
            integration_id: integration_id.into(),
            integration_key: integration_key.into(),
            result_url: String::new(),
            return_url: String::new(),
            initiate_url: default_initiate_url(),
        }
    }

    /// Sets the result (server-to-server callback) URL.
    #[must_use]
    pub fn with_result_url(mut self, url: impl Into<String>) -> Self {
        self.result_url = url.into();
        self
    }

    /// Sets the return (browser redirect) URL.
    #[must_use]
    pub fn with_return_url(mut self, url: impl Into<String>) -> Self {
        self.return_url = url.into();
        self
    }

    /// Points initiation at a different endpoint, e.g. a mock server.
    #[must_use]
    pub fn with_initiate_url(mut self, url: Url) -> Self {
        self.initiate_url = url;
        self
    }
}
