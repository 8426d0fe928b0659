#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport for the Paynow SDK.
//!
//! Provides [`ReqwestTransport`](transport::ReqwestTransport), an
//! implementation of [`paynow::transport::Transport`] on top of `reqwest`,
//! and [`client`] to build a ready-to-use [`PaynowClient`].
//!
//! # Modules
//!
//! - [`error`] - HTTP transport error types (feature: `client`)
//! - [`transport`] - The `reqwest` transport (feature: `client`)
//!
//! # Feature Flags
//!
//! - `client` - The `reqwest` transport (default)
//! - `telemetry` - Tracing spans around each request

#[cfg(feature = "client")]
pub mod error;
#[cfg(feature = "client")]
pub mod transport;

#[cfg(feature = "client")]
pub use transport::ReqwestTransport;

#[cfg(feature = "client")]
use paynow::{PaynowClient, PaynowConfig};

/// Builds a [`PaynowClient`] that talks to the gateway with a default
/// [`ReqwestTransport`].
///
/// ```rust
/// use paynow::PaynowConfig;
///
/// let client = paynow_http::client(PaynowConfig::new("12345", "integration-key"));
/// assert_eq!(client.config().integration_id, "12345");
/// ```
#[cfg(feature = "client")]
#[must_use]
pub fn client(config: PaynowConfig) -> PaynowClient<ReqwestTransport> {
    PaynowClient::new(config, ReqwestTransport::new())
}
