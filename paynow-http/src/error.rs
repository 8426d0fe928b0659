//! Error types for the HTTP transport.

use http::StatusCode;

/// Errors that can occur while talking to the gateway over HTTP.
#[derive(Debug, thiserror::Error)]
pub enum HttpTransportError {
    /// The request could not be sent, or timed out.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context, e.g. `"POST form"`.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The gateway answered with a non-success status.
    #[error("unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        /// Human-readable context.
        context: &'static str,
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },

    /// The response body could not be read as text.
    #[error("failed to read response body: {context}: {source}")]
    ResponseBodyRead {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}
