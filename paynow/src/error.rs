//! Error types for the Paynow SDK.

use crate::response::InitResponse;
use crate::transport::TransportError;

/// A `%` escape that is not followed by two hex digits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid URL escape {0:?}")]
pub struct InvalidEscape(pub String);

/// A field value could not be percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to decode value for key {field}: {source}")]
pub struct DecodeError {
    /// Name of the offending field.
    pub field: String,
    /// The malformed escape.
    pub source: InvalidEscape,
}

impl DecodeError {
    /// Creates a decode error for `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, source: InvalidEscape) -> Self {
        Self {
            field: field.into(),
            source,
        }
    }
}

/// Errors from verifying a response signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// A field value could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The embedded signature differs from the recomputed one.
    ///
    /// `received` is empty when the payload carried no signature.
    #[error("invalid hash: received {received}, expected {expected}")]
    Mismatch {
        /// Signature found in the payload.
        received: String,
        /// Signature recomputed from the payload.
        expected: String,
    },
}

/// A payment rejected before anything was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The merchant reference is empty.
    #[error("payment reference is required")]
    MissingReference,
    /// The amount is zero or negative.
    #[error("payment amount must be greater than zero")]
    NonPositiveAmount,
    /// The customer email is empty.
    #[error("auth email is required")]
    MissingAuthEmail,
    /// The payer's phone number is empty.
    #[error("phone number is required for mobile payments")]
    MissingPhone,
}

/// Top-level error for client operations.
#[derive(Debug, thiserror::Error)]
pub enum PaynowError {
    /// The payment failed local validation.
    #[error(transparent)]
    InvalidPayment(#[from] ValidationError),

    /// The response signature did not check out.
    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// A response field could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The transport failed to deliver the request or read the reply.
    #[error("{context}: {source}")]
    Transport {
        /// What the client was doing.
        context: &'static str,
        /// The underlying transport error.
        #[source]
        source: TransportError,
    },

    /// The gateway answered with `status=Error`.
    #[error("paynow error: {message}")]
    Gateway {
        /// The gateway's `error` field.
        message: String,
        /// The decoded response, for callers that want the raw fields.
        response: Box<InitResponse>,
    },

    /// A URL supplied to or returned by the gateway is invalid.
    #[error("invalid URL {value:?}: {source}")]
    InvalidUrl {
        /// The offending text.
        value: String,
        /// The parse error.
        #[source]
        source: url::ParseError,
    },

    /// The `amount` field of a status response is not a decimal.
    #[error("failed to parse amount {value:?}: {source}")]
    InvalidAmount {
        /// The offending text.
        value: String,
        /// The parse error.
        #[source]
        source: rust_decimal::Error,
    },
}
