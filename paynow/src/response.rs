//! Typed gateway responses.
//!
//! Both parsers take the raw body bytes. The signature is checked against the
//! wire-order payload before any field is trusted.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PaynowError;
use crate::fields::WirePairs;
use crate::signature::verify_pairs;
use crate::types::TransactionStatus;

/// `status` value the gateway uses to report a rejected request.
pub const STATUS_ERROR: &str = "Error";

/// `status` value of a successful initiation.
pub const STATUS_OK: &str = "Ok";

/// Reply to a payment initiation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitResponse {
    /// `Ok` or `Error`.
    pub status: String,
    /// Checkout page for web payments.
    pub browser_url: Option<String>,
    /// URL to poll for the transaction status.
    pub poll_url: Option<String>,
    /// Signature carried by the response.
    pub hash: Option<String>,
    /// Gateway error message, set when `status` is `Error`.
    pub error: Option<String>,
    /// Payer instructions for some mobile channels.
    pub instructions: Option<String>,
}

impl InitResponse {
    /// Parses an initiation reply.
    ///
    /// Error replies (`status=Error`, exactly) are not signed by the gateway,
    /// so their signature is not checked; they are returned as
    /// [`PaynowError::Gateway`] with the decoded response attached. Every other
    /// reply must verify under `integration_key`.
    ///
    /// # Errors
    ///
    /// - [`PaynowError::Verify`] if the signature is missing or wrong.
    /// - [`PaynowError::Decode`] if a field has a malformed escape.
    /// - [`PaynowError::Gateway`] if the gateway rejected the request.
    pub fn parse(body: impl AsRef<[u8]>, integration_key: &str) -> Result<Self, PaynowError> {
        let pairs = WirePairs::parse(body.as_ref());
        let status = pairs.get("status")?.unwrap_or_default();
        let is_error = status == STATUS_ERROR;

        if !is_error {
            verify_pairs(&pairs, integration_key)?;
        }

        let response = Self {
            status,
            browser_url: pairs.get("browserurl")?,
            poll_url: pairs.get("pollurl")?,
            hash: received_signature(&pairs),
            error: pairs.get("error")?,
            instructions: pairs.get("instructions")?,
        };

        if is_error {
            return Err(PaynowError::Gateway {
                message: response.error.clone().unwrap_or_default(),
                response: Box::new(response),
            });
        }
        Ok(response)
    }

    /// `true` if the gateway accepted the request.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_OK)
    }
}

/// Reply from a poll URL, or a result-URL callback body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Merchant reference of the transaction.
    pub reference: String,
    /// Amount of the transaction.
    pub amount: Decimal,
    /// Gateway's own reference.
    pub paynow_reference: String,
    /// Poll URL for subsequent checks.
    pub poll_url: String,
    /// Current status.
    pub status: TransactionStatus,
    /// Signature carried by the response.
    pub hash: String,
}

impl StatusResponse {
    /// Parses and verifies a status payload.
    ///
    /// # Errors
    ///
    /// - [`PaynowError::Verify`] if the signature is missing or wrong.
    /// - [`PaynowError::Decode`] if a field has a malformed escape.
    /// - [`PaynowError::InvalidAmount`] if `amount` is not a decimal.
    pub fn parse(body: impl AsRef<[u8]>, integration_key: &str) -> Result<Self, PaynowError> {
        let pairs = WirePairs::parse(body.as_ref());
        verify_pairs(&pairs, integration_key)?;

        let amount_text = pairs.get("amount")?.unwrap_or_default();
        let amount = Decimal::from_str(amount_text.trim()).map_err(|source| {
            PaynowError::InvalidAmount {
                value: amount_text.clone(),
                source,
            }
        })?;

        Ok(Self {
            reference: pairs.get("reference")?.unwrap_or_default(),
            amount,
            paynow_reference: pairs.get("paynowreference")?.unwrap_or_default(),
            poll_url: pairs.get("pollurl")?.unwrap_or_default(),
            status: TransactionStatus::from(pairs.get("status")?.unwrap_or_default().as_str()),
            hash: received_signature(&pairs).unwrap_or_default(),
        })
    }
}

fn received_signature(pairs: &WirePairs<'_>) -> Option<String> {
    pairs
        .signature()
        .map(|hash| String::from_utf8_lossy(hash).into_owned())
}
