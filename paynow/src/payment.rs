//! Outbound payment requests.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::PaynowConfig;
use crate::error::ValidationError;
use crate::fields::FieldSet;
use crate::types::PaymentMethod;

/// Literal sent in the `status` field of every initiation request.
pub const INITIATE_STATUS_MARKER: &str = "Message";

/// A mobile money payment to initiate.
///
/// # Example
///
/// ```rust
/// use paynow::payment::Payment;
/// use paynow::types::PaymentMethod;
/// use rust_decimal::Decimal;
///
/// let payment = Payment::new("INV-1001", Decimal::new(1000, 2), "user@example.com", "0771234567")
///     .with_method(PaymentMethod::Ecocash);
/// assert!(payment.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Merchant reference, e.g. an invoice number.
    pub reference: String,
    /// Amount to charge.
    pub amount: Decimal,
    /// Customer email the gateway associates with the transaction.
    pub auth_email: String,
    /// Payer's mobile number.
    pub phone: String,
    /// Mobile money channel. [`PaymentMethod::default`] when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<PaymentMethod>,
}

impl Payment {
    /// Creates a payment using the default method.
    #[must_use]
    pub fn new(
        reference: impl Into<String>,
        amount: Decimal,
        auth_email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            amount,
            auth_email: auth_email.into(),
            phone: phone.into(),
            method: None,
        }
    }

    /// Sets the payment method.
    #[must_use]
    pub const fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// The method that will be sent, falling back to the default.
    #[must_use]
    pub fn method_or_default(&self) -> PaymentMethod {
        self.method.unwrap_or_default()
    }

    /// Checks the fields the gateway requires.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`ValidationError`], checked in the order
    /// reference, amount, email, phone.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.reference.is_empty() {
            return Err(ValidationError::MissingReference);
        }
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount);
        }
        if self.auth_email.is_empty() {
            return Err(ValidationError::MissingAuthEmail);
        }
        if self.phone.is_empty() {
            return Err(ValidationError::MissingPhone);
        }
        Ok(())
    }

    /// Builds the unsigned initiation fields for this payment.
    #[must_use]
    pub fn to_fields(&self, config: &PaynowConfig) -> FieldSet {
        let amount = format_amount(self.amount);
        [
            ("id", config.integration_id.as_str()),
            ("reference", self.reference.as_str()),
            ("amount", amount.as_str()),
            ("authemail", self.auth_email.as_str()),
            ("phone", self.phone.as_str()),
            ("method", self.method_or_default().as_str()),
            ("returnurl", config.return_url.as_str()),
            ("resulturl", config.result_url.as_str()),
            ("status", INITIATE_STATUS_MARKER),
        ]
        .into_iter()
        .collect()
    }
}

/// Formats an amount the way it is signed and sent: exactly two decimals.
///
/// The signature covers the text, so `10`, `10.0` and `10.00` must all render
/// as `10.00`. Extra precision is rounded half away from zero.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}
