//! Payment methods and transaction statuses.
//!
//! Both are closed sets on the wire, carried as plain strings in form fields.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Mobile money channel used for an express checkout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// `EcoCash`, the gateway default.
    #[default]
    Ecocash,
    /// `OneMoney`.
    Onemoney,
}

impl PaymentMethod {
    /// The wire value sent in the `method` field.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ecocash => "ecocash",
            Self::Onemoney => "onemoney",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ecocash" => Ok(Self::Ecocash),
            "onemoney" => Ok(Self::Onemoney),
            _ => Err(format!("unsupported payment method '{s}'")),
        }
    }
}

/// Status of a transaction as reported by the poll endpoint.
///
/// Unknown values are preserved in [`TransactionStatus::Other`] so a new
/// gateway status never fails a poll.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    /// The transaction has been created.
    Created,
    /// The transaction has been sent to the provider.
    Sent,
    /// Awaiting payment.
    Pending,
    /// Paid successfully.
    Paid,
    /// Cancelled by the payer or the provider.
    Cancelled,
    /// The payment failed.
    Failed,
    /// The payment was refunded.
    Refunded,
    /// Paid, awaiting delivery confirmation.
    AwaitingDelivery,
    /// Delivered.
    Delivered,
    /// Any other status string.
    Other(String),
}

impl TransactionStatus {
    /// The wire value of this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "Created",
            Self::Sent => "Sent",
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
            Self::Refunded => "Refunded",
            Self::AwaitingDelivery => "Awaiting Delivery",
            Self::Delivered => "Delivered",
            Self::Other(s) => s,
        }
    }

    /// `true` only for [`Paid`](Self::Paid).
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self, Self::Paid)
    }

    /// `true` once the payer has paid: [`Paid`](Self::Paid),
    /// [`AwaitingDelivery`](Self::AwaitingDelivery) or [`Delivered`](Self::Delivered).
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::AwaitingDelivery | Self::Delivered)
    }

    /// `true` while the payer can still complete the payment.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Created | Self::Sent | Self::Pending)
    }

    /// `true` if the payment failed or was cancelled.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Failed)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Created" => Self::Created,
            "Sent" => Self::Sent,
            "Pending" => Self::Pending,
            "Paid" => Self::Paid,
            "Cancelled" => Self::Cancelled,
            "Failed" => Self::Failed,
            "Refunded" => Self::Refunded,
            "Awaiting Delivery" => Self::AwaitingDelivery,
            "Delivered" => Self::Delivered,
            other => Self::Other(other.to_owned()),
        })
    }
}

impl From<&str> for TransactionStatus {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl Serialize for TransactionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransactionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}
