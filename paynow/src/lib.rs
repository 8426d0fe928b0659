#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Client SDK for the Paynow payment gateway.
//!
//! Every message exchanged with the gateway is an
//! `application/x-www-form-urlencoded` body carrying a `hash` field: an
//! upper-case hex SHA-512 over the other field values plus the merchant's
//! integration key. This crate signs outbound requests, verifies inbound
//! replies, and wraps both in a small async client.
//!
//! # Overview
//!
//! Outbound fields are signed in byte-wise name order. Inbound replies are
//! verified in the order the fields appear on the wire, after
//! percent-decoding each value. The two sides are deliberately asymmetric and
//! must not be unified.
//!
//! ```rust
//! use paynow::fields::FieldSet;
//! use paynow::signature::verify;
//!
//! let body = [("reference", "INV-1"), ("amount", "10.00"), ("status", "Message")]
//!     .into_iter()
//!     .collect::<FieldSet>()
//!     .signed("integration-key")
//!     .to_form_body();
//! assert!(verify(&body, "integration-key").is_ok());
//! ```
//!
//! # Modules
//!
//! - [`signature`] - Signing and verification
//! - [`fields`] - Field sets, wire tokenisation and percent-decoding
//! - [`payment`] - Outbound mobile payments and amount formatting
//! - [`response`] - Typed, verified gateway replies
//! - [`client`] - Async client over a pluggable [`transport`]
//! - [`config`] - Integration settings
//! - [`types`] - Payment methods and transaction statuses
//! - [`error`] - Error types
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for client calls

pub mod client;
pub mod config;
pub mod error;
pub mod fields;
pub mod payment;
pub mod response;
pub mod signature;
pub mod transport;
pub mod types;

pub use client::PaynowClient;
pub use config::{IntegrationKey, PaynowConfig};
pub use error::{PaynowError, VerifyError};
pub use payment::Payment;
pub use signature::{Signature, sign, verify};
