//! Gateway client.
//!
//! [`PaynowClient`] ties the pieces together: it validates and signs outbound
//! payments, sends them through a [`Transport`], and verifies every reply
//! before decoding it.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn run(transport: impl paynow::transport::Transport) -> Result<(), paynow::error::PaynowError> {
//! use paynow::client::PaynowClient;
//! use paynow::config::PaynowConfig;
//! use paynow::payment::Payment;
//! use rust_decimal::Decimal;
//!
//! let config = PaynowConfig::new("12345", "integration-key")
//!     .with_result_url("https://example.com/paynow/result");
//! let client = PaynowClient::new(config, transport);
//!
//! let payment = Payment::new("INV-1001", Decimal::new(1000, 2), "user@example.com", "0771234567");
//! let init = client.send_mobile(&payment).await?;
//! if let Some(poll_url) = init.poll_url.as_deref() {
//!     let status = client.poll_transaction(poll_url).await?;
//!     println!("{}: {}", status.reference, status.status);
//! }
//! # Ok(())
//! # }
//! ```

use url::Url;

use crate::config::PaynowConfig;
use crate::error::PaynowError;
use crate::payment::Payment;
use crate::response::{InitResponse, StatusResponse};
use crate::transport::Transport;

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// Client for one Paynow integration.
#[derive(Debug, Clone)]
pub struct PaynowClient<T> {
    config: PaynowConfig,
    transport: T,
}

impl<T: Transport> PaynowClient<T> {
    /// Creates a client that sends requests through `transport`.
    #[must_use]
    pub const fn new(config: PaynowConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Returns the integration settings.
    #[must_use]
    pub const fn config(&self) -> &PaynowConfig {
        &self.config
    }

    /// Returns the underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Initiates a mobile money payment.
    ///
    /// # Errors
    ///
    /// - [`PaynowError::InvalidPayment`] before anything is sent.
    /// - [`PaynowError::Transport`] if the request could not be delivered.
    /// - [`PaynowError::Gateway`] if the gateway rejected the request.
    /// - [`PaynowError::Verify`] if the reply's signature does not match.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "paynow.send_mobile",
            skip_all,
            fields(reference = %payment.reference, method = %payment.method_or_default()),
            err
        )
    )]
    pub async fn send_mobile(&self, payment: &Payment) -> Result<InitResponse, PaynowError> {
        payment.validate()?;

        let key = self.config.integration_key.expose();
        let body = payment.to_fields(&self.config).signed(key).to_form_body();

        let reply = self
            .transport
            .post_form(&self.config.initiate_url, body)
            .await
            .map_err(|source| PaynowError::Transport {
                context: "failed to send request",
                source,
            })?;

        let result = InitResponse::parse(&reply, key);
        log_rejected(&result);
        result
    }

    /// Fetches the current status of a transaction from its poll URL.
    ///
    /// # Errors
    ///
    /// - [`PaynowError::InvalidUrl`] if `poll_url` does not parse.
    /// - [`PaynowError::Transport`] if the request could not be delivered.
    /// - [`PaynowError::Verify`] if the reply's signature does not match.
    /// - [`PaynowError::InvalidAmount`] if the reply's amount is malformed.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paynow.poll_transaction", skip(self), err)
    )]
    pub async fn poll_transaction(&self, poll_url: &str) -> Result<StatusResponse, PaynowError> {
        let url = Url::parse(poll_url).map_err(|source| PaynowError::InvalidUrl {
            value: poll_url.to_owned(),
            source,
        })?;

        let reply = self
            .transport
            .get(&url)
            .await
            .map_err(|source| PaynowError::Transport {
                context: "failed to poll transaction",
                source,
            })?;

        let result = StatusResponse::parse(&reply, self.config.integration_key.expose());
        log_rejected(&result);
        result
    }

    /// Verifies and decodes a status update posted to the result URL.
    ///
    /// # Errors
    ///
    /// Same as [`StatusResponse::parse`].
    pub fn parse_status_update(
        &self,
        body: impl AsRef<[u8]>,
    ) -> Result<StatusResponse, PaynowError> {
        let result = StatusResponse::parse(body, self.config.integration_key.expose());
        log_rejected(&result);
        result
    }
}

/// Emits a warning when a reply fails signature verification.
#[cfg(feature = "telemetry")]
fn log_rejected<R>(result: &Result<R, PaynowError>) {
    if let Err(PaynowError::Verify(err)) = result {
        tracing::warn!(error = %err, "rejected gateway response");
    }
}

#[cfg(not(feature = "telemetry"))]
const fn log_rejected<R>(_result: &Result<R, PaynowError>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VerifyError;
    use crate::fields::{FieldSet, WirePairs};
    use crate::transport::{BoxFuture, TransportError};
    use crate::types::{PaymentMethod, TransactionStatus};
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const KEY: &str = "test-key";
    const POLL_URL: &str = "https://www.paynow.co.zw/interface/poll/123";

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Sent {
        method: &'static str,
        url: String,
        body: Option<String>,
    }

    /// Replies with a canned body, or a per-URL one, and records what was sent.
    #[derive(Default)]
    struct MockTransport {
        reply: Option<Vec<u8>>,
        routes: HashMap<String, Vec<u8>>,
        sent: Mutex<Vec<Sent>>,
    }

    impl MockTransport {
        fn replying(body: impl Into<Vec<u8>>) -> Self {
            Self {
                reply: Some(body.into()),
                ..Self::default()
            }
        }

        fn routing(routes: impl IntoIterator<Item = (String, String)>) -> Self {
            Self {
                routes: routes
                    .into_iter()
                    .map(|(url, body)| (url, body.into_bytes()))
                    .collect(),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self::default()
        }

        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn respond(&self, sent: Sent) -> Result<Vec<u8>, TransportError> {
            let reply = self.routes.get(&sent.url).or(self.reply.as_ref()).cloned();
            self.sent.lock().unwrap().push(sent);
            reply.ok_or_else(|| "connection refused".into())
        }
    }

    impl Transport for MockTransport {
        fn post_form<'a>(
            &'a self,
            url: &'a Url,
            body: String,
        ) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
            let result = self.respond(Sent {
                method: "POST",
                url: url.to_string(),
                body: Some(body),
            });
            Box::pin(async move { result })
        }

        fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
            let result = self.respond(Sent {
                method: "GET",
                url: url.to_string(),
                body: None,
            });
            Box::pin(async move { result })
        }
    }

    fn config() -> PaynowConfig {
        PaynowConfig::new("12345", KEY)
            .with_result_url("https://example.com/result")
            .with_return_url("https://example.com/return")
    }

    fn payment() -> Payment {
        Payment::new("INV-001", Decimal::new(1000, 2), "test@example.com", "0771234567")
    }

    fn signed_reply(pairs: &[(&str, &str)]) -> String {
        pairs
            .iter()
            .copied()
            .collect::<FieldSet>()
            .signed(KEY)
            .to_form_body()
    }

    #[tokio::test]
    async fn send_mobile_posts_signed_form() {
        let reply = signed_reply(&[("status", "Ok"), ("pollurl", POLL_URL)]);
        let client = PaynowClient::new(config(), MockTransport::replying(reply));

        let response = client.send_mobile(&payment()).await.unwrap();
        assert!(response.is_ok());
        assert_eq!(response.poll_url.as_deref(), Some(POLL_URL));

        let sent = client.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, "POST");
        assert_eq!(sent[0].url, crate::config::DEFAULT_INITIATE_URL);

        let body = sent[0].body.as_deref().unwrap();
        let pairs = WirePairs::parse(body);
        assert_eq!(pairs.get("id").unwrap().as_deref(), Some("12345"));
        assert_eq!(pairs.get("amount").unwrap().as_deref(), Some("10.00"));
        assert_eq!(pairs.get("method").unwrap().as_deref(), Some("ecocash"));
        assert_eq!(pairs.get("status").unwrap().as_deref(), Some("Message"));
        assert_eq!(pairs.raw("hash").map(<[u8]>::len), Some(128));
        crate::signature::verify(body, KEY).unwrap();
    }

    #[tokio::test]
    async fn send_mobile_keeps_explicit_method() {
        let reply = signed_reply(&[("status", "Ok")]);
        let client = PaynowClient::new(config(), MockTransport::replying(reply));

        client
            .send_mobile(&payment().with_method(PaymentMethod::Onemoney))
            .await
            .unwrap();

        let body = client.transport().sent()[0].body.clone().unwrap();
        assert!(body.contains("method=onemoney"));
    }

    #[tokio::test]
    async fn send_mobile_rejects_invalid_payment_without_sending() {
        let client = PaynowClient::new(config(), MockTransport::replying(""));
        let invalid = Payment {
            phone: String::new(),
            ..payment()
        };

        let err = client.send_mobile(&invalid).await.unwrap_err();
        assert_eq!(err.to_string(), "phone number is required for mobile payments");
        assert!(client.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn send_mobile_reports_transport_failure() {
        let client = PaynowClient::new(config(), MockTransport::failing());
        let err = client.send_mobile(&payment()).await.unwrap_err();
        assert!(matches!(err, PaynowError::Transport { context: "failed to send request", .. }));
        assert_eq!(err.to_string(), "failed to send request: connection refused");
    }

    #[tokio::test]
    async fn send_mobile_surfaces_gateway_error() {
        let client = PaynowClient::new(
            config(),
            MockTransport::replying("status=Error&error=Invalid+amount"),
        );
        let err = client.send_mobile(&payment()).await.unwrap_err();
        assert_eq!(err.to_string(), "paynow error: Invalid amount");
    }

    #[tokio::test]
    async fn send_mobile_rejects_forged_reply() {
        let client = PaynowClient::new(
            config(),
            MockTransport::replying("status=Ok&pollurl=https%3A%2F%2Fevil.example&hash=ABC"),
        );
        let err = client.send_mobile(&payment()).await.unwrap_err();
        assert!(matches!(err, PaynowError::Verify(VerifyError::Mismatch { .. })));
    }

    #[tokio::test]
    async fn poll_transaction_verifies_and_decodes() {
        let reply = signed_reply(&[
            ("reference", "INV-001"),
            ("amount", "10.00"),
            ("paynowreference", "12345678"),
            ("pollurl", POLL_URL),
            ("status", "Paid"),
        ]);
        let client = PaynowClient::new(config(), MockTransport::replying(reply));

        let status = client.poll_transaction(POLL_URL).await.unwrap();
        assert_eq!(status.status, TransactionStatus::Paid);
        assert_eq!(status.amount, Decimal::new(1000, 2));
        assert_eq!(status.paynow_reference, "12345678");

        let sent = client.transport().sent();
        assert_eq!(sent[0].method, "GET");
        assert_eq!(sent[0].url, POLL_URL);
        assert_eq!(sent[0].body, None);
    }

    #[tokio::test]
    async fn poll_transaction_rejects_bad_hash() {
        let client = PaynowClient::new(
            config(),
            MockTransport::replying("reference=INV-001&status=Paid&hash=INVALIDHASH"),
        );
        let err = client.poll_transaction(POLL_URL).await.unwrap_err();
        assert!(err.to_string().starts_with("invalid hash"));
    }

    #[tokio::test]
    async fn poll_transaction_reports_transport_failure() {
        let client = PaynowClient::new(config(), MockTransport::failing());
        let err = client.poll_transaction(POLL_URL).await.unwrap_err();
        assert!(matches!(err, PaynowError::Transport { context: "failed to poll transaction", .. }));
    }

    #[tokio::test]
    async fn poll_transaction_rejects_malformed_url() {
        let client = PaynowClient::new(config(), MockTransport::replying(""));
        let err = client.poll_transaction("not a url").await.unwrap_err();
        assert!(matches!(err, PaynowError::InvalidUrl { .. }));
        assert!(client.transport().sent().is_empty());
    }

    fn status_reply(reference: &str, status: &str) -> String {
        signed_reply(&[("amount", "1.00"), ("reference", reference), ("status", status)])
    }

    #[tokio::test]
    async fn shared_client_polls_transactions_concurrently() {
        let urls: Vec<String> = (1..=4)
            .map(|i| format!("https://www.paynow.co.zw/interface/poll/{i}"))
            .collect();
        let transport = Arc::new(MockTransport::routing(urls.iter().enumerate().map(
            |(i, url)| (url.clone(), status_reply(&format!("INV-{i}"), "Paid")),
        )));
        let client = Arc::new(PaynowClient::new(config(), Arc::clone(&transport)));

        let handles: Vec<_> = urls
            .iter()
            .cloned()
            .map(|url| {
                let client = Arc::clone(&client);
                tokio::spawn(async move { client.poll_transaction(&url).await })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let status = handle.await.unwrap().unwrap();
            assert_eq!(status.reference, format!("INV-{i}"));
            assert_eq!(status.status, TransactionStatus::Paid);
        }
        assert_eq!(transport.sent().len(), urls.len());
    }

    #[tokio::test]
    async fn borrowed_transport_serves_joined_polls() {
        let first = "https://www.paynow.co.zw/interface/poll/a".to_owned();
        let second = "https://www.paynow.co.zw/interface/poll/b".to_owned();
        let transport = MockTransport::routing([
            (first.clone(), status_reply("INV-A", "Sent")),
            (second.clone(), status_reply("INV-B", "Cancelled")),
        ]);
        let client = PaynowClient::new(config(), &transport);

        let (a, b) = tokio::join!(client.poll_transaction(&first), client.poll_transaction(&second));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!((a.reference.as_str(), a.status), ("INV-A", TransactionStatus::Sent));
        assert_eq!((b.reference.as_str(), b.status), ("INV-B", TransactionStatus::Cancelled));
        assert_eq!(transport.sent().len(), 2);
    }

    #[test]
    fn parse_status_update_uses_integration_key() {
        let client = PaynowClient::new(config(), MockTransport::failing());
        let body = signed_reply(&[("amount", "5.00"), ("reference", "INV-2"), ("status", "Cancelled")]);

        let update = client.parse_status_update(&body).unwrap();
        assert!(update.status.is_failed());

        let other = PaynowClient::new(PaynowConfig::new("12345", "other-key"), MockTransport::failing());
        assert!(other.parse_status_update(&body).is_err());
    }
}
