//! A [`Transport`] backed by `reqwest`.
//!
//! ## Features
//!
//! - Shares one `reqwest::Client` (and its connection pool) across requests
//! - Returns response bodies as raw bytes, ignoring any `charset` parameter
//! - Optional per-request timeout and extra headers
//! - Integrates with `tracing` if the `telemetry` feature is enabled

use std::fmt::Display;
use std::time::Duration;

use http::HeaderMap;
use http::header::{CONTENT_TYPE, HeaderValue};
use paynow::transport::{BoxFuture, Transport, TransportError};
use reqwest::{Client, RequestBuilder};
use url::Url;

use crate::error::HttpTransportError;

#[cfg(feature = "telemetry")]
use tracing::{Instrument, Span};

/// MIME type of every request body sent to the gateway.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Sends gateway requests with `reqwest`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    /// Shared reqwest HTTP client
    client: Client,
    /// Extra headers sent with each request
    headers: HeaderMap,
    /// Optional request timeout
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport with a fresh `reqwest::Client`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport around an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            ..Self::default()
        }
    }

    /// Attaches custom headers to all future requests.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a timeout for all future requests.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns any custom headers configured on the transport.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// POSTs a form body and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpTransportError`] if the request fails or the status is
    /// not a success.
    pub async fn post_form(&self, url: &Url, body: String) -> Result<Vec<u8>, HttpTransportError> {
        let req = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
            .body(body);
        self.send(req, "POST form").await
    }

    /// GETs a URL and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpTransportError`] if the request fails or the status is
    /// not a success.
    pub async fn get(&self, url: &Url) -> Result<Vec<u8>, HttpTransportError> {
        self.send(self.client.get(url.clone()), "GET poll").await
    }

    /// Applies headers and timeout, sends, and reads the raw body.
    ///
    /// The body is not decoded as text: the gateway's signature covers the
    /// bytes it sent, whatever `Content-Type` claims.
    ///
    /// `context` is a human-readable identifier used in tracing and error messages.
    async fn send(
        &self,
        mut req: RequestBuilder,
        context: &'static str,
    ) -> Result<Vec<u8>, HttpTransportError> {
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|source| HttpTransportError::Http { context, source })?;

        let status = http_response.status();
        let body = http_response
            .bytes()
            .await
            .map_err(|source| HttpTransportError::ResponseBodyRead { context, source })?;

        let result = if status.is_success() {
            Ok(body.to_vec())
        } else {
            Err(HttpTransportError::HttpStatus {
                context,
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            })
        };

        record_result_on_span(&result);

        result
    }
}

impl Transport for ReqwestTransport {
    fn post_form<'a>(
        &'a self,
        url: &'a Url,
        body: String,
    ) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        let fut = async move {
            Self::post_form(self, url, body)
                .await
                .map_err(TransportError::from)
        };
        #[cfg(feature = "telemetry")]
        let fut = fut.instrument(tracing::info_span!(
            "paynow.http.post_form",
            url = %url,
            otel.status_code = tracing::field::Empty,
            error.message = tracing::field::Empty,
        ));
        Box::pin(fut)
    }

    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        let fut = async move { Self::get(self, url).await.map_err(TransportError::from) };
        #[cfg(feature = "telemetry")]
        let fut = fut.instrument(tracing::info_span!(
            "paynow.http.get",
            url = %url,
            otel.status_code = tracing::field::Empty,
            error.message = tracing::field::Empty,
        ));
        Box::pin(fut)
    }
}

/// Records the outcome of a request on the current span.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::ERROR, error = %err, "Request to gateway failed");
        }
    }
}

/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
const fn record_result_on_span<R, E: Display>(_result: &Result<R, E>) {}
