//! Pluggable HTTP transport.
//!
//! The client never talks to the network itself. It hands a fully signed,
//! already encoded form body to a [`Transport`] and gets back the raw response
//! bytes, which it then verifies. `paynow-http` ships a `reqwest` implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use url::Url;

/// Boxed future returned by [`Transport`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error type a transport reports. Wrapped into
/// [`PaynowError::Transport`](crate::error::PaynowError::Transport) by the client.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Sends requests to the gateway.
///
/// Implementations must send `body` byte-for-byte as given, with
/// `Content-Type: application/x-www-form-urlencoded`, and return the response
/// body exactly as received, without charset decoding. Non-success HTTP
/// statuses should be reported as errors.
pub trait Transport: Send + Sync {
    /// POSTs a form-encoded body and returns the response body.
    fn post_form<'a>(
        &'a self,
        url: &'a Url,
        body: String,
    ) -> BoxFuture<'a, Result<Vec<u8>, TransportError>>;

    /// GETs a URL and returns the response body.
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, TransportError>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn post_form<'a>(
        &'a self,
        url: &'a Url,
        body: String,
    ) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        (**self).post_form(url, body)
    }

    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        (**self).get(url)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post_form<'a>(
        &'a self,
        url: &'a Url,
        body: String,
    ) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        (**self).post_form(url, body)
    }

    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        (**self).get(url)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn post_form<'a>(
        &'a self,
        url: &'a Url,
        body: String,
    ) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        (**self).post_form(url, body)
    }

    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        (**self).get(url)
    }
}
