//! HTTP client trait.
//!
//! [`HttpClient`] is the seam between request building and the transport.
//! The `courier` crate ships a hyper-based implementation; tests and custom
//! transports can implement it directly.

use std::future::Future;
use std::sync::Arc;

use crate::{Request, Response, Result};

/// Core HTTP client trait.
///
/// Implementations send the request and buffer the full response body.
/// Any response status is a successful execution; interpreting the status
/// is left to the response handlers.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be sent or the response
    /// could not be read:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        (**self).execute(request)
    }
}

impl<C: HttpClient> HttpClient for Arc<C> {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        (**self).execute(request)
    }
}
