//! Response handlers.
//!
//! A [`Handler`] turns a [`Response`] into a typed value. Returning
//! [`Error::UnhandledResponse`] means "not for me", which lets a
//! [`HandlerChain`] fall through to the next handler.
//!
//! # Example
//!
//! ```
//! use courier_core::{HandlerChain, content_type_handler, json_handler, status_handler, discard_body_handler};
//!
//! #[derive(Debug, Default, serde::Deserialize)]
//! struct User {
//!     name: String,
//! }
//!
//! let chain = HandlerChain::<User>::new()
//!     .with(content_type_handler("application/json", json_handler()))
//!     .with(status_handler(204, discard_body_handler()));
//! assert_eq!(chain.len(), 2);
//! ```

use std::sync::Arc;

use crate::{Error, PROBLEM_JSON_CONTENT_TYPE, ProblemDetails, Response, Result};

/// Interprets a response as a value of type `T`.
pub trait Handler<T>: Send + Sync {
    /// Handle the response.
    ///
    /// Returns [`Error::UnhandledResponse`] if this handler does not apply.
    fn handle(&self, response: &Response) -> Result<T>;
}

impl<T, H> Handler<T> for Box<H>
where
    H: Handler<T> + ?Sized,
{
    fn handle(&self, response: &Response) -> Result<T> {
        (**self).handle(response)
    }
}

impl<T, H> Handler<T> for Arc<H>
where
    H: Handler<T> + ?Sized,
{
    fn handle(&self, response: &Response) -> Result<T> {
        (**self).handle(response)
    }
}

// ============================================================================
// Closures
// ============================================================================

/// Handler backed by a closure. Created by [`handler_fn`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

/// Use a closure as a [`Handler`].
pub fn handler_fn<T, F>(f: F) -> HandlerFn<F>
where
    F: Fn(&Response) -> Result<T> + Send + Sync,
{
    HandlerFn { f }
}

impl<T, F> Handler<T> for HandlerFn<F>
where
    F: Fn(&Response) -> Result<T> + Send + Sync,
{
    fn handle(&self, response: &Response) -> Result<T> {
        (self.f)(response)
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Ordered list of handlers tried one after the other.
///
/// Each handler is called in order until one returns `Ok` or an error other
/// than [`Error::UnhandledResponse`]; that result is returned. An empty chain,
/// or one where no handler applies, yields [`Error::UnhandledResponse`].
pub struct HandlerChain<T> {
    handlers: Vec<Box<dyn Handler<T>>>,
}

impl<T> std::fmt::Debug for HandlerChain<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerChain")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl<T> Default for HandlerChain<T> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<T: 'static> HandlerChain<T> {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler.
    pub fn push(&mut self, handler: impl Handler<T> + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Appends a handler, builder style.
    #[must_use]
    pub fn with(mut self, handler: impl Handler<T> + 'static) -> Self {
        self.push(handler);
        self
    }

    /// Number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if the chain has no handler.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<T: 'static> FromIterator<Box<dyn Handler<T>>> for HandlerChain<T> {
    fn from_iter<I: IntoIterator<Item = Box<dyn Handler<T>>>>(iter: I) -> Self {
        Self {
            handlers: iter.into_iter().collect(),
        }
    }
}

impl<T: 'static> Handler<T> for HandlerChain<T> {
    fn handle(&self, response: &Response) -> Result<T> {
        for (index, handler) in self.handlers.iter().enumerate() {
            match handler.handle(response) {
                Err(Error::UnhandledResponse) => {
                    tracing::trace!(index, status = response.status(), "handler skipped response");
                }
                result => return result,
            }
        }

        Err(Error::UnhandledResponse)
    }
}

// ============================================================================
// Combinators
// ============================================================================

/// Handler that always fails with the same error. Created by [`error_handler`].
#[derive(Debug, Clone)]
pub struct ErrorHandler {
    err: Arc<dyn std::error::Error + Send + Sync>,
}

/// Handler that fails every response with `err`, wrapped in [`Error::Custom`].
pub fn error_handler(err: impl std::error::Error + Send + Sync + 'static) -> ErrorHandler {
    ErrorHandler { err: Arc::new(err) }
}

impl<T> Handler<T> for ErrorHandler {
    fn handle(&self, _response: &Response) -> Result<T> {
        Err(Error::Custom(Arc::clone(&self.err)))
    }
}

/// Handler guarded by a predicate. Created by [`conditional_handler`].
#[derive(Debug, Clone)]
pub struct ConditionalHandler<C, H> {
    condition: C,
    handler: H,
}

/// Calls `handler` only for responses where `condition` holds.
pub fn conditional_handler<C, H>(condition: C, handler: H) -> ConditionalHandler<C, H>
where
    C: Fn(&Response) -> bool + Send + Sync,
{
    ConditionalHandler { condition, handler }
}

impl<T, C, H> Handler<T> for ConditionalHandler<C, H>
where
    C: Fn(&Response) -> bool + Send + Sync,
    H: Handler<T>,
{
    fn handle(&self, response: &Response) -> Result<T> {
        if !(self.condition)(response) {
            return Err(Error::UnhandledResponse);
        }
        self.handler.handle(response)
    }
}

/// Handler selected by content type. Created by [`content_type_handler`].
#[derive(Debug, Clone)]
pub struct ContentTypeHandler<H> {
    content_type: String,
    handler: H,
}

/// Calls `handler` when the response content type matches `content_type`.
///
/// The response content type is compared both as is and with any parameters
/// removed, so `application/json; charset=utf-8` matches `application/json`.
/// A missing header is treated as an empty content type.
pub fn content_type_handler<H>(content_type: impl Into<String>, handler: H) -> ContentTypeHandler<H> {
    ContentTypeHandler {
        content_type: content_type.into(),
        handler,
    }
}

fn content_type_matches(response: &Response, content_type: &str) -> bool {
    let value = response.content_type().unwrap_or_default();
    value == content_type || crate::media_type(value) == content_type
}

impl<T, H> Handler<T> for ContentTypeHandler<H>
where
    H: Handler<T>,
{
    fn handle(&self, response: &Response) -> Result<T> {
        if !content_type_matches(response, &self.content_type) {
            return Err(Error::UnhandledResponse);
        }
        self.handler.handle(response)
    }
}

/// Handler selected by status code. Created by [`status_handler`].
#[derive(Debug, Clone, Copy)]
pub struct StatusHandler<H> {
    status: u16,
    handler: H,
}

/// Calls `handler` when the response status is exactly `status`.
pub fn status_handler<H>(status: u16, handler: H) -> StatusHandler<H> {
    StatusHandler { status, handler }
}

impl<T, H> Handler<T> for StatusHandler<H>
where
    H: Handler<T>,
{
    fn handle(&self, response: &Response) -> Result<T> {
        if response.status() != self.status {
            return Err(Error::UnhandledResponse);
        }
        self.handler.handle(response)
    }
}

// ============================================================================
// Body handlers
// ============================================================================

/// Ignores the body. Created by [`discard_body_handler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardBodyHandler;

/// Handler that ignores the body and yields `T::default()`.
#[must_use]
pub fn discard_body_handler() -> DiscardBodyHandler {
    DiscardBodyHandler
}

impl<T: Default> Handler<T> for DiscardBodyHandler {
    fn handle(&self, _response: &Response) -> Result<T> {
        Ok(T::default())
    }
}

/// Detects RFC 9457 problem details. Created by [`problem_handler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProblemHandler;

/// Handler for `application/problem+json` responses.
///
/// The problem is decoded and returned as [`Error::Problem`]. A body that is
/// not a valid problem yields the decoding error instead. Responses with any
/// other content type are not handled.
#[must_use]
pub fn problem_handler() -> ProblemHandler {
    ProblemHandler
}

impl<T> Handler<T> for ProblemHandler {
    fn handle(&self, response: &Response) -> Result<T> {
        if !content_type_matches(response, PROBLEM_JSON_CONTENT_TYPE) {
            return Err(Error::UnhandledResponse);
        }
        let problem = ProblemDetails::from_response(response)?;
        Err(problem.into())
    }
}

/// Decodes JSON bodies. Created by [`json_handler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHandler;

/// Handler that decodes the body as JSON.
///
/// The content type is not checked; combine with [`content_type_handler`].
#[must_use]
pub fn json_handler() -> JsonHandler {
    JsonHandler
}

impl<T: serde::de::DeserializeOwned> Handler<T> for JsonHandler {
    fn handle(&self, response: &Response) -> Result<T> {
        response.json()
    }
}

/// Decodes XML bodies. Created by [`xml_handler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlHandler;

/// Handler that decodes the body as XML.
///
/// The content type is not checked; combine with [`content_type_handler`].
#[must_use]
pub fn xml_handler() -> XmlHandler {
    XmlHandler
}

impl<T: serde::de::DeserializeOwned> Handler<T> for XmlHandler {
    fn handle(&self, response: &Response) -> Result<T> {
        response.xml()
    }
}

/// The handlers used when no other handler is configured.
///
/// In order:
/// 1. RFC 9457 problem details become [`Error::Problem`]
/// 2. `application/json` bodies are decoded as JSON
/// 3. `application/xml` bodies are decoded as XML
/// 4. `204 No Content` yields `T::default()`
/// 5. `304 Not Modified` yields `T::default()`
#[must_use]
pub fn default_handlers<T>() -> HandlerChain<T>
where
    T: serde::de::DeserializeOwned + Default + 'static,
{
    HandlerChain::new()
        .with(problem_handler())
        .with(content_type_handler(
            crate::ContentType::Json.as_str(),
            json_handler(),
        ))
        .with(content_type_handler(
            crate::ContentType::Xml.as_str(),
            xml_handler(),
        ))
        .with(status_handler(204, discard_body_handler()))
        .with(status_handler(304, discard_body_handler()))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use bytes::Bytes;
    use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

    use super::*;

    fn response(status: u16, content_type: Option<&'static str>, body: &'static str) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        Response::new(status, headers, Bytes::from_static(body.as_bytes()))
    }

    #[derive(Debug, Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl Counting {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Handler<()> for Counting {
        fn handle(&self, _response: &Response) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn handle_unit(handler: &impl Handler<()>, response: &Response) -> Result<()> {
        handler.handle(response)
    }

    #[derive(Debug)]
    struct TestError;

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("test error")
        }
    }

    impl std::error::Error for TestError {}

    type Recorder = Arc<Mutex<Vec<&'static str>>>;

    fn recording(
        seen: &Recorder,
        name: &'static str,
        result: fn() -> Result<()>,
    ) -> Box<dyn Handler<()>> {
        let seen = Arc::clone(seen);
        Box::new(handler_fn(move |_: &Response| {
            seen.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(name);
            result()
        }))
    }

    fn ok() -> Result<()> {
        Ok(())
    }

    fn unhandled() -> Result<()> {
        Err(Error::UnhandledResponse)
    }

    fn failed() -> Result<()> {
        Err(Error::custom(TestError))
    }

    fn run_chain(handlers: Vec<Box<dyn Handler<()>>>) -> Result<()> {
        let chain: HandlerChain<()> = handlers.into_iter().collect();
        chain.handle(&response(200, None, ""))
    }

    #[test]
    fn empty_chain_is_unhandled() {
        let result = run_chain(Vec::new());
        assert!(matches!(result, Err(Error::UnhandledResponse)));
    }

    #[test]
    fn chain_stops_at_first_success() {
        let seen = Recorder::default();
        let result = run_chain(vec![
            recording(&seen, "handler 1", ok),
            recording(&seen, "handler 2", ok),
        ]);

        assert!(result.is_ok());
        assert_eq!(*seen.lock().expect("lock"), vec!["handler 1"]);
    }

    #[test]
    fn chain_skips_unhandled() {
        let seen = Recorder::default();
        let result = run_chain(vec![
            recording(&seen, "handler 1", unhandled),
            recording(&seen, "handler 2", unhandled),
            recording(&seen, "handler 3", ok),
            recording(&seen, "handler 4", ok),
        ]);

        assert!(result.is_ok());
        assert_eq!(
            *seen.lock().expect("lock"),
            vec!["handler 1", "handler 2", "handler 3"]
        );
    }

    #[test]
    fn chain_stops_at_first_failure() {
        let seen = Recorder::default();
        let result = run_chain(vec![
            recording(&seen, "handler 1", unhandled),
            recording(&seen, "handler 2", failed),
            recording(&seen, "handler 3", ok),
        ]);

        let err = result.expect_err("should fail");
        assert_eq!(err.to_string(), "test error");
        assert_eq!(
            *seen.lock().expect("lock"),
            vec!["handler 1", "handler 2"]
        );
    }

    #[test]
    fn chain_all_unhandled() {
        let seen = Recorder::default();
        let result = run_chain(vec![
            recording(&seen, "handler 1", unhandled),
            recording(&seen, "handler 2", unhandled),
        ]);

        assert!(matches!(result, Err(Error::UnhandledResponse)));
        assert_eq!(seen.lock().expect("lock").len(), 2);
    }

    #[test]
    fn error_handler_returns_error() {
        let handler = error_handler(TestError);

        let err = Handler::<()>::handle(&handler, &response(200, None, ""))
            .expect_err("should fail");
        let Error::Custom(inner) = &err else {
            panic!("unexpected error: {err:?}");
        };
        assert!(inner.downcast_ref::<TestError>().is_some());

        // Same error on every call
        let again = Handler::<()>::handle(&handler, &response(500, None, ""));
        assert!(matches!(again, Err(Error::Custom(_))));
    }

    #[test]
    fn conditional_handler_follows_condition() {
        let wrapped = Arc::new(Counting::default());
        let enabled = Arc::new(AtomicBool::new(false));

        let condition = {
            let enabled = Arc::clone(&enabled);
            move |_: &Response| enabled.load(Ordering::SeqCst)
        };
        let handler = conditional_handler(condition, Arc::clone(&wrapped));
        let ok_response = response(200, None, "");

        assert!(matches!(handle_unit(&handler, &ok_response), Err(Error::UnhandledResponse)));
        assert!(matches!(handle_unit(&handler, &ok_response), Err(Error::UnhandledResponse)));
        assert_eq!(wrapped.calls(), 0);

        enabled.store(true, Ordering::SeqCst);
        assert!(handle_unit(&handler, &ok_response).is_ok());
        assert!(handle_unit(&handler, &ok_response).is_ok());
        assert_eq!(wrapped.calls(), 2);

        enabled.store(false, Ordering::SeqCst);
        assert!(matches!(handle_unit(&handler, &ok_response), Err(Error::UnhandledResponse)));
        assert_eq!(wrapped.calls(), 2);
    }

    #[test]
    fn content_type_handler_matches() {
        let wrapped = Arc::new(Counting::default());
        let json = content_type_handler("application/json", Arc::clone(&wrapped));
        let xml = content_type_handler("application/xml", Arc::clone(&wrapped));

        let plain = response(200, Some("application/json"), "");
        assert!(handle_unit(&json, &plain).is_ok());
        assert!(handle_unit(&json, &plain).is_ok());
        assert_eq!(wrapped.calls(), 2);

        let with_charset = response(200, Some("application/json; charset=utf-8"), "");
        assert!(handle_unit(&json, &with_charset).is_ok());
        assert_eq!(wrapped.calls(), 3);

        assert!(matches!(handle_unit(&xml, &with_charset), Err(Error::UnhandledResponse)));
        assert_eq!(wrapped.calls(), 3);

        let missing = response(200, None, "");
        assert!(matches!(handle_unit(&json, &missing), Err(Error::UnhandledResponse)));
        assert_eq!(wrapped.calls(), 3);
    }

    #[test]
    fn status_handler_matches() {
        let wrapped = Arc::new(Counting::default());
        let ok_response = response(200, None, "");

        assert!(handle_unit(&status_handler(200, Arc::clone(&wrapped)), &ok_response).is_ok());
        assert!(handle_unit(&status_handler(200, Arc::clone(&wrapped)), &ok_response).is_ok());
        assert_eq!(wrapped.calls(), 2);

        let result = handle_unit(&status_handler(201, Arc::clone(&wrapped)), &ok_response);
        assert!(matches!(result, Err(Error::UnhandledResponse)));
        assert_eq!(wrapped.calls(), 2);
    }

    #[test]
    fn discard_body_handler_yields_default() {
        let value: Vec<String> = discard_body_handler()
            .handle(&response(204, None, "ignored"))
            .expect("handled");
        assert!(value.is_empty());
    }

    #[derive(Debug, Default, PartialEq, serde::Deserialize)]
    struct Keys {
        key1: String,
        key2: String,
    }

    #[test]
    fn json_handler_decodes() {
        let keys: Keys = json_handler()
            .handle(&response(200, None, r#"{"key1":"value1","key2":"value2"}"#))
            .expect("decoded");
        assert_eq!(keys.key1, "value1");
        assert_eq!(keys.key2, "value2");
    }

    #[test]
    fn json_handler_rejects_truncated_body() {
        let result: Result<Keys> =
            json_handler().handle(&response(200, None, r#"{"key1":"value1","key2":"value2""#));
        assert!(matches!(result, Err(Error::JsonDeserialization { .. })));
    }

    #[test]
    fn xml_handler_decodes() {
        let keys: Keys = xml_handler()
            .handle(&response(
                200,
                None,
                "<root><key1>value1</key1><key2>value2</key2></root>",
            ))
            .expect("decoded");
        assert_eq!(keys.key1, "value1");
        assert_eq!(keys.key2, "value2");
    }

    #[test]
    fn xml_handler_rejects_broken_document() {
        let result: Result<Keys> = xml_handler().handle(&response(
            200,
            None,
            "<root><key1>value1</key1><key2>value2</key1></root>",
        ));
        assert!(matches!(result, Err(Error::XmlDeserialization(_))));
    }

    #[test]
    fn problem_handler_ignores_other_content_types() {
        let result: Result<()> =
            problem_handler().handle(&response(400, Some("application/json"), "{}"));
        assert!(matches!(result, Err(Error::UnhandledResponse)));
    }

    #[test]
    fn problem_handler_invalid_problem() {
        let result: Result<()> = problem_handler().handle(&response(
            400,
            Some(PROBLEM_JSON_CONTENT_TYPE),
            "invalid json",
        ));
        assert!(matches!(result, Err(Error::JsonDeserialization { .. })));
    }

    #[test]
    fn problem_handler_returns_problem() {
        let result: Result<()> = problem_handler().handle(&response(
            400,
            Some("application/problem+json; charset=utf-8"),
            r#"{"title":"some problem"}"#,
        ));

        let err = result.expect_err("problem");
        let expected = ProblemDetails {
            title: Some("some problem".to_string()),
            ..ProblemDetails::default()
        };
        assert_eq!(err.problem(), Some(&expected));
    }

    #[test]
    fn default_handlers_dispatch() {
        let chain = default_handlers::<Keys>();
        assert_eq!(chain.len(), 5);

        let keys = chain
            .handle(&response(
                200,
                Some("application/json; charset=utf-8"),
                r#"{"key1":"a","key2":"b"}"#,
            ))
            .expect("json");
        assert_eq!(keys.key1, "a");

        let keys = chain
            .handle(&response(
                200,
                Some("application/xml"),
                "<root><key1>c</key1><key2>d</key2></root>",
            ))
            .expect("xml");
        assert_eq!(keys.key2, "d");

        let keys = chain.handle(&response(204, None, "")).expect("no content");
        assert_eq!(keys, Keys::default());

        let keys = chain.handle(&response(304, None, "")).expect("not modified");
        assert_eq!(keys, Keys::default());

        let err = chain
            .handle(&response(
                404,
                Some(PROBLEM_JSON_CONTENT_TYPE),
                r#"{"title":"missing","status":404}"#,
            ))
            .expect_err("problem");
        assert!(err.is_not_found());

        let err = chain
            .handle(&response(500, Some("text/html"), "<h1>oops</h1>"))
            .expect_err("unhandled");
        assert!(err.is_unhandled());
    }
}
