//! One-call HTTP fetching.
//!
//! [`fetch`] starts a [`Fetch`]: a request target plus options, a client and a
//! response handler. [`Fetch::send`] builds the request, executes it and turns
//! the response into a `T` with the handler.
//!
//! ```no_run
//! # async fn run() -> courier::Result<()> {
//! #[derive(Debug, Default, serde::Deserialize)]
//! struct Product {
//!     id: String,
//!     name: String,
//! }
//!
//! let product: Product = courier::fetch(courier::Method::Get, "/api/product/{id}")
//!     .base_url("https://shop.example.com")
//!     .path_value("id", "1234")
//!     .header("Accept", "application/json")
//!     .send()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::io::Read;
use std::sync::OnceLock;

use bytes::Bytes;
use courier_core::options;
use tracing::debug;
use url::Url;

use crate::{
    Error, Handler, HttpClient, HyperClient, Method, RequestBuilder, RequestOption, Response,
    Result, default_handlers,
};

static DEFAULT_CLIENT: OnceLock<HyperClient> = OnceLock::new();

/// The client used by [`fetch`] when none is given.
///
/// Created on first use with [`ClientConfig::default`](crate::ClientConfig::default)
/// and shared by every fetch afterwards.
#[must_use]
pub fn default_client() -> HyperClient {
    DEFAULT_CLIENT.get_or_init(HyperClient::new).clone()
}

/// Start a fetch with the shared default client and [`default_handlers`].
///
/// `method` may be a [`Method`], an [`http::Method`] or a string such as
/// `"GET"`. An unknown method fails the fetch when it is sent.
pub fn fetch<T, M>(method: M, target: impl Into<String>) -> Fetch<T>
where
    T: serde::de::DeserializeOwned + Default + 'static,
    M: TryInto<Method>,
    M::Error: Into<Error>,
{
    Fetch::new(default_client(), method, target, default_handlers())
}

/// Start a fetch with the shared default client and a custom handler.
///
/// Unlike [`fetch`], `T` does not need to be deserializable.
pub fn fetch_with<T, M>(
    method: M,
    target: impl Into<String>,
    handler: impl Handler<T> + 'static,
) -> Fetch<T>
where
    M: TryInto<Method>,
    M::Error: Into<Error>,
{
    Fetch::new(default_client(), method, target, handler)
}

/// A request waiting to be sent.
///
/// Options apply in the order they were added. The first failing option
/// aborts the fetch before anything is sent.
#[must_use = "a fetch does nothing until `send` is awaited"]
pub struct Fetch<T, C = HyperClient> {
    client: C,
    method: Result<Method>,
    target: String,
    options: Vec<RequestOption>,
    handler: Box<dyn Handler<T>>,
}

impl<T, C: std::fmt::Debug> std::fmt::Debug for Fetch<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetch")
            .field("client", &self.client)
            .field("method", &self.method)
            .field("target", &self.target)
            .field("options", &self.options.len())
            .finish_non_exhaustive()
    }
}

impl<T, C> Fetch<T, C>
where
    C: HttpClient,
{
    /// Start a fetch with an explicit client and handler.
    pub fn new<M>(
        client: C,
        method: M,
        target: impl Into<String>,
        handler: impl Handler<T> + 'static,
    ) -> Self
    where
        M: TryInto<Method>,
        M::Error: Into<Error>,
    {
        Self {
            client,
            method: method.try_into().map_err(Into::into),
            target: target.into(),
            options: Vec::new(),
            handler: Box::new(handler),
        }
    }

    /// Send the request with another client.
    pub fn client<C2: HttpClient>(self, client: C2) -> Fetch<T, C2> {
        Fetch {
            client,
            method: self.method,
            target: self.target,
            options: self.options,
            handler: self.handler,
        }
    }

    /// Replace the response handler.
    pub fn handler(mut self, handler: impl Handler<T> + 'static) -> Self {
        self.handler = Box::new(handler);
        self
    }

    /// Replace the response handler with a closure.
    pub fn handler_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Response) -> Result<T> + Send + Sync + 'static,
        T: 'static,
    {
        self.handler(courier_core::handler_fn(f))
    }

    /// Add a request option.
    pub fn option(mut self, option: RequestOption) -> Self {
        self.options.push(option);
        self
    }

    /// Resolve the target against a base URL.
    ///
    /// A base URL that does not parse fails the fetch. See
    /// [`options::with_base_url`].
    pub fn base_url(self, base_url: impl AsRef<str>) -> Self {
        let base_url = Url::parse(base_url.as_ref());
        self.option(RequestOption::new(move |builder| {
            builder.set_base_url(base_url?)
        }))
    }

    /// See [`options::with_path_value`].
    pub fn path_value(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.option(options::with_path_value(name, value))
    }

    /// See [`options::with_added_query_param`].
    pub fn added_query_param(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.option(options::with_added_query_param(key, value))
    }

    /// See [`options::with_query_param`].
    pub fn query_param(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.option(options::with_query_param(key, value))
    }

    /// See [`options::with_query`].
    pub fn query<Q: serde::Serialize + ?Sized>(self, query: &Q) -> Self {
        self.option(options::with_query(query))
    }

    /// See [`options::with_added_header`].
    pub fn added_header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.option(options::with_added_header(name, value))
    }

    /// See [`options::with_header`].
    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.option(options::with_header(name, value))
    }

    /// See [`options::with_body`].
    pub fn body(self, body: impl Into<Bytes>) -> Self {
        self.option(options::with_body(body))
    }

    /// See [`options::with_body_reader`].
    pub fn body_reader<R: Read + Send + 'static>(self, reader: R) -> Self {
        self.option(options::with_body_reader(reader))
    }

    /// See [`options::with_body_json`].
    pub fn json<B: serde::Serialize + ?Sized>(self, body: &B) -> Self {
        self.option(options::with_body_json(body))
    }

    /// See [`options::with_body_form`].
    pub fn form<B: serde::Serialize + ?Sized>(self, body: &B) -> Self {
        self.option(options::with_body_form(body))
    }

    /// See [`options::with_body_xml`].
    pub fn xml<B: serde::Serialize + ?Sized>(self, body: &B) -> Self {
        self.option(options::with_body_xml(body))
    }

    /// Send the request and handle the response.
    ///
    /// # Errors
    ///
    /// - the method is unknown or an option failed
    /// - the request could not be executed
    /// - the handler failed; a response no handler accepted becomes
    ///   [`Error::Http`] carrying its status and body
    pub async fn send(self) -> Result<T> {
        let (value, _response) = self.send_with_response().await?;
        value
    }

    /// Like [`send`](Self::send) but also returns the raw response.
    ///
    /// Once a response has arrived it is returned even if handling it failed,
    /// so its headers stay reachable next to the handler error.
    ///
    /// # Errors
    ///
    /// The outer result fails when no response was received: the method is
    /// unknown, an option failed or the request could not be executed.
    pub async fn send_with_response(self) -> Result<(Result<T>, Response)> {
        let Self {
            client,
            method,
            target,
            options,
            handler,
        } = self;

        let mut builder = RequestBuilder::new(method?, target);
        for option in options {
            builder.apply(option)?;
        }
        let request = builder.build()?;

        let response = client.execute(request).await?;

        let value = match handler.handle(&response) {
            Err(Error::UnhandledResponse) => {
                debug!(
                    status = response.status(),
                    content_type = response.content_type(),
                    "no handler accepted the response"
                );
                Err(Error::http_with_body(
                    response.status(),
                    "unhandled response",
                    response.body().clone(),
                ))
            }
            value => value,
        };

        Ok((value, response))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use assert2::{check, let_assert};
    use http::HeaderMap;

    use super::*;
    use crate::Request;

    /// Records requests and answers with a fixed response.
    #[derive(Debug, Clone)]
    struct Canned {
        status: u16,
        body: &'static str,
        seen: Arc<Mutex<Vec<Request>>>,
    }

    impl Canned {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                seen: Arc::default(),
            }
        }

        fn requests(&self) -> Vec<Request> {
            self.seen.lock().expect("lock").clone()
        }
    }

    impl HttpClient for Canned {
        async fn execute(&self, request: Request) -> Result<Response> {
            self.seen.lock().expect("lock").push(request);
            Ok(Response::new(
                self.status,
                HeaderMap::new(),
                Bytes::from_static(self.body.as_bytes()),
            ))
        }
    }

    fn text(response: &Response) -> Result<String> {
        response
            .text()
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    #[tokio::test]
    async fn options_shape_the_request() {
        let client = Canned::new(200, "ok");

        let body = Fetch::new(client.clone(), "PUT", "/{id}", courier_core::handler_fn(text))
            .base_url("http://localhost:8080/base/")
            .path_value("id", "a b")
            .query_param("q", "1")
            .header("X-Api-Key", "secret")
            .body("payload")
            .send()
            .await
            .expect("send");

        check!(body == "ok");
        let requests = client.requests();
        let_assert!([request] = requests.as_slice());
        check!(request.method() == &Method::Put);
        check!(request.url().as_str() == "http://localhost:8080/a%20b?q=1");
        check!(request.header("X-Api-Key") == Some("secret"));
        check!(request.body() == Some(&Bytes::from_static(b"payload")));
    }

    #[tokio::test]
    async fn invalid_method_is_reported_on_send() {
        let client = Canned::new(200, "");

        let result = Fetch::new(client.clone(), "HELLO WORLD", "http://localhost/", text_handler())
            .send()
            .await;

        let_assert!(Err(err) = result);
        check!(err.to_string() == "invalid request: invalid method \"HELLO WORLD\"");
        check!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn option_error_prevents_the_request() {
        let client = Canned::new(200, "");

        let result = Fetch::new(client.clone(), Method::Get, "http://localhost/", text_handler())
            .option(RequestOption::new(|_| Err(Error::invalid_request("test error"))))
            .send()
            .await;

        let_assert!(Err(Error::InvalidRequest(message)) = result);
        check!(message == "test error");
        check!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn unhandled_response_becomes_http_error() {
        let client = Canned::new(418, "teapot");

        let result = Fetch::new(
            client,
            Method::Get,
            "http://localhost/",
            courier_core::handler_fn(|_: &Response| Err::<String, _>(Error::UnhandledResponse)),
        )
        .send()
        .await;

        let_assert!(Err(err) = result);
        check!(err.status() == Some(418));
        check!(err.body() == Some(&Bytes::from_static(b"teapot")));
        check!(!err.is_unhandled());
    }

    #[tokio::test]
    async fn send_with_response_keeps_the_response() {
        let client = Canned::new(202, "accepted");

        let (body, response) = Fetch::new(client, Method::Post, "http://localhost/", text_handler())
            .send_with_response()
            .await
            .expect("send");

        check!(body.ok().as_deref() == Some("accepted"));
        check!(response.status() == 202);
    }

    #[tokio::test]
    async fn send_with_response_keeps_the_response_on_handler_error() {
        let client = Canned::new(409, "conflict");

        let (result, response) = Fetch::new(
            client,
            Method::Put,
            "http://localhost/",
            courier_core::handler_fn(|_: &Response| Err::<String, _>(Error::UnhandledResponse)),
        )
        .send_with_response()
        .await
        .expect("response received");

        let_assert!(Err(err) = result);
        check!(err.status() == Some(409));
        check!(response.text().ok().as_deref() == Some("conflict"));
    }

    #[tokio::test]
    async fn send_with_response_fails_without_response() {
        let client = Canned::new(200, "");

        let result = Fetch::new(client.clone(), Method::Get, "/relative", text_handler())
            .send_with_response()
            .await;

        let_assert!(Err(Error::InvalidUrl(_)) = result);
        check!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn handler_without_default_value() {
        struct Status(u16);

        let client = Canned::new(201, "");
        let status: Status = Fetch::new(
            client,
            Method::Post,
            "http://localhost/",
            courier_core::handler_fn(|response: &Response| Ok(Status(response.status()))),
        )
        .send()
        .await
        .expect("status");

        check!(status.0 == 201);
    }

    fn text_handler() -> impl Handler<String> {
        courier_core::handler_fn(text)
    }
}
