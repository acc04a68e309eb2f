//! Fetch HTTP resources with composable request options and typed response
//! handlers.
//!
//! A fetch names a method and a target, applies [request options](options)
//! such as path values, query parameters, headers and bodies, sends the
//! request, and runs a [`Handler`] that turns the response into a value.
//! [`default_handlers`] decode JSON and XML bodies, accept empty `204` and
//! `304` responses and surface RFC 9457 problem documents as
//! [`Error::Problem`].
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> courier::Result<()> {
//! use courier::{Method, conditional_handler, handler_fn, HandlerChain};
//!
//! #[derive(Debug, Default, serde::Deserialize)]
//! struct Product {
//!     id: String,
//! }
//!
//! let product: Product = courier::fetch(Method::Get, "https://shop.example.com/api/product/{id}")
//!     .path_value("id", "1234")
//!     .send()
//!     .await?;
//!
//! let created: String = courier::fetch("POST", "https://shop.example.com/api/product")
//!     .json(&serde_json::json!({ "name": "kettle" }))
//!     .handler(
//!         HandlerChain::new()
//!             .with(courier::problem_handler())
//!             .with(conditional_handler(
//!                 |response: &courier::Response| response.status() == 201,
//!                 handler_fn(|response: &courier::Response| {
//!                     Ok(response.header("Location").unwrap_or_default().to_string())
//!                 }),
//!             )),
//!     )
//!     .send()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod api_client;
mod client;
mod config;
mod connector;
mod fetch;
pub mod middleware;
pub mod prelude;

pub use api_client::ApiClient;
pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use fetch::{Fetch, default_client, fetch, fetch_with};

pub use tower;

pub use courier_core::options;
pub use courier_core::{
    ConditionalHandler, ContentType, ContentTypeHandler, DiscardBodyHandler, Error, ErrorHandler,
    Handler, HandlerChain, HandlerFn, HttpClient, JsonHandler, Method, PROBLEM_JSON_CONTENT_TYPE,
    PathTemplate, ProblemDetails, ProblemHandler, Request, RequestBuilder, RequestOption,
    Response, Result, StatusHandler, XmlHandler, conditional_handler, content_type_handler,
    default_handlers, discard_body_handler, error_handler, escape_path_segment, from_json,
    from_xml, handler_fn, json_handler, media_type, problem_handler, status_handler, to_form,
    to_json, to_query_string, to_xml, xml_handler,
};
pub use courier_core::{StatusCode, header};

pub use url;
