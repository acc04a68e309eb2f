//! Core types and traits for the courier HTTP convenience layer.
//!
//! This crate is transport-agnostic:
//! - [`Method`] - HTTP method enum
//! - [`RequestBuilder`] and [`RequestOption`] - request construction
//! - [`Request`] and [`Response`] - buffered HTTP messages
//! - [`Handler`] and [`HandlerChain`] - response dispatch into typed values
//! - [`ProblemDetails`] - RFC 9457 problem documents
//! - [`Error`] and [`Result`] - error handling
//! - [`HttpClient`] - the transport seam
//! - [`StatusCode`] and [`header`] - re-exported from the `http` crate

mod body;
mod client;
mod error;
mod handler;
mod method;
pub mod options;
mod path_template;
pub mod prelude;
mod problem;
mod request;
mod response;

pub use body::{
    ContentType, from_json, from_xml, media_type, to_form, to_json, to_query_string, to_xml,
};
pub use client::HttpClient;
pub use error::{Error, Result};
pub use handler::{
    ConditionalHandler, ContentTypeHandler, DiscardBodyHandler, ErrorHandler, Handler,
    HandlerChain, HandlerFn, JsonHandler, ProblemHandler, StatusHandler, XmlHandler,
    conditional_handler, content_type_handler, default_handlers, discard_body_handler,
    error_handler, handler_fn, json_handler, problem_handler, status_handler, xml_handler,
};
pub use method::Method;
pub use options::RequestOption;
pub use path_template::{PathTemplate, escape_path_segment};
pub use problem::{PROBLEM_JSON_CONTENT_TYPE, ProblemDetails};
pub use request::{Request, RequestBuilder};
pub use response::Response;

pub use http::{StatusCode, header};
