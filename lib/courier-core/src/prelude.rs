//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier_core::prelude::*;
//! ```

pub use crate::options::*;
pub use crate::{
    ContentType, Error, Handler, HandlerChain, HttpClient, Method, ProblemDetails, Request,
    RequestBuilder, Response, Result, conditional_handler, content_type_handler,
    default_handlers, discard_body_handler, error_handler, handler_fn, json_handler,
    problem_handler, status_handler, xml_handler,
};
