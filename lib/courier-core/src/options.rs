//! Request options.
//!
//! A [`RequestOption`] mutates a [`RequestBuilder`] before the request is sent.
//! Options run in the order they are given and the first failing option
//! aborts the request.
//!
//! # Example
//!
//! ```
//! use courier_core::{Method, RequestBuilder, options};
//!
//! let mut builder = RequestBuilder::new(Method::Get, "/api/product/{id}");
//! for option in [
//!     options::with_base_url("https://shop.example.com".parse().unwrap()),
//!     options::with_path_value("id", "1234"),
//!     options::with_header("Accept", "application/json"),
//! ] {
//!     builder.apply(option).unwrap();
//! }
//!
//! let request = builder.build().unwrap();
//! assert_eq!(request.url().as_str(), "https://shop.example.com/api/product/1234");
//! ```

use std::io::Read;

use bytes::Bytes;
use url::Url;

use crate::{RequestBuilder, Result};

type ApplyFn = dyn FnOnce(&mut RequestBuilder) -> Result<()> + Send;

/// A deferred mutation of a [`RequestBuilder`].
pub struct RequestOption {
    apply: Box<ApplyFn>,
}

impl std::fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestOption").finish_non_exhaustive()
    }
}

impl RequestOption {
    /// Create an option from a closure.
    pub fn new<F>(apply: F) -> Self
    where
        F: FnOnce(&mut RequestBuilder) -> Result<()> + Send + 'static,
    {
        Self {
            apply: Box::new(apply),
        }
    }

    /// Run the option against a builder.
    pub fn apply(self, builder: &mut RequestBuilder) -> Result<()> {
        (self.apply)(builder)
    }
}

/// Resolve the request target against `base_url`.
///
/// Useful when paths stay the same but the host differs between environments.
/// The target is resolved when the option runs, so path values given later
/// can fill placeholders of the base path too. An already absolute target is
/// left alone.
#[must_use]
pub fn with_base_url(base_url: Url) -> RequestOption {
    RequestOption::new(move |builder| builder.set_base_url(base_url))
}

/// Replace every `{name}` path segment with the escaped `value`.
///
/// For example `/api/product/{id}` with `id = "1234"` becomes
/// `/api/product/1234`. The placeholder must be a whole segment, so
/// `/api/product/p{id}` is left alone. Fails with
/// [`Error::UnusedPathValue`](crate::Error::UnusedPathValue) if the
/// placeholder does not occur.
#[must_use]
pub fn with_path_value(name: impl Into<String>, value: impl Into<String>) -> RequestOption {
    let name = name.into();
    let value = value.into();
    RequestOption::new(move |builder| builder.fill_path_value(&name, &value))
}

/// Add a query parameter after any existing values.
#[must_use]
pub fn with_added_query_param(key: impl Into<String>, value: impl Into<String>) -> RequestOption {
    let key = key.into();
    let value = value.into();
    RequestOption::new(move |builder| {
        builder.add_query_param(key, value);
        Ok(())
    })
}

/// Set a query parameter, replacing any existing values.
#[must_use]
pub fn with_query_param(key: impl Into<String>, value: impl Into<String>) -> RequestOption {
    let key = key.into();
    let value = value.into();
    RequestOption::new(move |builder| {
        builder.set_query_param(key, value);
        Ok(())
    })
}

/// Add every field of a serializable value as query parameters.
#[must_use]
pub fn with_query<T: serde::Serialize + ?Sized>(value: &T) -> RequestOption {
    let encoded = crate::to_query_string(value);
    RequestOption::new(move |builder| {
        for (key, value) in url::form_urlencoded::parse(encoded?.as_bytes()).into_owned() {
            builder.add_query_param(key, value);
        }
        Ok(())
    })
}

/// Add a header value after any existing values.
#[must_use]
pub fn with_added_header(name: impl Into<String>, value: impl Into<String>) -> RequestOption {
    let name = name.into();
    let value = value.into();
    RequestOption::new(move |builder| builder.append_header(&name, &value))
}

/// Set a header, replacing any existing values.
#[must_use]
pub fn with_header(name: impl Into<String>, value: impl Into<String>) -> RequestOption {
    let name = name.into();
    let value = value.into();
    RequestOption::new(move |builder| builder.insert_header(&name, &value))
}

/// Use the given bytes as request body.
#[must_use]
pub fn with_body(body: impl Into<Bytes>) -> RequestOption {
    let body = body.into();
    RequestOption::new(move |builder| {
        builder.set_body(body);
        Ok(())
    })
}

/// Read the body from a reader when the option is applied.
///
/// A read error fails the request.
#[must_use]
pub fn with_body_reader<R>(reader: R) -> RequestOption
where
    R: Read + Send + 'static,
{
    RequestOption::new(move |builder| builder.set_body_reader(reader))
}

/// Encode `value` as JSON and use it as body.
///
/// `Content-Type: application/json` is set unless a non-empty
/// `Content-Type` header is already present.
#[must_use]
pub fn with_body_json<T: serde::Serialize + ?Sized>(value: &T) -> RequestOption {
    let body = crate::to_json(value);
    RequestOption::new(move |builder| {
        builder.set_typed_body(crate::ContentType::Json, body?);
        Ok(())
    })
}

/// Encode `value` as `application/x-www-form-urlencoded` and use it as body.
#[must_use]
pub fn with_body_form<T: serde::Serialize + ?Sized>(value: &T) -> RequestOption {
    let body = crate::to_form(value);
    RequestOption::new(move |builder| {
        builder.set_typed_body(crate::ContentType::FormUrlEncoded, body?);
        Ok(())
    })
}

/// Encode `value` as XML and use it as body.
#[must_use]
pub fn with_body_xml<T: serde::Serialize + ?Sized>(value: &T) -> RequestOption {
    let body = crate::to_xml(value);
    RequestOption::new(move |builder| {
        builder.set_typed_body(crate::ContentType::Xml, body?);
        Ok(())
    })
}
