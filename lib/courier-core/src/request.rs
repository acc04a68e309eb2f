//! HTTP request building.
//!
//! A [`RequestBuilder`] collects everything about a request before its URL is
//! final: the target may still contain `{name}` placeholders and may still be
//! relative. [`RequestBuilder::build`] turns it into a [`Request`].
//!
//! Placeholders are only ever filled in the path. The scheme and authority of
//! an absolute target are kept apart from the start.
//!
//! # Example
//!
//! ```
//! use courier_core::{Method, RequestBuilder};
//!
//! let mut builder = RequestBuilder::new(Method::Get, "/users/{id}");
//! builder.set_base_url("https://api.example.com".parse().unwrap()).unwrap();
//! builder.fill_path_value("id", "42").unwrap();
//! builder.add_query_param("expand", "teams");
//!
//! let request = builder.build().unwrap();
//! assert_eq!(request.url().as_str(), "https://api.example.com/users/42?expand=teams");
//! ```

use std::borrow::Cow;
use std::io::Read;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::{ContentType, Error, Method, PathTemplate, Result};

/// An HTTP request with method, URL, headers, and optional body.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    /// Creates a request directly from its parts.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a new [`RequestBuilder`] for the given target.
    #[must_use]
    pub fn builder(method: Method, target: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, target)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header, if it is valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, HeaderMap, Option<Bytes>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// In-flight request that request options operate on.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    origin: Option<String>,
    path: PathTemplate,
    raw_query: Option<String>,
    query: Option<Vec<(String, String)>>,
    fragment: Option<String>,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl RequestBuilder {
    /// Creates a new builder.
    ///
    /// The target is either an absolute URL or a reference resolved against
    /// the base URL, and may carry a query string.
    #[must_use]
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        let target = target.into();

        let (rest, fragment) = match target.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (target.as_str(), None),
        };
        let (rest, raw_query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query.to_string())),
            None => (rest, None),
        };
        let (origin, path) = split_origin(rest);

        Self {
            method,
            origin,
            path: PathTemplate::new(path),
            raw_query,
            query: None,
            fragment,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Scheme and authority, such as `https://api.example.com`.
    ///
    /// `None` while the target is still relative.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Target path, with any placeholders not yet filled.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Current headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Current body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Current query pairs, in order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match (&self.query, &self.raw_query) {
            (Some(pairs), _) => pairs.clone(),
            (None, Some(raw)) => parse_query(raw),
            (None, None) => Vec::new(),
        }
    }

    /// Resolves the target against `base_url` right away.
    ///
    /// Resolution follows RFC 3986. A target that is already absolute is left
    /// unchanged, so once one base URL has been applied later ones are
    /// ignored. Placeholders in the base path can be filled afterwards.
    ///
    /// Fails with [`Error::InvalidUrl`] if the base cannot resolve the target.
    pub fn set_base_url(&mut self, base_url: Url) -> Result<()> {
        if self.origin.is_some() {
            return Ok(());
        }

        let resolved = base_url.join(&relative_reference(self.path.as_str()))?;
        if self.raw_query.is_none() && self.query.is_none() {
            self.raw_query = resolved.query().map(str::to_string);
        }

        let (origin, path) = split_resolved(resolved);
        self.origin = Some(origin);
        self.path = PathTemplate::new(path);
        Ok(())
    }

    /// Replaces every `{name}` segment of the path with `value`.
    ///
    /// See [`PathTemplate::fill`].
    pub fn fill_path_value(&mut self, name: &str, value: &str) -> Result<()> {
        self.path.fill(name, value)
    }

    /// Appends a query parameter, keeping existing values.
    pub fn add_query_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.query_mut().push((name.into(), value.into()));
    }

    /// Sets a query parameter, replacing all existing values for `name`.
    ///
    /// The parameter keeps the position of its first occurrence.
    pub fn set_query_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let query = self.query_mut();

        match query.iter().position(|(key, _)| *key == name) {
            Some(first) => {
                let mut index = 0;
                query.retain(|(key, _)| {
                    let keep = index <= first || *key != name;
                    index += 1;
                    keep
                });
                if let Some(pair) = query.get_mut(first) {
                    pair.1 = value;
                }
            }
            None => query.push((name, value)),
        }
    }

    /// Appends every pair of a serializable value to the query.
    pub fn extend_query<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let encoded = crate::to_query_string(value)?;
        self.query_mut().extend(parse_query(&encoded));
        Ok(())
    }

    /// Appends a header value, keeping existing values.
    pub fn append_header(&mut self, name: &str, value: &str) -> Result<()> {
        let (name, value) = header_pair(name, value)?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Sets a header, replacing existing values.
    pub fn insert_header(&mut self, name: &str, value: &str) -> Result<()> {
        let (name, value) = header_pair(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Sets the request body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = Some(body.into());
    }

    /// Reads the reader to its end and uses the bytes as body.
    pub fn set_body_reader(&mut self, mut reader: impl Read) -> Result<()> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.set_body(buf);
        Ok(())
    }

    /// Sets an already encoded body and its content type.
    ///
    /// A non-empty `Content-Type` header set earlier is kept.
    pub fn set_typed_body(&mut self, content_type: ContentType, body: Bytes) {
        let has_content_type = self
            .headers
            .get(CONTENT_TYPE)
            .is_some_and(|value| !value.is_empty());
        if !has_content_type {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
        }
        self.body = Some(body);
    }

    /// Sets a JSON body.
    pub fn set_json<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let body = crate::to_json(value)?;
        self.set_typed_body(ContentType::Json, body);
        Ok(())
    }

    /// Sets a form-urlencoded body.
    pub fn set_form<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let body = crate::to_form(value)?;
        self.set_typed_body(ContentType::FormUrlEncoded, body);
        Ok(())
    }

    /// Sets an XML body.
    pub fn set_xml<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let body = crate::to_xml(value)?;
        self.set_typed_body(ContentType::Xml, body);
        Ok(())
    }

    /// Applies a request option.
    pub fn apply(&mut self, option: crate::RequestOption) -> Result<()> {
        option.apply(self)
    }

    /// Resolves the final URL and builds the [`Request`].
    ///
    /// Fails with [`Error::InvalidUrl`] if the target is relative and no base
    /// URL was set.
    pub fn build(self) -> Result<Request> {
        let Some(origin) = &self.origin else {
            return Err(url::ParseError::RelativeUrlWithoutBase.into());
        };
        let mut url = Url::parse(&format!("{origin}{}", self.path.as_str()))?;

        match (self.query, self.raw_query) {
            (Some(pairs), _) if pairs.is_empty() => url.set_query(None),
            (Some(pairs), _) => {
                url.query_pairs_mut().clear().extend_pairs(pairs);
            }
            (None, Some(raw)) => url.set_query(Some(&raw)),
            (None, None) => {}
        }

        if let Some(fragment) = &self.fragment {
            url.set_fragment(Some(fragment));
        }

        Ok(Request {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
        })
    }

    fn query_mut(&mut self) -> &mut Vec<(String, String)> {
        let raw = &self.raw_query;
        self.query
            .get_or_insert_with(|| raw.as_deref().map(parse_query).unwrap_or_default())
    }
}

/// Splits `scheme://authority` or `scheme:` off an absolute target.
fn split_origin(target: &str) -> (Option<String>, &str) {
    let Some((scheme, rest)) = target.split_once(':') else {
        return (None, target);
    };
    if !is_scheme(scheme) {
        return (None, target);
    }

    match rest.strip_prefix("//") {
        Some(after) => {
            let (authority, path) = after.split_at(after.find('/').unwrap_or(after.len()));
            (Some(format!("{scheme}://{authority}")), path)
        }
        None => (Some(format!("{scheme}:")), rest),
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// A relative path whose first segment holds a `:` would read as a scheme.
fn relative_reference(path: &str) -> Cow<'_, str> {
    let first = path.split('/').next().unwrap_or_default();
    if first.contains(':') {
        Cow::Owned(format!("./{path}"))
    } else {
        Cow::Borrowed(path)
    }
}

fn split_resolved(mut url: Url) -> (String, String) {
    url.set_query(None);
    url.set_fragment(None);
    let path = url.path().to_string();
    let mut origin = String::from(url);
    origin.truncate(origin.len().saturating_sub(path.len()));
    (origin, path)
}

fn parse_query(raw: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::invalid_header(format!("{name:?}: {e}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| Error::invalid_header(format!("{name}: {e}")))?;
    Ok((header_name, header_value))
}
