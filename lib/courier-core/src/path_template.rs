//! Path placeholder substitution.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::{Error, Result};

/// Characters escaped when a value is inserted as a single path segment.
///
/// Everything but the unreserved characters and `$ & + : = @` is escaped,
/// so a value can never introduce a new segment, query or fragment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

/// Escape a value so it can be used as one path segment.
#[must_use]
pub fn escape_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// A request path that may still contain `{name}` placeholders.
///
/// A placeholder must fill a whole segment: `/users/{id}` and `{id}/posts`
/// contain the `id` placeholder, `/users/u{id}` does not. Segments are
/// compared percent-decoded, so `%7Bid%7D` is the same placeholder.
///
/// # Example
///
/// ```
/// use courier_core::PathTemplate;
///
/// let mut path = PathTemplate::new("/api/product/{id}");
/// path.fill("id", "12 34").expect("placeholder exists");
/// assert_eq!(path.as_str(), "/api/product/12%2034");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathTemplate(String);

impl PathTemplate {
    /// Create a new path template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Get the current path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the path string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns `true` if the path has a `{name}` segment.
    #[must_use]
    pub fn has_placeholder(&self, name: &str) -> bool {
        let placeholder = format!("{{{name}}}");
        self.0
            .split('/')
            .any(|segment| is_placeholder(segment, &placeholder))
    }

    /// Replace every `{name}` segment with the escaped `value`.
    ///
    /// Fails with [`Error::UnusedPathValue`] when no segment was replaced,
    /// leaving the path untouched.
    pub fn fill(&mut self, name: &str, value: &str) -> Result<()> {
        if !self.has_placeholder(name) {
            return Err(Error::UnusedPathValue {
                path: self.0.clone(),
                name: name.to_string(),
                value: value.to_string(),
            });
        }

        let placeholder = format!("{{{name}}}");
        let escaped = escape_path_segment(value);
        self.0 = self
            .0
            .split('/')
            .map(|segment| {
                if is_placeholder(segment, &placeholder) {
                    escaped.as_str()
                } else {
                    segment
                }
            })
            .collect::<Vec<_>>()
            .join("/");

        Ok(())
    }
}

fn is_placeholder(segment: &str, placeholder: &str) -> bool {
    segment == placeholder || percent_decode_str(segment).decode_utf8_lossy() == placeholder
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PathTemplate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PathTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<String> for PathTemplate {
    fn from(template: String) -> Self {
        Self(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_single_placeholder() {
        let mut path = PathTemplate::new("/{ValueA}/{ValueB}");
        path.fill("ValueA", "A").expect("ValueA");
        path.fill("ValueB", "B").expect("ValueB");
        assert_eq!(path.as_str(), "/A/B");
    }

    #[test]
    fn fill_every_occurrence() {
        let mut path = PathTemplate::new("/{ValueA}/{ValueB}/{ValueA}/{ValueB}");
        path.fill("ValueA", "A").expect("ValueA");
        path.fill("ValueB", "B").expect("ValueB");
        assert_eq!(path.as_str(), "/A/B/A/B");
    }

    #[test]
    fn fill_adjacent_occurrences() {
        let mut path = PathTemplate::new("/{id}/{id}");
        path.fill("id", "1").expect("id");
        assert_eq!(path.as_str(), "/1/1");
    }

    #[test]
    fn fill_placeholder_at_start_and_end() {
        let mut path = PathTemplate::new("{tenant}/items/{item}");
        path.fill("tenant", "acme").expect("tenant");
        path.fill("item", "7").expect("item");
        assert_eq!(path.as_str(), "acme/items/7");
    }

    #[test]
    fn fill_percent_encoded_placeholder() {
        let mut path = PathTemplate::new("/%7Bversion%7D/users/%7bid%7d");
        path.fill("version", "v2").expect("version");
        path.fill("id", "42").expect("id");
        assert_eq!(path.as_str(), "/v2/users/42");
    }

    #[test]
    fn prefixed_placeholder_is_not_replaced() {
        let mut path = PathTemplate::new("/api/product/p{id}");
        let err = path.fill("id", "1234").expect_err("not a placeholder");
        assert_eq!(
            err.to_string(),
            "placeholder {id} not found in path /api/product/p{id}"
        );
        assert_eq!(path.as_str(), "/api/product/p{id}");
    }

    #[test]
    fn unknown_placeholder_reports_current_path() {
        let mut path = PathTemplate::new("/{ValueA}");
        path.fill("ValueA", "A").expect("ValueA");

        let err = path.fill("ValueB", "B").expect_err("unknown");
        assert!(matches!(
            err,
            Error::UnusedPathValue { ref path, ref name, ref value }
                if path == "/A" && name == "ValueB" && value == "B"
        ));
    }

    #[test]
    fn value_is_escaped_as_segment() {
        assert_eq!(escape_path_segment("a/b"), "a%2Fb");
        assert_eq!(escape_path_segment("a b?c#d"), "a%20b%3Fc%23d");
        assert_eq!(escape_path_segment("a;b,c"), "a%3Bb%2Cc");
        assert_eq!(escape_path_segment("x:y=z@w+v$u&t"), "x:y=z@w+v$u&t");
        assert_eq!(escape_path_segment("A-z_0.9~"), "A-z_0.9~");
        assert_eq!(escape_path_segment("é"), "%C3%A9");
    }

    #[test]
    fn has_placeholder() {
        let path = PathTemplate::new("/users/{id}/posts");
        assert!(path.has_placeholder("id"));
        assert!(!path.has_placeholder("post_id"));
    }
}
