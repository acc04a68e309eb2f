//! RFC 9457 problem details.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Response, Result};

/// Content type of JSON encoded problem details.
pub const PROBLEM_JSON_CONTENT_TYPE: &str = "application/problem+json";

fn about_blank() -> String {
    "about:blank".to_string()
}

fn is_about_blank(type_uri: &str) -> bool {
    type_uri == "about:blank"
}

/// Problem details as defined by [RFC 9457](https://www.rfc-editor.org/rfc/rfc9457).
///
/// Members not defined by the RFC are kept in [`ProblemDetails::extensions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type.
    #[serde(rename = "type", default = "about_blank", skip_serializing_if = "is_about_blank")]
    pub type_uri: String,
    /// Short, human-readable summary of the problem type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// HTTP status code generated by the origin server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Human-readable explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// URI reference identifying this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Extension members.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl Default for ProblemDetails {
    fn default() -> Self {
        Self {
            type_uri: about_blank(),
            title: None,
            status: None,
            detail: None,
            instance: None,
            extensions: BTreeMap::new(),
        }
    }
}

impl ProblemDetails {
    /// Decode problem details from a response body.
    ///
    /// The content type is not checked; see [`problem_handler`](crate::problem_handler).
    pub fn from_response(response: &Response) -> Result<Self> {
        crate::from_json(response.body())
    }

    /// Extension member by name.
    #[must_use]
    pub fn extension(&self, name: &str) -> Option<&serde_json::Value> {
        self.extensions.get(name)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let title = self.title.as_deref().unwrap_or(&self.type_uri);
        match self.status {
            Some(status) => write!(f, "{status} {title}")?,
            None => write!(f, "{title}")?,
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ProblemDetails {}
