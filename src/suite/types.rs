//! Test suite definition types
//!
//! Defines the data structures for deserializing suite files. Field names on
//! the wire follow the suite-file format (`docURL`, `serverURL`, `cmd`, `data`).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::common::config::Credentials;
use crate::runner::placeholders::ACCESS_TOKEN;

/// A complete test suite loaded from a suite file
#[derive(Deserialize, Debug, Clone)]
pub struct TestSuite {
    /// Server URL shown in the documentation transcript
    #[serde(rename = "docURL")]
    pub doc_url: String,
    /// Server URL requests are actually sent to
    #[serde(rename = "serverURL")]
    pub server_url: String,
    /// Path prefix prepended to every endpoint (e.g. "/api")
    #[serde(default)]
    pub prefix: String,
    /// Login username (falls back to configured credentials)
    pub username: Option<String>,
    /// Login password (falls back to configured credentials)
    pub password: Option<String>,
    /// Health-check path, relative to the prefix
    #[serde(default = "default_health")]
    pub health: String,
    /// Ordered test cases; order is significant
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

fn default_health() -> String {
    "/health".to_string()
}

impl TestSuite {
    /// Full health-check URL
    pub fn health_url(&self) -> String {
        format!("{}{}{}", self.server_url, self.prefix, self.health)
    }

    /// Whether any test sends `$ACCESS_TOKEN` in its Authorization header
    pub fn needs_login(&self) -> bool {
        self.tests.iter().any(|test| {
            test.header("Authorization")
                .is_some_and(|value| value.contains(ACCESS_TOKEN))
        })
    }

    /// Login credentials, falling back to the configured defaults
    pub fn credentials(&self, fallback: &Credentials) -> (String, String) {
        (
            self.username
                .clone()
                .unwrap_or_else(|| fallback.username.clone()),
            self.password
                .clone()
                .unwrap_or_else(|| fallback.password.clone()),
        )
    }
}

/// A single declared request
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TestCase {
    /// Heading in the transcript; absent for setup/cleanup steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// HTTP method
    #[serde(rename = "cmd", default)]
    pub method: Method,
    /// Endpoint path, may contain placeholder tokens
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request headers, in declaration order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, String>>,
    /// Request body, may contain placeholder tokens at any depth
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Text shown before the command in the transcript
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Text shown after the details in the transcript
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_endpoint() -> String {
    "/".to_string()
}

impl TestCase {
    /// Create an unnamed test case
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            name: None,
            method,
            endpoint: endpoint.into(),
            headers: None,
            body: None,
            details: None,
            notes: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: Option<IndexMap<String, String>>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Transcript heading; empty names count as unnamed
    pub fn title(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// Look up a header value by exact name
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|headers| headers.get(key))
            .map(String::as_str)
    }

    /// String field of an object body
    pub fn body_str(&self, key: &str) -> Option<&str> {
        self.body.as_ref()?.get(key)?.as_str()
    }
}

/// HTTP method of a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// Whether requests with this method carry a body
    pub fn carries_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            other => Err(format!("unknown HTTP method '{other}'")),
        }
    }
}

impl TryFrom<String> for Method {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}
