//! HTTP transport
//!
//! The runner talks to the server only through [`HttpExecutor`]: one request
//! in, one outcome out. Transport failures never surface as errors; they come
//! back as an outcome with the `"ERROR"` status so the suite keeps going.

mod client;
pub mod curl;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::common::is_success;
use crate::suite::TestCase;

pub use client::ReqwestExecutor;

/// Status reported when the request never produced an HTTP response
pub const ERROR_STATUS: &str = "ERROR";

/// Result of executing one request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpOutcome {
    /// Status line such as `"200 OK"`, or `"ERROR"` on transport failure
    pub status: String,
    /// Response body: pretty-printed JSON when parseable, raw text otherwise,
    /// or the transport error text
    pub body: String,
    /// Parsed response body, when it was valid JSON
    pub structured: Option<Value>,
}

impl HttpOutcome {
    /// Outcome for a request that failed before a response arrived
    pub fn transport_error(message: impl Into<String>) -> Self {
        Self {
            status: ERROR_STATUS.to_string(),
            body: message.into(),
            structured: None,
        }
    }

    /// Build an outcome from a status line and raw body text
    pub fn from_text(status: impl Into<String>, text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Self {
                status: status.into(),
                body: serde_json::to_string_pretty(&value).unwrap_or(text),
                structured: Some(value),
            },
            Err(_) => Self {
                status: status.into(),
                body: text,
                structured: None,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        is_success(&self.status)
    }

    /// Parsed body of a successful response
    pub fn success_body(&self) -> Option<&Value> {
        if self.is_success() {
            self.structured.as_ref()
        } else {
            None
        }
    }
}

/// Result of a health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub healthy: bool,
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            error: None,
        }
    }

    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self {
            healthy: false,
            error: Some(reason.into()),
        }
    }
}

/// Executes declared requests against a live server
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// Send `test` to `base_url + prefix + endpoint`
    async fn execute(
        &self,
        base_url: &str,
        prefix: &str,
        test: &TestCase,
        timeout: Duration,
    ) -> HttpOutcome;

    /// Check whether the server answers the health URL with 200
    async fn check_health(&self, url: &str, timeout: Duration) -> HealthStatus;
}
