//! reqwest-backed executor

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::common::Result;
use crate::suite::{Method, TestCase};

use super::{HealthStatus, HttpExecutor, HttpOutcome};

/// Executor that sends real requests with a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("api-check/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// `"200 OK"` style status line
fn status_line(status: reqwest::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(
        &self,
        base_url: &str,
        prefix: &str,
        test: &TestCase,
        timeout: Duration,
    ) -> HttpOutcome {
        let url = format!("{}{}{}", base_url, prefix, test.endpoint);
        let mut request = self
            .client
            .request(test.method.into(), &url)
            .timeout(timeout);

        if let Some(headers) = &test.headers {
            for (key, value) in headers {
                request = request.header(key.as_str(), value.as_str());
            }
        }

        request = match &test.body {
            Some(body @ (Value::Object(_) | Value::Array(_))) => request.json(body),
            Some(Value::String(text)) => request.body(text.clone()),
            Some(other) => request.body(other.to_string()),
            None => request,
        };

        tracing::debug!(method = %test.method, url = %url, "Sending request");

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Request failed");
                return HttpOutcome::transport_error(e.to_string());
            }
        };

        let status = status_line(response.status());
        match response.text().await {
            Ok(text) => HttpOutcome::from_text(status, text),
            Err(e) => HttpOutcome::transport_error(e.to_string()),
        }
    }

    async fn check_health(&self, url: &str, timeout: Duration) -> HealthStatus {
        match self.client.get(url).timeout(timeout).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => HealthStatus::healthy(),
            Ok(response) => HealthStatus::unhealthy(format!("Status {}", response.status().as_u16())),
            Err(e) => HealthStatus::unhealthy(e.to_string()),
        }
    }
}
