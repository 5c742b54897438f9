//! Authentication state and lifecycle detection
//!
//! Logins, token refreshes and password changes are recognized from the
//! method and endpoint of a test, never from the response. Every token seen
//! during a run is remembered so transcripts can scrub all of them, including
//! ones rotated away mid-run.

use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::http::HttpExecutor;
use crate::suite::{Method, TestCase};

pub const LOGIN_ENDPOINT: &str = "/auth:login";
pub const REFRESH_ENDPOINT: &str = "/auth:refresh";
pub const PROFILE_ENDPOINT: &str = "/auth:me";

/// Tokens and credentials for one suite run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    username: Option<String>,
    password: Option<String>,
    access_history: Vec<String>,
    refresh_history: Vec<String>,
}

impl AuthState {
    /// Empty state that knows which credentials to log in with
    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Every access token seen this run, oldest first
    pub fn access_history(&self) -> &[String] {
        &self.access_history
    }

    /// Every refresh token seen this run, oldest first
    pub fn refresh_history(&self) -> &[String] {
        &self.refresh_history
    }

    /// Make `token` current and remember it; empty tokens are ignored
    pub fn update_access_token(&mut self, token: &str) {
        if token.is_empty() {
            return;
        }
        self.access_token = Some(token.to_string());
        if !self.access_history.iter().any(|t| t == token) {
            self.access_history.push(token.to_string());
        }
    }

    /// Make `token` current and remember it; empty tokens are ignored
    pub fn update_refresh_token(&mut self, token: &str) {
        if token.is_empty() {
            return;
        }
        self.refresh_token = Some(token.to_string());
        if !self.refresh_history.iter().any(|t| t == token) {
            self.refresh_history.push(token.to_string());
        }
    }

    pub fn update_credentials(&mut self, username: &str, password: &str) {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
    }

    pub fn apply_tokens(&mut self, tokens: &Tokens) {
        if let Some(token) = &tokens.access {
            self.update_access_token(token);
        }
        if let Some(token) = &tokens.refresh {
            self.update_refresh_token(token);
        }
    }
}

/// Tokens found in a login or refresh response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

/// Read `access_token`/`refresh_token`, top-level or under a `data` wrapper
pub fn extract_tokens(body: &Value) -> Tokens {
    let source = match body.get("data") {
        Some(data @ Value::Object(_)) => data,
        _ => body,
    };
    let token = |key: &str| {
        source
            .get(key)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    };
    Tokens {
        access: token("access_token"),
        refresh: token("refresh_token"),
    }
}

/// Auth lifecycle role of a test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    TokenRefresh,
    PasswordChange { new_password: String },
    Ordinary,
}

/// Classify a test by method and endpoint
pub fn classify(test: &TestCase) -> AuthAction {
    if !test.method.carries_body() {
        return AuthAction::Ordinary;
    }

    if test.endpoint.contains(LOGIN_ENDPOINT) {
        return AuthAction::Login;
    }
    if test.endpoint.contains(REFRESH_ENDPOINT) {
        return AuthAction::TokenRefresh;
    }
    if test.endpoint.contains(PROFILE_ENDPOINT) {
        let has_old = test
            .body
            .as_ref()
            .is_some_and(|body| body.get("old_password").is_some());
        if let (true, Some(new_password)) = (has_old, test.body_str("password")) {
            return AuthAction::PasswordChange {
                new_password: new_password.to_string(),
            };
        }
    }

    AuthAction::Ordinary
}

/// Why a login attempt did not produce tokens
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("login rejected with status {status}: {body}")]
    Rejected { status: String, body: String },

    #[error("login response carried no access token")]
    MissingToken,
}

/// Request that logs in with the given credentials
pub fn login_request(username: &str, password: &str) -> TestCase {
    TestCase::new(Method::Post, LOGIN_ENDPOINT)
        .with_header("Content-Type", "application/json")
        .with_body(json!({ "username": username, "password": password }))
}

/// `POST {prefix}/auth:login` and return the issued tokens
pub async fn login(
    executor: &dyn HttpExecutor,
    base_url: &str,
    prefix: &str,
    username: &str,
    password: &str,
    timeout: Duration,
) -> Result<Tokens, LoginError> {
    let request = login_request(username, password);
    let outcome = executor.execute(base_url, prefix, &request, timeout).await;

    let tokens = match outcome.success_body() {
        Some(body) => extract_tokens(body),
        None => {
            return Err(LoginError::Rejected {
                status: outcome.status.clone(),
                body: outcome.body.clone(),
            })
        }
    };
    if tokens.access.is_none() {
        return Err(LoginError::MissingToken);
    }
    Ok(tokens)
}
