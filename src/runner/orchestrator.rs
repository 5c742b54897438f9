//! Suite execution loop
//!
//! Runs every test of a suite in order, one request at a time. Each step may
//! depend on values captured by earlier steps, so nothing runs concurrently
//! and no failure stops the loop.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

use crate::common::config::Config;
use crate::common::Result;
use crate::http::{curl, HttpExecutor, HttpOutcome};
use crate::suite::{Method, TestCase, TestSuite};

use super::auth::{self, AuthAction, AuthState};
use super::capture::{self, extract_record_ids};
use super::placeholders::{self, collection_name, PlaceholderContext};
use super::transcript::{self, Sanitizer, TranscriptEntry};

/// Timeouts and limits for one suite run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub request_timeout: Duration,
    pub login_timeout: Duration,
    pub list_timeout: Duration,
    pub max_ids: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_timeout: config.timeouts.request(),
            login_timeout: config.timeouts.login(),
            list_timeout: config.timeouts.list(),
            max_ids: config.capture.max_ids,
        }
    }
}

/// Overall result of a suite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every named test got a 2xx response
    Success,
    /// At least one named test did not
    Failure,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Success => write!(f, "success"),
            Verdict::Failure => write!(f, "failure"),
        }
    }
}

/// Result of running a suite
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub verdict: Verdict,
    pub entries: Vec<TranscriptEntry>,
    pub markdown: String,
    pub output_file: Option<PathBuf>,
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Success
    }
}

/// Drives suites through an [`HttpExecutor`]
pub struct Orchestrator<'a> {
    executor: &'a dyn HttpExecutor,
    settings: RunSettings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(executor: &'a dyn HttpExecutor, settings: RunSettings) -> Self {
        Self { executor, settings }
    }

    /// Log in with the given credentials and return the resulting state
    pub async fn login(
        &self,
        suite: &TestSuite,
        username: &str,
        password: &str,
    ) -> std::result::Result<AuthState, auth::LoginError> {
        let tokens = auth::login(
            self.executor,
            &suite.server_url,
            &suite.prefix,
            username,
            password,
            self.settings.login_timeout,
        )
        .await?;

        let mut state = AuthState::with_credentials(username, password);
        state.apply_tokens(&tokens);
        Ok(state)
    }

    /// Run every test of `suite` in order
    ///
    /// The transcript is written to `output` when given. Only writing the
    /// transcript can fail; request failures are part of the outcome.
    pub async fn run_suite(
        &self,
        suite: &TestSuite,
        mut auth: AuthState,
        output: Option<&Path>,
    ) -> Result<RunOutcome> {
        let mut context = PlaceholderContext::new();
        let mut entries = Vec::new();
        let mut verdict = Verdict::Success;

        for (index, test) in suite.tests.iter().enumerate() {
            let label = test.title().unwrap_or("(setup)");
            let (resolved, outcome) = self.run_test(suite, test, &mut auth, &mut context).await;

            tracing::info!(
                step = index + 1,
                test = %label,
                method = %resolved.method,
                endpoint = %resolved.endpoint,
                status = %outcome.status,
                "Executed test"
            );

            let Some(title) = test.title() else {
                continue;
            };

            if !outcome.is_success() {
                verdict = Verdict::Failure;
            }

            let sanitizer = Sanitizer::new(&suite.server_url, &suite.doc_url, &auth);
            let command = curl::render(&suite.server_url, &suite.prefix, test);
            entries.push(TranscriptEntry {
                heading: Some(title.to_string()),
                details: test.details.clone(),
                notes: test.notes.clone(),
                command: sanitizer.scrub(&command),
                status: outcome.status.clone(),
                body: sanitizer.scrub(&outcome.body),
            });
        }

        let markdown = transcript::render_markdown(&entries);
        if let Some(path) = output {
            transcript::write_markdown(path, &markdown)?;
        }

        Ok(RunOutcome {
            verdict,
            entries,
            markdown,
            output_file: output.map(Path::to_path_buf),
        })
    }

    /// Resolve, execute and post-process a single test
    async fn run_test(
        &self,
        suite: &TestSuite,
        test: &TestCase,
        auth: &mut AuthState,
        context: &mut PlaceholderContext,
    ) -> (TestCase, HttpOutcome) {
        let mut resolved = test.clone();
        placeholders::substitute_auth(&mut resolved, auth);

        let resolved = self.resolve_records(suite, resolved, context).await;
        let action = auth::classify(&resolved);

        let outcome = self
            .executor
            .execute(
                &suite.server_url,
                &suite.prefix,
                &resolved,
                self.settings.request_timeout,
            )
            .await;

        if outcome.is_success() {
            capture::forget_destroyed(&resolved.endpoint, context);
        }

        if let Some(body) = outcome.success_body() {
            apply_auth_effects(&action, &resolved, body, auth);
            capture::capture_response(&resolved.endpoint, body, context, self.settings.max_ids);
        }

        if let AuthAction::PasswordChange { new_password } = &action {
            if outcome.is_success() {
                self.relogin(suite, auth, new_password).await;
            }
        }

        (resolved, outcome)
    }

    /// Substitute record placeholders, fetching fresh identifiers when a test
    /// uses `$ULID<N>` and the stored list cannot serve it
    ///
    /// A stored list serves one test only. Its records may be gone afterwards,
    /// so the next `$ULID<N>` test fetches again.
    async fn resolve_records(
        &self,
        suite: &TestSuite,
        test: TestCase,
        context: &mut PlaceholderContext,
    ) -> TestCase {
        let collection = collection_name(&test.endpoint);
        let numbered = placeholders::max_numbered_index(&test);
        let needs_fresh =
            numbered.is_some_and(|max| !context.has_ids_for(collection.as_deref(), max));

        let resolution = match collection {
            Some(collection) if needs_fresh => {
                let ids = self.fetch_record_ids(suite, &collection, &test).await;
                tracing::debug!(collection = %collection, count = ids.len(), "Fetched fresh record ids");
                let scoped = context.scoped_with_ids(Some(collection), ids);
                placeholders::resolve(&test, &scoped)
            }
            _ => placeholders::resolve(&test, context),
        };

        if numbered.is_some() {
            context.clear_record_ids();
        }
        if let Some(kind) = resolution.kind {
            tracing::debug!(token = kind.token(), "Resolved placeholders");
            context.record_kind(kind);
        }
        resolution.test
    }

    /// `GET {prefix}/{collection}:list` with the test's own headers
    ///
    /// Any failure yields an empty list; the test then runs with its numbered
    /// placeholders unresolved.
    async fn fetch_record_ids(
        &self,
        suite: &TestSuite,
        collection: &str,
        test: &TestCase,
    ) -> Vec<String> {
        let request = TestCase::new(Method::Get, format!("/{collection}:list"))
            .with_headers(test.headers.clone());
        let outcome = self
            .executor
            .execute(
                &suite.server_url,
                &suite.prefix,
                &request,
                self.settings.list_timeout,
            )
            .await;

        match outcome.success_body() {
            Some(body) => extract_record_ids(body, self.settings.max_ids),
            None => {
                tracing::debug!(collection = %collection, status = %outcome.status, "Record id fetch failed");
                Vec::new()
            }
        }
    }

    /// Log in again after a successful password change
    ///
    /// On failure the stale tokens stay in place and later requests surface
    /// the problem through their own responses.
    async fn relogin(&self, suite: &TestSuite, auth: &mut AuthState, new_password: &str) {
        let Some(username) = auth.username().map(str::to_string) else {
            tracing::warn!("Password changed but no username is known; skipping re-login");
            return;
        };

        match self.login(suite, &username, new_password).await {
            Ok(fresh) => {
                auth.update_credentials(&username, new_password);
                if let Some(token) = fresh.access_token() {
                    auth.update_access_token(token);
                }
                if let Some(token) = fresh.refresh_token() {
                    auth.update_refresh_token(token);
                }
                tracing::info!(user = %username, "Re-logged in after password change");
            }
            Err(e) => {
                tracing::warn!(user = %username, error = %e, "Re-login after password change failed");
            }
        }
    }
}

/// Token and credential updates after a successful login or refresh
fn apply_auth_effects(action: &AuthAction, test: &TestCase, body: &Value, auth: &mut AuthState) {
    match action {
        AuthAction::Login => {
            auth.apply_tokens(&auth::extract_tokens(body));
            if let (Some(username), Some(password)) =
                (test.body_str("username"), test.body_str("password"))
            {
                auth.update_credentials(username, password);
            }
        }
        AuthAction::TokenRefresh => auth.apply_tokens(&auth::extract_tokens(body)),
        AuthAction::PasswordChange { .. } | AuthAction::Ordinary => {}
    }
}
