//! api-check - declarative API test-suite runner
//!
//! Suites are ordered lists of HTTP requests whose endpoints and bodies may
//! reference values captured from earlier responses. Each run produces a
//! markdown transcript with live tokens, identifiers and server URLs replaced
//! by their placeholders.

pub mod cli;
pub mod commands;
pub mod common;
pub mod http;
pub mod runner;
pub mod suite;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use http::{HttpExecutor, HttpOutcome, ReqwestExecutor};
pub use runner::{AuthState, Orchestrator, RunOutcome, RunSettings, Verdict};
pub use suite::{Method, TestCase, TestSuite};
