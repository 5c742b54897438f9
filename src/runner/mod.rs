//! Suite execution
//!
//! Placeholder resolution, auth lifecycle tracking, response capture and
//! transcript generation, tied together by the [`Orchestrator`].

pub mod auth;
pub mod capture;
pub mod orchestrator;
pub mod placeholders;
pub mod transcript;

pub use auth::{AuthAction, AuthState, LoginError};
pub use orchestrator::{Orchestrator, RunOutcome, RunSettings, Verdict};
pub use placeholders::{PlaceholderContext, PlaceholderKind};
pub use transcript::{Sanitizer, TranscriptEntry};
