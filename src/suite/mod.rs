//! Declarative test suites
//!
//! A suite is an ordered list of HTTP test cases plus the server and
//! credential settings they share. Suites are read from JSON or YAML files.

mod loader;
mod types;

pub use loader::{discover_suites, load_suite, parse_suite, SuiteFormat};
pub use types::*;
