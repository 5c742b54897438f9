//! Common utilities shared across the runner

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

/// Whether a status line denotes success (`"2xx ..."`)
///
/// The transport reports `"ERROR"` on failure, which never matches.
pub fn is_success(status: &str) -> bool {
    status.starts_with('2')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        assert!(is_success("200 OK"));
        assert!(is_success("204 No Content"));
        assert!(!is_success("404 Not Found"));
        assert!(!is_success("ERROR"));
        assert!(!is_success(""));
    }
}
