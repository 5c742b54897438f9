//! Configuration and output paths

use std::path::{Path, PathBuf};

/// Application name used for platform directories
const APP_NAME: &str = "api-check";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/api-check/`
/// - macOS: `~/Library/Application Support/api-check/`
/// - Windows: `%APPDATA%\api-check\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Markdown transcript path for a suite file: `<outdir>/<file stem>.md`
pub fn transcript_path(outdir: &Path, suite_file: &Path) -> PathBuf {
    let stem = suite_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "suite".to_string());
    outdir.join(format!("{stem}.md"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_ends_with_file_name() {
        if let Some(path) = config_path() {
            assert!(path.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_transcript_path_uses_file_stem() {
        let path = transcript_path(Path::new("out"), Path::new("tests/010-users.json"));
        assert_eq!(path, PathBuf::from("out/010-users.md"));

        let path = transcript_path(Path::new("docs"), Path::new("suites/auth.yaml"));
        assert_eq!(path, PathBuf::from("docs/auth.md"));
    }
}
