//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Default directories
    #[serde(default)]
    pub defaults: Defaults,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Fallback login credentials for suites that omit them
    #[serde(default)]
    pub credentials: Credentials,

    /// Identifier capture settings
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Default directories
#[derive(Debug, Deserialize)]
pub struct Defaults {
    /// Directory transcripts are written to
    #[serde(default = "default_outdir")]
    pub outdir: PathBuf,

    /// Directory suite files are discovered in
    #[serde(default = "default_testdir")]
    pub testdir: PathBuf,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            outdir: default_outdir(),
            testdir: default_testdir(),
        }
    }
}

fn default_outdir() -> PathBuf {
    PathBuf::from("./out")
}
fn default_testdir() -> PathBuf {
    PathBuf::from("./tests")
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Timeout for each test request
    #[serde(default = "default_request")]
    pub request_secs: u64,

    /// Timeout for the suite health check
    #[serde(default = "default_health")]
    pub health_secs: u64,

    /// Timeout for logins, including the re-login after a password change
    #[serde(default = "default_login")]
    pub login_secs: u64,

    /// Timeout for the identifier fetch behind numbered placeholders
    #[serde(default = "default_list")]
    pub list_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: default_request(),
            health_secs: default_health(),
            login_secs: default_login(),
            list_secs: default_list(),
        }
    }
}

fn default_request() -> u64 {
    30
}
fn default_health() -> u64 {
    5
}
fn default_login() -> u64 {
    10
}
fn default_list() -> u64 {
    10
}

impl Timeouts {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn health(&self) -> Duration {
        Duration::from_secs(self.health_secs)
    }

    pub fn login(&self) -> Duration {
        Duration::from_secs(self.login_secs)
    }

    pub fn list(&self) -> Duration {
        Duration::from_secs(self.list_secs)
    }
}

/// Login credentials
#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}

fn default_username() -> String {
    "admin".to_string()
}
fn default_password() -> String {
    "moonadmin12#".to_string()
}

/// Identifier capture settings
#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    /// Maximum identifiers fetched for `$ULID<N>` placeholders
    #[serde(default = "default_max_ids")]
    pub max_ids: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_ids: default_max_ids(),
        }
    }
}

fn default_max_ids() -> usize {
    10
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the platform config file is
    /// used when present, otherwise defaults are returned.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Some(path) = config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}
