//! Suite file loading and discovery

use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

use super::types::TestSuite;

/// On-disk suite formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteFormat {
    Json,
    Yaml,
}

impl SuiteFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(SuiteFormat::Json),
            "yaml" | "yml" => Some(SuiteFormat::Yaml),
            _ => None,
        }
    }
}

/// Load a suite file
pub fn load_suite(path: &Path) -> Result<TestSuite> {
    let format = SuiteFormat::from_path(path)
        .ok_or_else(|| Error::UnsupportedSuiteFormat(path.display().to_string()))?;

    let content = std::fs::read_to_string(path).map_err(|e| Error::suite_read(path, e))?;

    parse_suite(&content, format).map_err(|e| Error::suite_parse(path, e))
}

/// Parse suite text in the given format
pub fn parse_suite(content: &str, format: SuiteFormat) -> Result<TestSuite> {
    let suite = match format {
        SuiteFormat::Json => serde_json::from_str(content)?,
        SuiteFormat::Yaml => serde_yaml::from_str(content)?,
    };
    Ok(suite)
}

/// Find suite files in a directory, sorted by path for a deterministic run order
pub fn discover_suites(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        Error::Config(format!(
            "Failed to read test directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && SuiteFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(Error::NoSuites(dir.display().to_string()));
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::Method;

    #[test]
    fn test_format_detection() {
        assert_eq!(SuiteFormat::from_path(Path::new("a.json")), Some(SuiteFormat::Json));
        assert_eq!(SuiteFormat::from_path(Path::new("a.YML")), Some(SuiteFormat::Yaml));
        assert_eq!(SuiteFormat::from_path(Path::new("a.yaml")), Some(SuiteFormat::Yaml));
        assert_eq!(SuiteFormat::from_path(Path::new("a.md")), None);
        assert_eq!(SuiteFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_parse_yaml_suite() {
        let suite = parse_suite(
            r#"
docURL: https://api.example.com
serverURL: http://localhost:6006
prefix: /api
tests:
  - name: Create product
    cmd: POST
    endpoint: /products:create
    headers:
      Authorization: Bearer $ACCESS_TOKEN
    data:
      data:
        - title: Widget
          tags: [a, b]
  - cmd: POST
    endpoint: /products:destroy
    data:
      data:
        - $ULID
"#,
            SuiteFormat::Yaml,
        )
        .unwrap();

        assert_eq!(suite.prefix, "/api");
        assert_eq!(suite.tests.len(), 2);
        assert_eq!(suite.tests[0].title(), Some("Create product"));
        assert_eq!(suite.tests[1].method, Method::Post);
        assert_eq!(
            suite.tests[0].body.as_ref().unwrap()["data"][0]["tags"][1],
            "b"
        );
    }

    #[test]
    fn test_load_and_discover() {
        let dir = tempfile::tempdir().unwrap();
        let suite = r#"{"docURL": "d", "serverURL": "s", "tests": []}"#;
        std::fs::write(dir.path().join("020-b.json"), suite).unwrap();
        std::fs::write(dir.path().join("010-a.yml"), "docURL: d\nserverURL: s\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = discover_suites(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["010-a.yml", "020-b.json"]);

        let loaded = load_suite(&files[1]).unwrap();
        assert_eq!(loaded.server_url, "s");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_suites(dir.path()),
            Err(Error::NoSuites(_))
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(load_suite(&bad), Err(Error::SuiteParse { .. })));

        assert!(matches!(
            load_suite(&dir.path().join("suite.txt")),
            Err(Error::UnsupportedSuiteFormat(_))
        ));
        assert!(matches!(
            load_suite(&dir.path().join("missing.json")),
            Err(Error::SuiteRead { .. })
        ));
    }
}
