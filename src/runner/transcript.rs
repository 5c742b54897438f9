//! Markdown transcripts
//!
//! Each named test becomes one entry: optional heading, details and notes, the
//! curl command that reproduces it, and the response. Commands are rendered
//! from the test as declared, so record and cursor placeholders appear as
//! written. Live tokens and the server URL are then scrubbed from commands and
//! responses so the transcript is safe to publish.

use std::path::Path;

use crate::common::{Error, Result};

use super::auth::AuthState;
use super::placeholders::{ACCESS_TOKEN, REFRESH_TOKEN};

/// Replaces environment-specific and secret values with documentation values
#[derive(Debug, Clone)]
pub struct Sanitizer<'a> {
    server_url: &'a str,
    doc_url: &'a str,
    access_tokens: &'a [String],
    refresh_tokens: &'a [String],
}

impl<'a> Sanitizer<'a> {
    pub fn new(server_url: &'a str, doc_url: &'a str, auth: &'a AuthState) -> Self {
        Self {
            server_url,
            doc_url,
            access_tokens: auth.access_history(),
            refresh_tokens: auth.refresh_history(),
        }
    }

    /// Server URL and every token seen this run
    pub fn scrub(&self, text: &str) -> String {
        let mut out = if self.server_url.is_empty() {
            text.to_string()
        } else {
            text.replace(self.server_url, self.doc_url)
        };
        for token in self.access_tokens {
            out = out.replace(token.as_str(), ACCESS_TOKEN);
        }
        for token in self.refresh_tokens {
            out = out.replace(token.as_str(), REFRESH_TOKEN);
        }
        out
    }
}

/// One named test in the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub heading: Option<String>,
    pub details: Option<String>,
    pub notes: Option<String>,
    pub command: String,
    pub status: String,
    pub body: String,
}

impl TranscriptEntry {
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(6);
        if let Some(heading) = &self.heading {
            lines.push(format!("### {heading}\n"));
        }
        if let Some(details) = &self.details {
            lines.push(format!("{details}\n"));
        }
        if let Some(notes) = &self.notes {
            lines.push(format!("{notes}\n"));
        }
        lines.push(format!("```bash\n{}\n```", self.command));
        lines.push(format!("\n**Response ({}):**\n", self.status));
        lines.push(format!("```json\n{}\n```\n", self.body));
        lines.join("\n")
    }
}

/// Render all entries in order
pub fn render_markdown(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .map(TranscriptEntry::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write a transcript, creating the output directory if needed
pub fn write_markdown(path: &Path, markdown: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| Error::output_write(path, e))?;
    }
    std::fs::write(path, markdown).map_err(|e| Error::output_write(path, e))
}
