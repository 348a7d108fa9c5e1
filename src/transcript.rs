//! Accumulated-context transcript for cascade.
//!
//! A session carries a single append-only text buffer: seeded once with the
//! repository description (or empty), then extended with one labeled section
//! per accepted prompt outcome. The buffer only ever grows; later prompts
//! receive the current snapshot through `{{context}}` injection.
//!
//! Each append is persisted atomically to `context/accumulated-context.md`,
//! so a crash mid-session leaves the last accepted state recoverable.

use crate::error::Result;
use crate::fs::atomic_write_file;
use std::path::PathBuf;

/// The growing transcript of accepted outputs.
#[derive(Debug)]
pub struct Transcript {
    buffer: String,
    path: PathBuf,
}

impl Transcript {
    /// Create an empty transcript persisting to `path` on every append.
    pub fn new(path: PathBuf) -> Self {
        Self {
            buffer: String::new(),
            path,
        }
    }

    /// Seed the transcript before the first prompt executes.
    ///
    /// Called exactly once per session; an absent repository description
    /// seeds the empty string.
    pub fn seed(&mut self, text: &str) {
        self.buffer = text.to_string();
    }

    /// Append one labeled section for an accepted outcome and persist.
    pub fn append(&mut self, label: &str, text: &str) -> Result<()> {
        self.buffer
            .push_str(&format!("\n\n## {}\n\n{}\n", label, text));
        atomic_write_file(&self.path, &self.buffer)
    }

    /// Current buffer, for `{{context}}` injection into the next prompt.
    pub fn snapshot(&self) -> &str {
        &self.buffer
    }
}
