//! Prompt document model for cascade.
//!
//! A prompt document is a markdown file with an optional leading YAML
//! frontmatter block followed by a body. The frontmatter may carry an
//! `identity` mapping describing how the generation service should behave:
//!
//! ```text
//! ---
//! identity:
//!   role: senior technical writer
//!   tone: concise
//!   expertise:
//!     - authentication
//!     - API design
//! ---
//!
//! Summarize the login flow.
//! ```
//!
//! Files without a frontmatter block are all body with empty metadata.
//! Unknown frontmatter fields are preserved for forward compatibility.
//! Documents are immutable once loaded; interactive edits operate on an
//! in-memory working copy and never touch the file on disk.

use crate::error::{CascadeError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[cfg(test)]
mod tests;

/// System instruction used when a document carries no identity metadata.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are a helpful, precise documentation generator.";

/// Identity metadata projected into the generation system message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Identity {
    /// Role to act as (e.g. "security auditor").
    #[serde(default)]
    pub role: Option<String>,

    /// Persona description.
    #[serde(default)]
    pub persona: Option<String>,

    /// Writing tone.
    #[serde(default)]
    pub tone: Option<String>,

    /// Areas of expertise, joined with commas in the preamble.
    #[serde(default)]
    pub expertise: Vec<String>,

    /// Free-text context for the identity.
    #[serde(default)]
    pub context: Option<String>,

    /// Constraints, joined with semicolons in the preamble.
    #[serde(default)]
    pub constraints: Vec<String>,
}

impl Identity {
    /// Build the identity preamble: one independent clause per present field,
    /// joined with single spaces. Empty metadata yields an empty string.
    pub fn preamble(&self) -> String {
        let mut clauses = Vec::new();
        if let Some(role) = &self.role {
            clauses.push(format!("Act as {}.", role));
        }
        if let Some(persona) = &self.persona {
            clauses.push(format!("You are {}.", persona));
        }
        if let Some(tone) = &self.tone {
            clauses.push(format!("Use a {} tone.", tone));
        }
        if !self.expertise.is_empty() {
            clauses.push(format!(
                "You have expertise in: {}.",
                self.expertise.join(", ")
            ));
        }
        if let Some(context) = &self.context {
            clauses.push(format!("Context: {}.", context));
        }
        if !self.constraints.is_empty() {
            clauses.push(format!("Constraints: {}.", self.constraints.join("; ")));
        }
        clauses.join(" ")
    }

    /// System message for generation: the preamble, or the fixed default
    /// instruction when no metadata is present.
    pub fn system_message(&self) -> String {
        let preamble = self.preamble();
        if preamble.is_empty() {
            DEFAULT_SYSTEM_INSTRUCTION.to_string()
        } else {
            preamble
        }
    }
}

/// Parsed frontmatter of a prompt document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Frontmatter {
    /// Identity metadata, if any.
    #[serde(default)]
    pub identity: Identity,

    /// Any fields not explicitly defined above.
    /// Using BTreeMap for deterministic ordering.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// A prompt document loaded from disk.
#[derive(Debug, Clone)]
pub struct PromptDocument {
    /// Display name (the file name, e.g. `01-intro.md`).
    pub name: String,
    /// The parsed frontmatter.
    pub frontmatter: Frontmatter,
    /// The markdown body (everything after the closing `---`, or the whole
    /// file when there is no frontmatter).
    pub body: String,
}

impl PromptDocument {
    /// Parse a prompt document from its content string.
    ///
    /// Both Unix (LF) and Windows (CRLF) line endings are supported for the
    /// frontmatter delimiters; the body is preserved as-is.
    pub fn parse(name: &str, content: &str) -> Result<Self> {
        let Some((frontmatter_yaml, body)) = split_frontmatter(content) else {
            return Ok(Self {
                name: name.to_string(),
                frontmatter: Frontmatter::default(),
                body: content.to_string(),
            });
        };

        let frontmatter = if frontmatter_yaml.trim().is_empty() {
            Frontmatter::default()
        } else {
            serde_yaml::from_str(&frontmatter_yaml).map_err(|e| {
                CascadeError::UserError(format!(
                    "failed to parse frontmatter of '{}': {}",
                    name, e
                ))
            })?
        };

        Ok(Self {
            name: name.to_string(),
            frontmatter,
            body,
        })
    }

    /// Load a prompt document from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("prompt.md")
            .to_string();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CascadeError::UserError(format!(
                "failed to read prompt file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&name, &content)
    }

    /// Basename without the `.md` extension, used for artifact naming.
    pub fn basename(&self) -> &str {
        self.name
            .strip_suffix(".md")
            .or_else(|| self.name.strip_suffix(".MD"))
            .unwrap_or(&self.name)
    }
}

/// Split a content string into (frontmatter yaml, body) if it opens with a
/// `---` delimiter line. Returns None when there is no frontmatter block.
fn split_frontmatter(content: &str) -> Option<(String, String)> {
    let normalized = content.replace("\r\n", "\n");
    let rest = normalized.strip_prefix("---\n")?;

    // The closing delimiter is a line that is exactly `---` (possibly the
    // last line, possibly immediately after the opening one).
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line == "---\n" || line == "---" {
            let frontmatter_yaml = rest[..offset].to_string();
            let body = rest[offset + line.len()..]
                .trim_start_matches('\n')
                .to_string();
            return Some((frontmatter_yaml, body));
        }
        offset += line.len();
    }
    None
}

/// A discovered prompt file, not yet parsed.
#[derive(Debug, Clone)]
pub struct DocumentRef {
    /// Display name (file name).
    pub name: String,
    /// Full path to the file.
    pub path: PathBuf,
}

/// Discover prompt files in a directory: every file with a `.md` extension
/// (case-insensitive), sorted ascending by name with numeric-aware ordering,
/// so `2-detail.md` sorts before `10-wrapup.md`.
pub fn find_prompt_files(dir: &Path) -> Result<Vec<DocumentRef>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        CascadeError::ConfigError(format!(
            "prompts directory not found: {}: {}",
            dir.display(),
            e
        ))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            CascadeError::UserError(format!("failed to read directory entry: {}", e))
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.to_lowercase().ends_with(".md") {
            continue;
        }
        files.push(DocumentRef {
            name: name.to_string(),
            path: path.clone(),
        });
    }

    files.sort_by(|a, b| natural_cmp(&a.name, &b.name));
    Ok(files)
}

/// Numeric-aware, case-insensitive ordering: digit runs compare by value,
/// everything else byte-wise on the lowercased form.
pub fn natural_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let ai = i;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            let bj = j;
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            // Compare runs as numbers: strip leading zeros, then by length,
            // then lexically.
            let da: String = a[ai..i].iter().collect();
            let db: String = b[bj..j].iter().collect();
            let ta = da.trim_start_matches('0');
            let tb = db.trim_start_matches('0');
            let ord = ta
                .len()
                .cmp(&tb.len())
                .then_with(|| ta.cmp(tb))
                .then_with(|| da.len().cmp(&db.len()));
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            let ord = a[i].cmp(&b[j]);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}
