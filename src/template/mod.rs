//! Template engine for prompt documents.
//!
//! A prompt body can carry two disjoint placeholder syntaxes:
//!
//! - Bracket-reserved tokens from a fixed vocabulary: `[INSERT_*]` (upper-case
//!   alphanumeric/underscore suffix), `[INPUT_REQUIRED]`, `[INPUT_HERE]`.
//!   These are matched and replaced as literal text, so the same token may
//!   appear several times and every occurrence receives the same value.
//! - Brace free-form tokens `{name}` where `name` is alphanumeric/underscore.
//!
//! The reserved `{{context}}` token is not a placeholder: context injection
//! is a distinct substitution performed before user-variable substitution,
//! and value collection scans the document with that token blanked
//! ([`collection_placeholders`]), so a token that merely appears inside
//! injected context is never presented to the operator for a value.
//!
//! Substitution is idempotent: applying the same answers to an already
//! substituted body is a no-op, which is what lets "Re-run" reuse collected
//! answers instead of asking again.

use regex::{NoExpand, Regex};
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::LazyLock;


/// Reserved token replaced by the accumulated-context snapshot.
pub const CONTEXT_TOKEN: &str = "{{context}}";

static BRACKET_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?:INSERT_[A-Z0-9_]+|INPUT_REQUIRED|INPUT_HERE)\]")
        .expect("Invalid bracket token regex")
});

static BRACE_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("Invalid brace token regex"));

/// A placeholder detected in a prompt body.
///
/// The two variants follow distinct substitution rules (see [`apply_answers`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// Full bracket-reserved token including the brackets, e.g. `[INSERT_NAME]`.
    Bracket(String),
    /// Bare name of a brace token, e.g. `topic` for `{topic}`.
    Brace(String),
}

impl Placeholder {
    /// Key used both to prompt the operator and to look up the answer.
    ///
    /// Bracket placeholders keep their full `[TOKEN]` spelling (mirroring how
    /// they read in the document); brace placeholders use the bare name.
    pub fn key(&self) -> &str {
        match self {
            Placeholder::Bracket(token) => token,
            Placeholder::Brace(name) => name,
        }
    }
}

/// Replace every `{{context}}` occurrence with the accumulated-context
/// snapshot.
///
/// Must run before [`extract_placeholders`]: the injected text may itself
/// contain brace-shaped tokens, and those must not be re-prompted.
pub fn inject_context(body: &str, snapshot: &str) -> String {
    if body.contains(CONTEXT_TOKEN) {
        body.replace(CONTEXT_TOKEN, snapshot)
    } else {
        body.to_string()
    }
}

/// Placeholders the operator must supply values for.
///
/// Scans the document's own text with the `{{context}}` token blanked out,
/// so names that would only appear inside injected context are never
/// collected. Without the blanking, `{{context}}` itself would read as a
/// brace token named `context`.
pub fn collection_placeholders(body: &str) -> Vec<Placeholder> {
    extract_placeholders(&inject_context(body, ""))
}

/// Detect placeholders in a body, deduplicated, first-occurrence order.
///
/// Bracket-reserved tokens are listed before brace tokens, each family in
/// document order. This ordered list drives value collection: one input per
/// placeholder, in this order.
pub fn extract_placeholders(body: &str) -> Vec<Placeholder> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for m in BRACKET_TOKEN_REGEX.find_iter(body) {
        let placeholder = Placeholder::Bracket(m.as_str().to_string());
        if seen.insert(placeholder.clone()) {
            found.push(placeholder);
        }
    }
    for caps in BRACE_TOKEN_REGEX.captures_iter(body) {
        let placeholder = Placeholder::Brace(caps[1].to_string());
        if seen.insert(placeholder.clone()) {
            found.push(placeholder);
        }
    }

    found
}

/// Substitute collected values into a body.
///
/// Bracket tokens are replaced by exact literal match (the token text is
/// regex-escaped and replaced globally); brace tokens are replaced by the
/// literal `{name}` form, also globally. Placeholders with no collected
/// answer are left untouched so an incomplete substitution stays visible.
pub fn apply_answers(
    body: &str,
    placeholders: &[Placeholder],
    answers: &HashMap<String, String>,
) -> String {
    let mut out = body.to_string();
    for placeholder in placeholders {
        let Some(value) = answers.get(placeholder.key()) else {
            continue;
        };
        let literal = match placeholder {
            Placeholder::Bracket(token) => token.clone(),
            Placeholder::Brace(name) => format!("{{{}}}", name),
        };
        // NoExpand keeps `$` in operator-supplied values literal.
        let pattern = Regex::new(&regex::escape(&literal)).expect("escaped literal is valid");
        out = pattern.replace_all(&out, NoExpand(value)).into_owned();
    }
    out
}
