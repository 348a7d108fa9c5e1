//! Session driver for cascade.
//!
//! Iterates the discovered prompt documents strictly in sorted order, renders
//! each one against the accumulated context, runs the approval state machine
//! to a terminal outcome, persists artifacts, and writes the final summary.
//!
//! Per-run filesystem layout under `{base_dir}/output/session-<timestamp>/`:
//!
//! ```text
//! results/<basename>.result.md      one per reached document
//! context/repository-context.md     seed (when a repository was resolved)
//! context/accumulated-context.md    rewritten after every acceptance
//! summary/session-summary.md        written once at end
//! events.ndjson                     append-only event log
//! ```
//!
//! Processing is single-threaded and strictly sequential: each document's
//! rendering depends on the context produced by all previously accepted
//! documents, so there is nothing to parallelize.

use crate::approval::{self, Outcome, PromptExchange};
use crate::document::{self, PromptDocument};
use crate::error::{CascadeError, Result};
use crate::events::{EventAction, EventLog};
use crate::fs::atomic_write_file;
use crate::generate::Generator;
use crate::interact::Interaction;
use crate::repo;
use crate::template;
use crate::transcript::Transcript;
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};


/// Options resolved from the CLI and environment.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Directory containing prompt documents.
    pub prompts_dir: PathBuf,
    /// Model identifier passed to the generation service.
    pub model: String,
    /// Repository path or URL, if given on the command line.
    pub repo: Option<String>,
    /// Resolve every decision point to its default.
    pub unattended: bool,
    /// Directory the session output tree is created under.
    pub base_dir: PathBuf,
}

/// Resolved output paths for one session.
#[derive(Debug, Clone)]
pub struct SessionLayout {
    pub root: PathBuf,
    pub results_dir: PathBuf,
    pub context_dir: PathBuf,
    pub summary_dir: PathBuf,
}

impl SessionLayout {
    /// Create the session directory tree keyed by the current timestamp.
    pub fn create(base_dir: &Path) -> Result<Self> {
        let stamp = Utc::now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        Self::create_at(base_dir, &stamp)
    }

    /// Create the session directory tree with an explicit timestamp key.
    pub fn create_at(base_dir: &Path, stamp: &str) -> Result<Self> {
        let root = base_dir.join("output").join(format!("session-{}", stamp));
        let layout = Self {
            results_dir: root.join("results"),
            context_dir: root.join("context"),
            summary_dir: root.join("summary"),
            root,
        };
        for dir in [&layout.results_dir, &layout.context_dir, &layout.summary_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                CascadeError::UserError(format!(
                    "failed to create session directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }
        Ok(layout)
    }

    fn result_path(&self, basename: &str) -> PathBuf {
        self.results_dir.join(format!("{}.result.md", basename))
    }
}

/// One reached document in the session result.
#[derive(Debug, Clone)]
struct SessionRecord {
    name: String,
    artifact: PathBuf,
    outcome: &'static str,
}

/// Run a full session: discovery, plan approval, per-document execution,
/// summary emission.
pub fn run_session<G, I>(
    options: &SessionOptions,
    generator: &G,
    interaction: &mut I,
) -> Result<()>
where
    G: Generator + ?Sized,
    I: Interaction + ?Sized,
{
    let files = document::find_prompt_files(&options.prompts_dir)?;
    if files.is_empty() {
        return Err(CascadeError::ConfigError(format!(
            "no .md prompt files found in {}",
            options.prompts_dir.display()
        )));
    }

    let layout = SessionLayout::create(&options.base_dir)?;
    let events = EventLog::new(layout.root.join("events.ndjson"));
    events.append(
        EventAction::SessionStart,
        None,
        json!({
            "documents": files.len(),
            "model": options.model,
            "unattended": options.unattended,
        }),
    )?;

    // Resolve the subject repository before anything executes; the seed is
    // written once and never rewritten.
    let repo = repo::obtain(
        options.repo.as_deref(),
        interaction,
        &options.base_dir,
        options.unattended,
    )?;
    let mut transcript = Transcript::new(layout.context_dir.join("accumulated-context.md"));
    if let Some(repo) = &repo {
        atomic_write_file(
            layout.context_dir.join("repository-context.md"),
            &repo.description,
        )?;
        transcript.seed(&repo.description);
    }

    println!();
    println!("Prompt execution plan");
    if options.unattended {
        println!("[UNATTENDED MODE] all prompts execute without human review");
    }
    println!("Prompt directory: {}", options.prompts_dir.display());
    println!("Total prompts:    {}", files.len());
    if let Some(repo) = &repo {
        println!("Repository:       {}", repo.root.display());
    }
    for (i, file) in files.iter().enumerate() {
        println!("  {}. {}", i + 1, file.name);
    }

    if !interaction.confirm("Proceed with this sequence?", true)? {
        println!("Sequence cancelled by user.");
        events.append(EventAction::SessionEnd, None, json!({"cancelled": true}))?;
        return Ok(());
    }
    events.append(EventAction::PlanApproved, None, serde_json::Value::Null)?;

    let mut records: Vec<SessionRecord> = Vec::new();
    let mut accepted = 0usize;
    let mut stopped = false;

    for file in &files {
        let doc = PromptDocument::load(&file.path)?;

        // Value collection scans the document's own text; injection and
        // substitution then produce the working copy the machine runs on.
        let placeholders = template::collection_placeholders(&doc.body);
        let keys: Vec<String> = placeholders.iter().map(|p| p.key().to_string()).collect();
        let answers = if keys.is_empty() {
            HashMap::new()
        } else {
            interaction.collect_values(&keys)?
        };
        let mut working = template::inject_context(&doc.body, transcript.snapshot());
        working = template::apply_answers(&working, &placeholders, &answers);

        let system = doc.frontmatter.identity.system_message();
        let preamble = doc.frontmatter.identity.preamble();

        println!();
        println!("Prompt: {}", doc.name);
        if !preamble.is_empty() {
            println!("Identity applied: {}", preamble);
        }
        println!("---------------------------------");

        let exchange = PromptExchange {
            document: &doc.name,
            system: &system,
            repo_context: repo.as_ref().map(|r| r.description.as_str()),
            model: &options.model,
        };
        let outcome =
            approval::run_to_outcome(&exchange, &mut working, generator, interaction, &events)?;

        let artifact = layout.result_path(doc.basename());
        match &outcome {
            Outcome::Accepted(text) => {
                atomic_write_file(&artifact, text)?;
                transcript.append(&doc.name, text)?;
                accepted += 1;
            }
            Outcome::Skipped => {
                println!("Prompt skipped.");
                atomic_write_file(&artifact, "[Skipped]")?;
            }
            Outcome::SkippedAfterReview => {
                println!("Prompt skipped after review.");
                atomic_write_file(&artifact, "[Skipped after review]")?;
            }
            Outcome::SkippedAfterError => {
                println!("Prompt skipped due to error.");
                atomic_write_file(&artifact, "[Skipped due to error]")?;
            }
            Outcome::Stopped => {
                atomic_write_file(&artifact, "[Stopped]")?;
            }
        }
        events.append(
            EventAction::Outcome,
            Some(&doc.name),
            json!({
                "outcome": outcome.label(),
                "artifact": artifact.display().to_string(),
            }),
        )?;
        records.push(SessionRecord {
            name: doc.name.clone(),
            artifact,
            outcome: outcome.label(),
        });

        if matches!(outcome, Outcome::Stopped) {
            println!("Session stopped by user.");
            stopped = true;
            break;
        }
    }

    write_summary(&layout, options, files.len(), accepted, stopped, &records)?;
    events.append(
        EventAction::SessionEnd,
        None,
        json!({
            "reached": records.len(),
            "accepted": accepted,
            "stopped": stopped,
        }),
    )?;

    println!();
    println!("All done. Outputs saved under: {}", layout.root.display());
    Ok(())
}

fn write_summary(
    layout: &SessionLayout,
    options: &SessionOptions,
    discovered: usize,
    accepted: usize,
    stopped: bool,
    records: &[SessionRecord],
) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# Prompt Session Summary".to_string());
    lines.push(String::new());
    lines.push("## Execution".to_string());
    lines.push(format!("- Total prompts discovered: {}", discovered));
    lines.push(format!("- Completed (accepted): {}", accepted));
    if stopped {
        lines.push("- Session stopped before the end of the sequence".to_string());
    }
    lines.push(String::new());
    lines.push("## Output Artifacts".to_string());
    for (i, record) in records.iter().enumerate() {
        let shown = record
            .artifact
            .strip_prefix(&options.base_dir)
            .unwrap_or(&record.artifact);
        lines.push(format!(
            "{}. {} [{}]: {}",
            i + 1,
            record.name,
            record.outcome,
            shown.display()
        ));
    }

    atomic_write_file(
        layout.summary_dir.join("session-summary.md"),
        &format!("{}\n", lines.join("\n")),
    )
}
