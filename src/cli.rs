//! Command-line interface for cascade.

use crate::generate::DEFAULT_MODEL;
use clap::Parser;
use std::path::PathBuf;

/// Sequential prompt runner with human-in-the-loop approval.
#[derive(Parser, Debug)]
#[command(name = "cascade", version, about)]
pub struct Cli {
    /// Directory containing the prompt documents to execute.
    #[arg(long, default_value = "./prompts")]
    pub dir: PathBuf,

    /// Model identifier; falls back to $OPENAI_MODEL, then the built-in
    /// default.
    #[arg(long)]
    pub model: Option<String>,

    /// Subject repository: an existing local path or an http(s) URL to
    /// shallow-clone.
    #[arg(long)]
    pub repo: Option<String>,

    /// Run without pausing for human review; every decision takes its
    /// default.
    #[arg(long = "no-interaction", alias = "no-interrupt")]
    pub no_interaction: bool,

    /// Per-request timeout in seconds. No timeout when omitted.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Resolve the model: CLI flag wins, then `$OPENAI_MODEL`, then the
/// built-in default.
pub fn resolve_model(flag: Option<String>) -> String {
    flag.or_else(|| std::env::var("OPENAI_MODEL").ok().filter(|m| !m.is_empty()))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
}
