//! Cascade: sequential prompt-batch runner with human-in-the-loop approval.
//!
//! This is the main entry point for the `cascade` CLI. It parses arguments,
//! resolves the environment (API key, model, base URL), runs one session over
//! the prompt directory, and maps errors to exit codes.

mod cli;
pub mod approval;
pub mod document;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod generate;
pub mod interact;
pub mod repo;
pub mod session;
pub mod template;
pub mod transcript;

#[cfg(test)]
mod test_support;

use cli::Cli;
use error::{CascadeError, Result};
use generate::OpenAiClient;
use interact::{ConsoleInteraction, UnattendedInteraction};
use session::SessionOptions;
use std::process::ExitCode;
use std::time::Duration;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match run(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let api_key = std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            CascadeError::ConfigError(
                "OPENAI_API_KEY is not set; export it before running".to_string(),
            )
        })?;
    let base_url = std::env::var("OPENAI_BASE_URL")
        .ok()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| generate::DEFAULT_BASE_URL.to_string());
    let model = cli::resolve_model(cli.model);

    let base_dir = std::env::current_dir().map_err(|e| {
        CascadeError::UserError(format!("failed to resolve current directory: {}", e))
    })?;
    let prompts_dir = if cli.dir.is_absolute() {
        cli.dir
    } else {
        base_dir.join(&cli.dir)
    };

    let options = SessionOptions {
        prompts_dir,
        model,
        repo: cli.repo,
        unattended: cli.no_interaction,
        base_dir,
    };
    let generator = OpenAiClient::new(
        api_key,
        base_url,
        cli.timeout_secs.map(Duration::from_secs),
    );

    if options.unattended {
        let mut interaction = UnattendedInteraction::new();
        session::run_session(&options, &generator, &mut interaction)
    } else {
        let mut interaction = ConsoleInteraction::new();
        session::run_session(&options, &generator, &mut interaction)
    }
}
