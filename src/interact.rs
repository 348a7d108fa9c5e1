//! Human interaction provider for cascade.
//!
//! The approval loop and the session driver never touch stdin directly;
//! they consume the [`Interaction`] trait. Two implementations exist:
//!
//! - [`ConsoleInteraction`]: prompts the operator on the terminal and
//!   round-trips prompt edits through `$VISUAL`/`$EDITOR`.
//! - [`UnattendedInteraction`]: resolves every decision point to its
//!   default, for `--no-interaction` runs.
//!
//! Keeping both behind one trait guarantees interactive and unattended runs
//! drive the identical state machine; only the decision source differs.

use crate::error::{CascadeError, Result};
use std::collections::HashMap;
use std::io::{self, Write};
use std::process::Command;

/// Consecutive failure-prompt re-runs an unattended session will attempt
/// before skipping the document, so a persistently failing service cannot
/// livelock a run with nobody watching.
pub const UNATTENDED_FAILURE_RERUNS: u32 = 3;

/// An operator decision at an approval point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Proceed with generation.
    Yes,
    /// Run generation again.
    ReRun,
    /// Edit the working prompt text first.
    Modify,
    /// Skip this document.
    Skip,
    /// Stop the whole session.
    Stop,
}

impl Decision {
    /// Menu label shown to the operator.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Yes => "Yes - Proceed",
            Decision::ReRun => "Re-run",
            Decision::Modify => "Modify prompt and run",
            Decision::Skip => "Skip",
            Decision::Stop => "Stop session",
        }
    }
}

/// Decision source and value collector for the approval loop.
pub trait Interaction {
    /// Choose one of `options`; `default` applies on an empty answer.
    fn decide(&mut self, prompt: &str, options: &[Decision], default: Decision)
    -> Result<Decision>;

    /// Yes/no confirmation.
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;

    /// Free-form single-line input.
    fn line(&mut self, prompt: &str) -> Result<String>;

    /// Collect one value per placeholder key, in the given order.
    fn collect_values(&mut self, keys: &[String]) -> Result<HashMap<String, String>>;

    /// Whether this source can author an edit. When it cannot, a `Modify`
    /// decision downgrades to proceeding with the unmodified text.
    fn can_edit(&self) -> bool;

    /// Edit `initial` and return the new text, or `None` when the edit was
    /// abandoned (text unchanged or editor unavailable).
    fn edit(&mut self, initial: &str) -> Result<Option<String>>;
}

/// Parse an operator answer against a decision menu.
///
/// Accepts an option number (1-based), an exact or prefix label match
/// (case-insensitive), or the empty string for the default.
fn parse_decision(input: &str, options: &[Decision], default: Decision) -> Option<Decision> {
    let input = input.trim();
    if input.is_empty() {
        return Some(default);
    }
    if let Ok(number) = input.parse::<usize>() {
        return options.get(number.checked_sub(1)?).copied();
    }
    let lowered = input.to_lowercase();
    options
        .iter()
        .find(|option| option.label().to_lowercase().starts_with(&lowered))
        .copied()
}

/// Parse a yes/no answer; empty input takes the default.
fn parse_confirm(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

fn read_stdin_line() -> Result<String> {
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(|e| CascadeError::UserError(format!("failed to read input: {}", e)))?;
    Ok(line.trim().to_string())
}

/// Terminal-backed interaction provider.
#[derive(Debug, Default)]
pub struct ConsoleInteraction;

impl ConsoleInteraction {
    pub fn new() -> Self {
        Self
    }
}

impl Interaction for ConsoleInteraction {
    fn decide(
        &mut self,
        prompt: &str,
        options: &[Decision],
        default: Decision,
    ) -> Result<Decision> {
        loop {
            println!("{}", prompt);
            for (i, option) in options.iter().enumerate() {
                let marker = if *option == default { " (default)" } else { "" };
                println!("  {}. {}{}", i + 1, option.label(), marker);
            }
            print!("> ");
            io::stdout().flush().ok();

            let answer = read_stdin_line()?;
            match parse_decision(&answer, options, default) {
                Some(decision) => return Ok(decision),
                None => println!("Unrecognized choice '{}'.", answer),
            }
        }
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            print!("{} {} ", prompt, hint);
            io::stdout().flush().ok();

            let answer = read_stdin_line()?;
            match parse_confirm(&answer, default) {
                Some(value) => return Ok(value),
                None => println!("Please answer 'y' or 'n'."),
            }
        }
    }

    fn line(&mut self, prompt: &str) -> Result<String> {
        print!("{} ", prompt);
        io::stdout().flush().ok();
        read_stdin_line()
    }

    fn collect_values(&mut self, keys: &[String]) -> Result<HashMap<String, String>> {
        let mut answers = HashMap::new();
        for key in keys {
            let value = self.line(&format!("Value for variable {}:", key))?;
            answers.insert(key.clone(), value);
        }
        Ok(answers)
    }

    fn can_edit(&self) -> bool {
        true
    }

    fn edit(&mut self, initial: &str) -> Result<Option<String>> {
        let Some(editor) = std::env::var("VISUAL")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| std::env::var("EDITOR").ok().filter(|v| !v.is_empty()))
        else {
            eprintln!("No $VISUAL or $EDITOR set; keeping the prompt unchanged.");
            return Ok(None);
        };

        let mut argv = shell_words::split(&editor).map_err(|e| {
            CascadeError::UserError(format!("failed to parse editor command '{}': {}", editor, e))
        })?;
        if argv.is_empty() {
            return Ok(None);
        }

        let file = tempfile::Builder::new()
            .prefix("cascade-prompt-")
            .suffix(".md")
            .tempfile()
            .map_err(|e| {
                CascadeError::UserError(format!("failed to create edit buffer: {}", e))
            })?;
        std::fs::write(file.path(), initial).map_err(|e| {
            CascadeError::UserError(format!("failed to write edit buffer: {}", e))
        })?;

        let program = argv.remove(0);
        let status = Command::new(&program)
            .args(&argv)
            .arg(file.path())
            .status()
            .map_err(|e| {
                CascadeError::UserError(format!("failed to launch editor '{}': {}", program, e))
            })?;
        if !status.success() {
            eprintln!("Editor exited with {}; keeping the prompt unchanged.", status);
            return Ok(None);
        }

        let edited = std::fs::read_to_string(file.path()).map_err(|e| {
            CascadeError::UserError(format!("failed to read edit buffer: {}", e))
        })?;

        // Closing the editor without a change is a no-op.
        if edited == initial {
            Ok(None)
        } else {
            Ok(Some(edited))
        }
    }
}

/// Default-resolving interaction provider for `--no-interaction` runs.
#[derive(Debug)]
pub struct UnattendedInteraction {
    failure_reruns_left: u32,
}

impl UnattendedInteraction {
    pub fn new() -> Self {
        Self {
            failure_reruns_left: UNATTENDED_FAILURE_RERUNS,
        }
    }
}

impl Default for UnattendedInteraction {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction for UnattendedInteraction {
    fn decide(
        &mut self,
        prompt: &str,
        options: &[Decision],
        default: Decision,
    ) -> Result<Decision> {
        // A Re-run default on a menu without Yes is the failure prompt.
        // Retrying forever with nobody watching would livelock, so the
        // re-run budget eventually converts the default into Skip.
        if default == Decision::ReRun && !options.contains(&Decision::Yes) {
            if self.failure_reruns_left == 0 {
                println!("[Unattended] {} - retries exhausted, skipping", prompt);
                return Ok(Decision::Skip);
            }
            self.failure_reruns_left -= 1;
        }
        println!(
            "[Unattended] {} - proceeding with: {}",
            prompt,
            default.label()
        );
        Ok(default)
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        println!(
            "[Unattended] {} - auto-answering {}",
            prompt,
            if default { "yes" } else { "no" }
        );
        Ok(default)
    }

    fn line(&mut self, prompt: &str) -> Result<String> {
        println!("[Unattended] {} - using empty answer", prompt);
        Ok(String::new())
    }

    fn collect_values(&mut self, keys: &[String]) -> Result<HashMap<String, String>> {
        let mut answers = HashMap::new();
        for key in keys {
            println!("[Unattended] Value for variable {}: (empty)", key);
            answers.insert(key.clone(), String::new());
        }
        Ok(answers)
    }

    fn can_edit(&self) -> bool {
        false
    }

    fn edit(&mut self, _initial: &str) -> Result<Option<String>> {
        Ok(None)
    }
}
