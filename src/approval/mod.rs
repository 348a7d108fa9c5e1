//! Per-prompt approval state machine.
//!
//! Drives one prompt document to a terminal outcome:
//!
//! ```text
//! AwaitingDecision --Yes/Re-run--> Generating --ok--> AwaitingSatisfaction
//!        ^  ^                          |                     |
//!        |  +-----Editing <--Modify----+--failure------------+
//!        |                             |
//!        +--- (edit completed) --------+
//! ```
//!
//! `Skip` and `Stop` exit from any decision point. Retries are unbounded and
//! human-paced; there is no automatic backoff because every retry requires a
//! decision. The machine is parameterized by a decision source
//! ([`crate::interact::Interaction`]), so interactive and unattended runs
//! walk the identical transition table.
//!
//! Side effects are confined to the caller's handling of
//! [`Outcome::Accepted`]: the machine itself only talks to the generator,
//! the decision source, the console, and the event log.

use crate::error::Result;
use crate::events::{EventAction, EventLog};
use crate::generate::{CompletionRequest, Generator};
use crate::interact::{Decision, Interaction};
use serde_json::json;


/// Menu offered before the first generation attempt.
pub const EXECUTE_MENU: [Decision; 5] = [
    Decision::Yes,
    Decision::ReRun,
    Decision::Modify,
    Decision::Skip,
    Decision::Stop,
];

/// Menu offered after a failure or an unsatisfying result.
pub const RETRY_MENU: [Decision; 4] = [
    Decision::ReRun,
    Decision::Modify,
    Decision::Skip,
    Decision::Stop,
];

/// Terminal outcome of one prompt document. Recorded exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Output accepted; the caller persists it and appends it to the
    /// accumulated context.
    Accepted(String),
    /// Skipped before any accepted generation.
    Skipped,
    /// Skipped from the failure prompt.
    SkippedAfterError,
    /// Skipped after reviewing an unsatisfying result.
    SkippedAfterReview,
    /// Session stopped; no further documents run.
    Stopped,
}

impl Outcome {
    /// Stable identifier used in the event log and the summary.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Accepted(_) => "accepted",
            Outcome::Skipped => "skipped",
            Outcome::SkippedAfterError => "skipped_after_error",
            Outcome::SkippedAfterReview => "skipped_after_review",
            Outcome::Stopped => "stopped",
        }
    }
}

/// Fixed per-document request parts; the working text varies across edits.
#[derive(Debug, Clone)]
pub struct PromptExchange<'a> {
    /// Document display name, for logs.
    pub document: &'a str,
    /// System/identity message.
    pub system: &'a str,
    /// Repository context description, if the session has one.
    pub repo_context: Option<&'a str>,
    /// Model identifier.
    pub model: &'a str,
}

enum State {
    /// Waiting for the operator. `failure` carries the diagnostic when this
    /// state was re-entered after a failed generation attempt.
    AwaitingDecision { failure: Option<String> },
    /// Operator asked to edit the working text.
    Editing,
    /// Issuing one generation request.
    Generating,
    /// Result produced; waiting for accept/reject.
    AwaitingSatisfaction { output: String },
}

/// Run one prompt document to its terminal outcome.
///
/// `working` is the rendered prompt body; `Modify` decisions replace it
/// in-place, which is what lets `Re-run` reuse the edited text.
pub fn run_to_outcome<G, I>(
    exchange: &PromptExchange<'_>,
    working: &mut String,
    generator: &G,
    interaction: &mut I,
    events: &EventLog,
) -> Result<Outcome>
where
    G: Generator + ?Sized,
    I: Interaction + ?Sized,
{
    let mut state = State::AwaitingDecision { failure: None };
    loop {
        state = match state {
            State::AwaitingDecision { failure } => {
                let decision = match &failure {
                    Some(diagnostic) => interaction.decide(
                        &format!("Generation failed: {}. Choose next action:", diagnostic),
                        &RETRY_MENU,
                        Decision::ReRun,
                    )?,
                    None => {
                        interaction.decide("Execute this prompt?", &EXECUTE_MENU, Decision::Yes)?
                    }
                };
                match decision {
                    Decision::Stop => return Ok(Outcome::Stopped),
                    Decision::Skip if failure.is_some() => {
                        return Ok(Outcome::SkippedAfterError);
                    }
                    Decision::Skip => return Ok(Outcome::Skipped),
                    Decision::Modify if interaction.can_edit() => State::Editing,
                    // No editor available: downgrade Modify to proceeding
                    // with the unmodified text.
                    Decision::Modify => State::Generating,
                    Decision::Yes | Decision::ReRun => State::Generating,
                }
            }

            State::Editing => {
                if let Some(updated) = interaction.edit(working)? {
                    *working = updated;
                }
                // An abandoned edit is a no-op. Either way the operator
                // decides again; editing never auto-executes.
                State::AwaitingDecision { failure: None }
            }

            State::Generating => {
                events.append(
                    EventAction::Generate,
                    Some(exchange.document),
                    json!({"model": exchange.model}),
                )?;
                let request = CompletionRequest {
                    system: exchange.system,
                    repo_context: exchange.repo_context,
                    user: working,
                    model: exchange.model,
                };
                match generator.complete(&request) {
                    Ok(output) => State::AwaitingSatisfaction { output },
                    Err(failure) => {
                        eprintln!("Generation request failed: {}", failure);
                        events.append(
                            EventAction::GenerateFailed,
                            Some(exchange.document),
                            json!({"error": failure.to_string()}),
                        )?;
                        State::AwaitingDecision {
                            failure: Some(failure.to_string()),
                        }
                    }
                }
            }

            State::AwaitingSatisfaction { output } => {
                println!("\n--- Result ---\n");
                println!("{}", output);
                println!("\n--------------\n");

                if interaction.confirm("Satisfied with this result? Save and continue?", true)? {
                    return Ok(Outcome::Accepted(output));
                }
                match interaction.decide("Choose next action:", &RETRY_MENU, Decision::ReRun)? {
                    Decision::Yes | Decision::ReRun => State::Generating,
                    Decision::Modify if interaction.can_edit() => State::Editing,
                    // No editor to author a change: keep the result we have.
                    Decision::Modify => return Ok(Outcome::Accepted(output)),
                    Decision::Skip => return Ok(Outcome::SkippedAfterReview),
                    Decision::Stop => return Ok(Outcome::Stopped),
                }
            }
        };
    }
}
