//! Scripted fakes for driving the approval loop and session driver in tests.

use crate::error::Result;
use crate::generate::{CompletionRequest, GenerationFailure, Generator};
use crate::interact::{Decision, Interaction};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

/// A recorded generation request, owned so assertions outlive the borrow.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub system: String,
    pub repo_context: Option<String>,
    pub user: String,
    pub model: String,
}

/// Generator returning a scripted sequence of responses.
pub(crate) struct ScriptedGenerator {
    responses: RefCell<VecDeque<std::result::Result<String, GenerationFailure>>>,
    pub requests: RefCell<Vec<RecordedRequest>>,
}

impl ScriptedGenerator {
    pub(crate) fn new(
        responses: Vec<std::result::Result<String, GenerationFailure>>,
    ) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn failure(message: &str) -> std::result::Result<String, GenerationFailure> {
        Err(GenerationFailure {
            message: message.to_string(),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Generator for ScriptedGenerator {
    fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> std::result::Result<String, GenerationFailure> {
        self.requests.borrow_mut().push(RecordedRequest {
            system: request.system.to_string(),
            repo_context: request.repo_context.map(|c| c.to_string()),
            user: request.user.to_string(),
            model: request.model.to_string(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .expect("scripted generator ran out of responses")
    }
}

/// Interaction source answering from scripted queues; empty queues fall
/// back to the defaults, which makes it behave like an unattended run with
/// preset variable values.
pub(crate) struct ScriptedInteraction {
    pub decisions: VecDeque<Decision>,
    pub confirms: VecDeque<bool>,
    pub edits: VecDeque<Option<String>>,
    pub lines: VecDeque<String>,
    pub values: HashMap<String, String>,
    pub editable: bool,
    /// Keys requested by each collect_values call, for assertions.
    pub collected: Vec<Vec<String>>,
}

impl ScriptedInteraction {
    pub(crate) fn auto() -> Self {
        Self {
            decisions: VecDeque::new(),
            confirms: VecDeque::new(),
            edits: VecDeque::new(),
            lines: VecDeque::new(),
            values: HashMap::new(),
            editable: false,
            collected: Vec::new(),
        }
    }

    pub(crate) fn with_decisions(decisions: Vec<Decision>) -> Self {
        Self {
            decisions: decisions.into(),
            editable: true,
            ..Self::auto()
        }
    }

    pub(crate) fn with_values<const N: usize>(mut self, pairs: [(&str, &str); N]) -> Self {
        self.values = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }
}

impl Interaction for ScriptedInteraction {
    fn decide(
        &mut self,
        _prompt: &str,
        _options: &[Decision],
        default: Decision,
    ) -> Result<Decision> {
        Ok(self.decisions.pop_front().unwrap_or(default))
    }

    fn confirm(&mut self, _prompt: &str, default: bool) -> Result<bool> {
        Ok(self.confirms.pop_front().unwrap_or(default))
    }

    fn line(&mut self, _prompt: &str) -> Result<String> {
        Ok(self.lines.pop_front().unwrap_or_default())
    }

    fn collect_values(&mut self, keys: &[String]) -> Result<HashMap<String, String>> {
        self.collected.push(keys.to_vec());
        Ok(keys
            .iter()
            .map(|key| {
                let value = self.values.get(key).cloned().unwrap_or_default();
                (key.clone(), value)
            })
            .collect())
    }

    fn can_edit(&self) -> bool {
        self.editable
    }

    fn edit(&mut self, _initial: &str) -> Result<Option<String>> {
        Ok(self.edits.pop_front().unwrap_or(None))
    }
}
