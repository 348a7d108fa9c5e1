//! Error types for the cascade CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.
//!
//! Note that generation failures are deliberately absent from this enum:
//! a failed call to the text-generation service is recoverable and is routed
//! back into the approval loop (see [`crate::generate::GenerationFailure`]).
//! Only errors that end the process belong here.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for cascade operations.
///
/// Each variant maps to a specific exit code.
#[derive(Error, Debug)]
pub enum CascadeError {
    /// User provided invalid arguments or a filesystem operation failed.
    #[error("{0}")]
    UserError(String),

    /// Configuration is unusable: missing credential, missing or empty
    /// prompt directory. Fatal before any prompt runs.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Git operation failed (repository clone or inspection).
    #[error("Git operation failed: {0}")]
    GitError(String),
}

impl CascadeError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CascadeError::UserError(_) => exit_codes::USER_ERROR,
            CascadeError::ConfigError(_) => exit_codes::CONFIG_ERROR,
            CascadeError::GitError(_) => exit_codes::GIT_FAILURE,
        }
    }
}

/// Result type alias for cascade operations.
pub type Result<T> = std::result::Result<T, CascadeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = CascadeError::UserError("bad argument".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn config_error_has_correct_exit_code() {
        let err = CascadeError::ConfigError("missing OPENAI_API_KEY".to_string());
        assert_eq!(err.exit_code(), exit_codes::CONFIG_ERROR);
    }

    #[test]
    fn git_error_has_correct_exit_code() {
        let err = CascadeError::GitError("clone failed".to_string());
        assert_eq!(err.exit_code(), exit_codes::GIT_FAILURE);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = CascadeError::ConfigError("prompts directory not found: ./prompts".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: prompts directory not found: ./prompts"
        );

        let err = CascadeError::GitError("exit status 128".to_string());
        assert_eq!(err.to_string(), "Git operation failed: exit status 128");
    }
}
