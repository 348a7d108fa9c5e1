//! Exit code constants for the cascade CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, failed writes)
//! - 2: Configuration error (missing credential, missing/empty prompt directory)
//! - 3: Git operation failure (repository clone)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or a failed filesystem operation.
pub const USER_ERROR: i32 = 1;

/// Configuration error: missing credential or unusable prompt directory.
/// These abort before any prompt executes.
pub const CONFIG_ERROR: i32 = 2;

/// Git operation failure: repository clone or inspection failed.
pub const GIT_FAILURE: i32 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, USER_ERROR, CONFIG_ERROR, GIT_FAILURE];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn success_is_zero() {
        assert_eq!(SUCCESS, 0);
    }
}
