use super::ToolOutput;

/// Triage of one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Exit zero with parseable content
    Success,
    /// A legitimate "no data" state (e.g. no timer running)
    EmptyState,
    /// The tool genuinely failed
    Failure,
}

/// Phrases the wrapped tools print for a legitimate empty state.
/// Matched case-insensitively against the whole combined output.
const EMPTY_SENTINELS: &[&str] = &[
    "no timer running",
    "no timer is currently running",
    "nothing is running",
    "nothing to stop",
];

/// Decide whether an invocation succeeded, hit a benign empty state, or
/// failed.
///
/// Sentinel content is checked before the exit code: several subcommands
/// exit non-zero (or print a literal `null`) for the common "no timer
/// running" case, and callers must see that as valid empty data.
pub fn classify(output: &ToolOutput) -> Outcome {
    let trimmed = output.combined.trim();

    if trimmed == "null" {
        return Outcome::EmptyState;
    }
    let lower = trimmed.to_lowercase();
    if EMPTY_SENTINELS.iter().any(|s| lower.contains(s)) {
        return Outcome::EmptyState;
    }

    if output.success() {
        if trimmed.is_empty() {
            Outcome::EmptyState
        } else {
            Outcome::Success
        }
    } else {
        Outcome::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(exit_code: i32, combined: &str) -> ToolOutput {
        ToolOutput {
            exit_code,
            combined: combined.to_string(),
        }
    }

    #[test]
    fn test_zero_exit_with_content_is_success() {
        assert_eq!(classify(&output(0, r#"{"is_running": true}"#)), Outcome::Success);
    }

    #[test]
    fn test_null_token_is_empty_state_even_on_nonzero_exit() {
        assert_eq!(classify(&output(1, "null\n")), Outcome::EmptyState);
        assert_eq!(classify(&output(0, "null")), Outcome::EmptyState);
    }

    #[test]
    fn test_sentinel_phrase_beats_exit_code() {
        // The status subcommand exits 1 when nothing is tracked
        assert_eq!(
            classify(&output(1, "No timer is currently running.")),
            Outcome::EmptyState
        );
        assert_eq!(
            classify(&output(1, "Error: nothing to stop")),
            Outcome::EmptyState
        );
    }

    #[test]
    fn test_nonzero_without_sentinel_is_failure() {
        assert_eq!(
            classify(&output(1, "Traceback (most recent call last):\n  ...")),
            Outcome::Failure
        );
        assert_eq!(classify(&output(2, "")), Outcome::Failure);
    }

    #[test]
    fn test_blank_success_is_empty_state() {
        assert_eq!(classify(&output(0, "")), Outcome::EmptyState);
        assert_eq!(classify(&output(0, "  \n")), Outcome::EmptyState);
    }
}
