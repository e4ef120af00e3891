//! Exit code constants for the ghboot CLI.
//!
//! - 0: Success
//! - 1: Any fatal bootstrap failure (usage, install, auth, access, clone,
//!   dependencies, entry point)
//! - 128 + N: Terminated by signal N
//!
//! When the entry point runs, its own exit status is passed through instead.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Fatal failure at any bootstrap step.
pub const FAILURE: i32 = 1;

/// Base added to a signal number to form the exit status.
pub const SIGNAL_BASE: i32 = 128;

/// Exit status for a process terminated by `signal`.
pub fn for_signal(signal: i32) -> i32 {
    SIGNAL_BASE + signal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(SUCCESS, FAILURE);
        assert_ne!(FAILURE, for_signal(0));
    }

    #[test]
    fn signal_statuses_follow_shell_convention() {
        assert_eq!(for_signal(2), 130);
        assert_eq!(for_signal(15), 143);
    }
}
