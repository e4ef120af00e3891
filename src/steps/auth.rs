//! Ensure there is an authenticated GitHub CLI session.

use super::StepContext;
use crate::error::{BootstrapError, Result};
use crate::process::CommandSpec;

/// What [`ensure_authenticated`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    AlreadyAuthenticated,
    /// Logged in on the given attempt (1-based).
    LoggedIn { attempt: u32 },
}

pub fn status_command(gh: &str) -> CommandSpec {
    CommandSpec::new(gh, ["auth", "status"])
}

pub fn login_command(gh: &str, scopes: &str) -> CommandSpec {
    CommandSpec::new(gh, ["auth", "login", "--web", "--scopes", scopes]).interactive()
}

/// Log in through the browser unless a session already exists.
///
/// Makes at most `max_auth_attempts` login attempts, waiting for the user
/// to press Enter between them.
pub fn ensure_authenticated(ctx: &StepContext<'_>) -> Result<AuthStatus> {
    let settings = ctx.settings;
    if ctx.runner.run(&status_command(&settings.gh))?.is_success() {
        ctx.console.success("Already authenticated with GitHub");
        return Ok(AuthStatus::AlreadyAuthenticated);
    }

    ctx.console
        .info("Not logged in to GitHub. A browser window will open to authorize access.");
    let max_attempts = settings.max_auth_attempts;
    let login = login_command(&settings.gh, &settings.auth_scopes);

    let mut attempt = 1;
    while attempt <= max_attempts {
        ctx.console.info(&format!(
            "Authentication attempt {} of {}",
            attempt, max_attempts
        ));
        let output = ctx.runner.run(&login)?;
        if output.is_success() {
            ctx.console.success("Authenticated with GitHub");
            return Ok(AuthStatus::LoggedIn { attempt });
        }

        ctx.console.warning(&format!(
            "Authentication attempt {} failed ({})",
            attempt,
            output.failure_reason()
        ));
        if attempt < max_attempts {
            ctx.prompt.wait_for_enter(
                "Complete the browser flow if it is still open, then press Enter to retry...",
            )?;
        }
        attempt += 1;
    }

    Err(BootstrapError::AuthFailed {
        attempts: max_attempts,
    })
}
