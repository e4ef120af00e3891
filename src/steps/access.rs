//! Confirm the authenticated user can see the target repository.

use super::StepContext;
use crate::config::RepoSlug;
use crate::error::{BootstrapError, Result};
use crate::process::CommandSpec;
use serde::Deserialize;

/// Subset of `gh repo view --json name`.
#[derive(Debug, Deserialize)]
struct RepoView {
    name: String,
}

pub fn view_command(gh: &str, repo: &RepoSlug) -> CommandSpec {
    let id = repo.to_string();
    CommandSpec::new(gh, ["repo", "view", id.as_str(), "--json", "name"])
}

/// Single probe, no retry. Any failure is reported as `AccessDenied` with
/// the GitHub CLI's own message attached.
pub fn verify_access(ctx: &StepContext<'_>, repo: &RepoSlug) -> Result<()> {
    ctx.console.info(&format!("Verifying access to {}", repo));
    let output = ctx.runner.run(&view_command(&ctx.settings.gh, repo))?;
    if !output.is_success() {
        return Err(BootstrapError::AccessDenied {
            repo: repo.to_string(),
            detail: output.failure_reason(),
        });
    }

    match serde_json::from_str::<RepoView>(&output.stdout) {
        Ok(view) if view.name != repo.name() => {
            log::debug!("{} resolves to repository named {}", repo, view.name);
        }
        Ok(view) => log::debug!("{} visible under owner {}", view.name, repo.owner()),
        Err(e) => log::debug!("unexpected `gh repo view` output: {}", e),
    }
    ctx.console.success(&format!("Access to {} confirmed", repo));
    Ok(())
}
