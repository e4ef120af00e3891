//! Scoped workspace and repository clone.

use super::StepContext;
use crate::config::RepoSlug;
use crate::error::{BootstrapError, Result};
use crate::process::CommandSpec;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "ghboot-";

/// A temporary directory owned by one bootstrap run.
///
/// Holds the clone (`repo/`) and, if one is built, the isolated
/// environment (`venv/`). The directory is removed when the workspace is
/// dropped, on success and on every error path.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a workspace under the system temporary directory.
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()
            .map_err(|e| BootstrapError::io("failed to create temporary directory", e))?;
        Ok(Self { dir })
    }

    /// Create a workspace under `parent`.
    pub fn create_in(parent: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| {
                BootstrapError::io(
                    format!("failed to create temporary directory in '{}'", parent.display()),
                    e,
                )
            })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Clone destination.
    pub fn repo_dir(&self) -> PathBuf {
        self.path().join("repo")
    }

    /// Isolated environment location.
    pub fn venv_dir(&self) -> PathBuf {
        self.path().join("venv")
    }
}

pub fn clone_command(gh: &str, repo: &RepoSlug, dest: &Path, branch: &str) -> CommandSpec {
    let id = repo.to_string();
    let dest = dest.to_string_lossy();
    CommandSpec::new(gh, ["repo", "clone", id.as_str(), &*dest, "--", "-b", branch])
}

/// Clone `repo` at the configured branch into the workspace.
pub fn clone_repository(
    ctx: &StepContext<'_>,
    repo: &RepoSlug,
    workspace: &Workspace,
) -> Result<PathBuf> {
    let branch = &ctx.settings.branch;
    let dest = workspace.repo_dir();
    ctx.console.info(&format!("Cloning {} (branch {})", repo, branch));

    let output = ctx
        .runner
        .run(&clone_command(&ctx.settings.gh, repo, &dest, branch))?;
    if !output.is_success() {
        return Err(BootstrapError::CloneFailed {
            repo: repo.to_string(),
            branch: branch.clone(),
            detail: output.failure_reason(),
        });
    }

    ctx.console.success("Repository cloned");
    Ok(dest)
}
