//! Sequences the bootstrap steps.
//!
//! Steps run strictly in order and the first failure ends the run. The
//! workspace is owned by [`Orchestrator::run`] and dropped (deleted) on
//! every return path, after the installer script has exited.

use crate::config::{RepoSlug, Settings};
use crate::console::{Console, Prompt};
use crate::error::Result;
use crate::process::CommandRunner;
use crate::steps::StepContext;
use crate::steps::fetch::Workspace;
use crate::steps::{access, auth, cli_install, deps, fetch, launch};
use std::path::PathBuf;

/// What the caller asked for, after argument splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub repository: RepoSlug,
    /// Installer script relative to the repository root, if named.
    pub installer: Option<String>,
    /// Arguments passed through to the installer script.
    pub forwarded: Vec<String>,
}

impl Invocation {
    /// Split the raw arguments that follow the program name.
    ///
    /// The first trailing argument is taken as the installer path unless it
    /// looks like a flag (starts with `-`); everything else is forwarded.
    pub fn parse(repository: &str, trailing: &[String]) -> Result<Self> {
        let repository: RepoSlug = repository.parse()?;
        let (installer, forwarded) = match trailing.split_first() {
            Some((first, rest)) if !first.starts_with('-') => (Some(first.clone()), rest.to_vec()),
            _ => (None, trailing.to_vec()),
        };
        Ok(Self {
            repository,
            installer,
            forwarded,
        })
    }
}

/// Runs one bootstrap from CLI check to installer exit.
pub struct Orchestrator<'a> {
    settings: &'a Settings,
    runner: &'a dyn CommandRunner,
    prompt: &'a dyn Prompt,
    console: Console,
    workspace_parent: Option<PathBuf>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        settings: &'a Settings,
        runner: &'a dyn CommandRunner,
        prompt: &'a dyn Prompt,
    ) -> Self {
        Self {
            settings,
            runner,
            prompt,
            console: Console::new(settings.color),
            workspace_parent: None,
        }
    }

    /// Create workspaces under `parent` instead of the system temp dir.
    pub fn with_workspace_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.workspace_parent = Some(parent.into());
        self
    }

    fn context(&self) -> StepContext<'a> {
        StepContext {
            runner: self.runner,
            prompt: self.prompt,
            console: self.console,
            settings: self.settings,
        }
    }

    /// Run every step and return the installer script's exit status.
    pub fn run(&self, invocation: &Invocation) -> Result<i32> {
        let ctx = self.context();
        let repo = &invocation.repository;
        self.console.info(&format!(
            "Bootstrapping {} (branch {})",
            repo, self.settings.branch
        ));

        let cli = cli_install::ensure_cli_present(&ctx)?;
        log::debug!("github cli: {:?}", cli);
        let auth = auth::ensure_authenticated(&ctx)?;
        log::debug!("authentication: {:?}", auth);
        access::verify_access(&ctx, repo)?;

        let workspace = match &self.workspace_parent {
            Some(parent) => Workspace::create_in(parent)?,
            None => Workspace::create()?,
        };
        log::debug!("workspace: {}", workspace.path().display());

        let repo_dir = fetch::clone_repository(&ctx, repo, &workspace)?;
        let env = deps::install_dependencies(&ctx, &workspace, &repo_dir)?;
        match env.strategy {
            Some(strategy) => log::debug!("dependencies installed via {} strategy", strategy),
            None => log::debug!("no dependencies declared"),
        }
        let entry = launch::resolve_entry_point(
            &repo_dir,
            invocation.installer.as_deref(),
            &self.settings.entry_candidates,
        )?;
        let status = launch::launch(&ctx, &env, &repo_dir, &entry, &invocation.forwarded)?;

        if status == 0 {
            self.console.success("Installer finished");
        } else {
            self.console.warning(&format!("Installer exited with status {}", status));
        }
        Ok(status)
    }
}
