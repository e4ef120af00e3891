//! Dependency installation with an environment-aware fallback chain.
//!
//! Modern Python distributions may refuse user-scoped installs
//! ("externally managed environment"). The chain tries a plain user install,
//! then a user install that overrides the restriction, then a throwaway
//! virtual environment inside the workspace.

use super::StepContext;
use super::fetch::Workspace;
use crate::error::{BootstrapError, Result};
use crate::fallback::{self, Attempt, Chain};
use crate::process::CommandSpec;
use std::fmt;
use std::path::Path;

/// Ways of installing the declared dependencies, in the order tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyStrategy {
    /// `pip install --user`.
    Direct,
    /// `pip install --user --break-system-packages`.
    Elevated,
    /// A fresh virtual environment in the workspace.
    Isolated,
}

impl DependencyStrategy {
    pub const ORDER: [DependencyStrategy; 3] = [
        DependencyStrategy::Direct,
        DependencyStrategy::Elevated,
        DependencyStrategy::Isolated,
    ];
}

impl fmt::Display for DependencyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyStrategy::Direct => write!(f, "direct"),
            DependencyStrategy::Elevated => write!(f, "elevated"),
            DependencyStrategy::Isolated => write!(f, "isolated-environment"),
        }
    }
}

/// Execution context handed to the launch step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedEnvironment {
    /// Strategy that installed the dependencies, `None` without a manifest.
    pub strategy: Option<DependencyStrategy>,
    /// Interpreter to run the installer script with.
    pub python: String,
}

fn pip_install(python: &str, manifest: &Path, extra: &[&str]) -> CommandSpec {
    let manifest = manifest.to_string_lossy();
    let mut args = vec!["-m", "pip", "install"];
    args.extend_from_slice(extra);
    args.extend(["-r", &*manifest]);
    CommandSpec::new(python, args)
}

/// Interpreter inside a virtual environment.
pub fn venv_python(venv: &Path) -> std::path::PathBuf {
    venv.join("bin").join("python")
}

/// Install the repository's declared dependencies, if it declares any.
pub fn install_dependencies(
    ctx: &StepContext<'_>,
    workspace: &Workspace,
    repo_dir: &Path,
) -> Result<PreparedEnvironment> {
    let settings = ctx.settings;
    let manifest = repo_dir.join(&settings.manifest);
    if !manifest.is_file() {
        log::debug!("no {} in repository, skipping dependencies", settings.manifest);
        return Ok(PreparedEnvironment {
            strategy: None,
            python: settings.python.clone(),
        });
    }

    ctx.console.info(&format!("Installing dependencies from {}", settings.manifest));
    let chain = fallback::first_success(DependencyStrategy::ORDER, |strategy| {
        log::debug!("trying {} dependency install", strategy);
        let attempt = match strategy {
            DependencyStrategy::Direct => {
                install_system(ctx, repo_dir, &manifest, &["--user"])?
            }
            DependencyStrategy::Elevated => install_system(
                ctx,
                repo_dir,
                &manifest,
                &["--user", "--break-system-packages"],
            )?,
            DependencyStrategy::Isolated => {
                install_isolated(ctx, repo_dir, &manifest, &workspace.venv_dir())?
            }
        };
        if let Attempt::Failed(reason) = &attempt {
            ctx.console.warning(&format!("{} install failed: {}", strategy, reason));
        }
        Ok(attempt)
    })?;
    log::debug!(
        "{} dependency strategies failed before the chain settled",
        chain.failures().len()
    );

    match chain {
        Chain::Succeeded {
            strategy, value, ..
        } => {
            ctx.console.success(&format!("Dependencies installed ({})", strategy));
            Ok(PreparedEnvironment {
                strategy: Some(strategy),
                python: value,
            })
        }
        Chain::Exhausted(failures) => Err(BootstrapError::DependencyInstallFailed {
            manifest: settings.manifest.clone(),
            attempts: failures
                .iter()
                .map(|f| format!("{}: {}", f.strategy, f.reason))
                .collect(),
        }),
    }
}

fn install_system(
    ctx: &StepContext<'_>,
    repo_dir: &Path,
    manifest: &Path,
    flags: &[&str],
) -> Result<Attempt<String>> {
    let python = &ctx.settings.python;
    let output = ctx
        .runner
        .run(&pip_install(python, manifest, flags).in_dir(repo_dir))?;
    Ok(if output.is_success() {
        Attempt::Done(python.clone())
    } else {
        Attempt::Failed(output.failure_reason())
    })
}

fn install_isolated(
    ctx: &StepContext<'_>,
    repo_dir: &Path,
    manifest: &Path,
    venv: &Path,
) -> Result<Attempt<String>> {
    let venv_arg = venv.to_string_lossy();
    let create = CommandSpec::new(&*ctx.settings.python, ["-m", "venv", &*venv_arg]);
    let output = ctx.runner.run(&create.in_dir(repo_dir))?;
    if !output.is_success() {
        discard_environment(venv);
        return Ok(Attempt::Failed(format!(
            "could not create virtual environment: {}",
            output.failure_reason()
        )));
    }

    let python = venv_python(venv).to_string_lossy().to_string();
    let output = ctx
        .runner
        .run(&pip_install(&python, manifest, &[]).in_dir(repo_dir))?;
    if !output.is_success() {
        discard_environment(venv);
        return Ok(Attempt::Failed(output.failure_reason()));
    }
    Ok(Attempt::Done(python))
}

fn discard_environment(venv: &Path) {
    if venv.exists()
        && let Err(e) = std::fs::remove_dir_all(venv)
    {
        log::warn!("failed to remove '{}': {}", venv.display(), e);
    }
}
