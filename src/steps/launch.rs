//! Installer script resolution and launch.

use super::StepContext;
use super::deps::PreparedEnvironment;
use crate::error::{BootstrapError, Result};
use crate::fallback::{self, Attempt, Chain};
use crate::process::CommandSpec;
use std::path::{Component, Path, PathBuf};

/// The script to run, relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Path as passed to the interpreter (relative to the repository).
    pub relative: String,
    /// Absolute location inside the clone.
    pub path: PathBuf,
    /// Whether the caller named it, as opposed to auto-detection.
    pub explicit: bool,
}

/// Pick the installer script.
///
/// An explicit path must name an existing file inside `repo_dir`; it is
/// never second-guessed by auto-detection. Otherwise `candidates` are probed
/// in order.
pub fn resolve_entry_point(
    repo_dir: &Path,
    explicit: Option<&str>,
    candidates: &[String],
) -> Result<EntryPoint> {
    if let Some(relative) = explicit {
        let path = repo_dir.join(relative);
        if !stays_inside(relative) || !path.is_file() {
            return Err(BootstrapError::EntryPointNotFound(relative.to_string()));
        }
        return Ok(EntryPoint {
            relative: relative.to_string(),
            path,
            explicit: true,
        });
    }

    let chain = fallback::first_success(candidates, |name| {
        let path = repo_dir.join(name.as_str());
        Ok(if path.is_file() {
            Attempt::Done(path)
        } else {
            Attempt::Failed("not present".to_string())
        })
    })?;

    match chain {
        Chain::Succeeded {
            strategy, value, ..
        } => Ok(EntryPoint {
            relative: strategy.clone(),
            path: value,
            explicit: false,
        }),
        Chain::Exhausted(_) => Err(BootstrapError::EntryPointMissing {
            candidates: candidates.to_vec(),
        }),
    }
}

/// Whether `relative` names something below the repository root. Absolute
/// paths and `..` components could escape the clone.
fn stays_inside(relative: &str) -> bool {
    Path::new(relative)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Command that runs `entry` with `forwarded` appended unmodified.
pub fn launch_command(
    env: &PreparedEnvironment,
    repo_dir: &Path,
    entry: &EntryPoint,
    forwarded: &[String],
) -> CommandSpec {
    let mut args = Vec::with_capacity(forwarded.len() + 1);
    args.push(entry.relative.clone());
    args.extend(forwarded.iter().cloned());
    CommandSpec::new(env.python.as_str(), args)
        .in_dir(repo_dir)
        .interactive()
}

/// Run the installer script and return its exit status.
pub fn launch(
    ctx: &StepContext<'_>,
    env: &PreparedEnvironment,
    repo_dir: &Path,
    entry: &EntryPoint,
    forwarded: &[String],
) -> Result<i32> {
    let how = if entry.explicit { "specified" } else { "detected" };
    ctx.console.info(&format!("Running {} installer {}", how, entry.relative));
    log::debug!("launching {}", entry.path.display());

    let output = ctx
        .runner
        .run(&launch_command(env, repo_dir, entry, forwarded))?;
    let status = output.exit_status();
    if status != 0 {
        log::debug!("{} exited with status {}", entry.relative, status);
    }
    Ok(status)
}
