//! Configuration for a bootstrap run.
//!
//! Every tunable is resolved once into [`Settings`] and passed explicitly to
//! the orchestrator. Precedence is CLI flag, then environment, then default.

use crate::cli::Cli;
use crate::error::{BootstrapError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Environment variable selecting the branch to clone.
pub const BRANCH_ENV: &str = "BRANCH";

/// Environment variable selecting the base Python interpreter.
pub const PYTHON_ENV: &str = "GHBOOT_PYTHON";

/// Environment variable disabling color (https://no-color.org).
pub const NO_COLOR_ENV: &str = "NO_COLOR";

/// Environment variable holding the env_logger filter.
pub const LOG_ENV: &str = "GHBOOT_LOG";

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_PYTHON: &str = "python3";
pub const GH_PROGRAM: &str = "gh";
pub const AUTH_SCOPES: &str = "repo,read:org";
pub const MAX_AUTH_ATTEMPTS: u32 = 3;
pub const DEPENDENCY_MANIFEST: &str = "requirements.txt";

/// Installer scripts probed at the repository root, in priority order.
pub const ENTRY_POINT_CANDIDATES: &[&str] = &["main.py", "install.py", "setup.py"];

static REPO_SLUG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)$").expect("Invalid repository regex")
});

/// A validated `OWNER/NAME` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    owner: String,
    name: String,
}

impl RepoSlug {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepoSlug {
    type Err = BootstrapError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = REPO_SLUG_REGEX.captures(s).ok_or_else(|| {
            BootstrapError::Usage(format!(
                "invalid repository '{}': expected OWNER/REPOSITORY",
                s
            ))
        })?;
        let (owner, name) = (&caps[1], &caps[2]);
        if [owner, name].iter().any(|part| *part == "." || *part == "..") {
            return Err(BootstrapError::Usage(format!(
                "invalid repository '{}': expected OWNER/REPOSITORY",
                s
            )));
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Branch passed to the clone.
    pub branch: String,
    /// Interpreter used for dependency installs and, absent an isolated
    /// environment, for the installer script.
    pub python: String,
    /// Colorize status lines.
    pub color: bool,
    /// GitHub CLI program name.
    pub gh: String,
    /// OAuth scopes requested at login.
    pub auth_scopes: String,
    /// Upper bound on interactive login attempts.
    pub max_auth_attempts: u32,
    /// Dependency manifest file name at the repository root.
    pub manifest: String,
    /// Installer scripts probed in order when none is given.
    pub entry_candidates: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            python: DEFAULT_PYTHON.to_string(),
            color: true,
            gh: GH_PROGRAM.to_string(),
            auth_scopes: AUTH_SCOPES.to_string(),
            max_auth_attempts: MAX_AUTH_ATTEMPTS,
            manifest: DEPENDENCY_MANIFEST.to_string(),
            entry_candidates: ENTRY_POINT_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Settings {
    /// Resolve settings from parsed arguments and an environment lookup.
    ///
    /// Empty environment values are treated as unset.
    pub fn resolve<F>(cli: &Cli, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_value = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let branch = cli
            .branch
            .clone()
            .or_else(|| env_value(BRANCH_ENV))
            .unwrap_or(defaults.branch);
        let python = cli
            .python
            .clone()
            .or_else(|| env_value(PYTHON_ENV))
            .unwrap_or(defaults.python);
        let color = !cli.no_color && env_value(NO_COLOR_ENV).is_none();

        Self {
            branch,
            python,
            color,
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests;
