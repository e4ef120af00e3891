//! Error types for the ghboot CLI.
//!
//! Uses thiserror for derive macros. Every variant is terminal: the top-level
//! handler prints the message plus [`BootstrapError::remediation`] and exits.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for bootstrap operations.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Invalid invocation (missing or malformed arguments).
    #[error("{0}")]
    Usage(String),

    /// A required tool is absent and cannot be installed on this platform.
    #[error("{0} is not installed and no supported package manager was found")]
    ToolMissing(String),

    /// The package manager reported a failure while installing a tool.
    #[error("failed to install {tool}: {detail}")]
    InstallFailed { tool: String, detail: String },

    /// Login did not succeed within the allowed number of attempts.
    #[error("GitHub authentication failed after {attempts} attempt(s)")]
    AuthFailed { attempts: u32 },

    /// The repository could not be viewed with the current credentials.
    #[error("cannot access repository {repo}{}", detail_suffix(.detail))]
    AccessDenied { repo: String, detail: String },

    /// Cloning the repository failed.
    #[error("failed to clone {repo} (branch {branch}){}", detail_suffix(.detail))]
    CloneFailed {
        repo: String,
        branch: String,
        detail: String,
    },

    /// Every dependency installation strategy failed.
    #[error("failed to install dependencies from {manifest}")]
    DependencyInstallFailed {
        manifest: String,
        attempts: Vec<String>,
    },

    /// An explicitly requested installer script does not exist.
    #[error("specified installer not found: {0}")]
    EntryPointNotFound(String),

    /// Auto-detection found no installer script.
    #[error("no installer script found (looked for {})", .candidates.join(", "))]
    EntryPointMissing { candidates: Vec<String> },

    /// A termination signal arrived while a step was running.
    #[error("interrupted by signal {0}")]
    Interrupted(i32),

    /// Local I/O failure (temporary directory, spawning a process).
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {}", detail)
    }
}

impl BootstrapError {
    /// Wrap an I/O error with a short description of what was being done.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        BootstrapError::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            BootstrapError::Interrupted(signal) => exit_codes::for_signal(*signal),
            _ => exit_codes::FAILURE,
        }
    }

    /// Advisory text printed after the error line, if any.
    pub fn remediation(&self) -> Option<String> {
        match self {
            BootstrapError::Usage(_) => Some(
                "Usage: ghboot [OPTIONS] <OWNER/REPOSITORY> [INSTALLER_PATH] [ARGS]...\n\
                 Run `ghboot --help` for details."
                    .to_string(),
            ),
            BootstrapError::ToolMissing(tool) => Some(format!(
                "Install {} manually: https://github.com/cli/cli#installation\n\
                 Supported package managers: Homebrew (macOS), apt (Debian/Ubuntu), dnf/yum (Fedora/RHEL).",
                tool
            )),
            BootstrapError::InstallFailed { .. } => Some(
                "Check that you can run the package manager with sudo, then retry,\n\
                 or install the GitHub CLI manually: https://github.com/cli/cli#installation"
                    .to_string(),
            ),
            BootstrapError::AuthFailed { .. } => Some(
                "Troubleshooting:\n\
                 1. Make sure a browser is available and you completed the device code flow\n\
                 2. Check your network connection to github.com\n\
                 3. Try logging in manually: gh auth login --web --scopes repo,read:org\n\
                 4. Confirm the result with: gh auth status"
                    .to_string(),
            ),
            BootstrapError::AccessDenied { repo, .. } => Some(format!(
                "Possible causes:\n\
                 - The repository name is misspelled (expected OWNER/NAME)\n\
                 - Your account has not been granted access to {}\n\
                 - Your organization requires SSO authorization for this token\n\
                 - The token is missing the 'repo' scope (run: gh auth refresh --scopes repo,read:org)",
                repo
            )),
            BootstrapError::CloneFailed { branch, .. } => Some(format!(
                "Check your network connection and that branch '{}' exists.\n\
                 Set BRANCH (or pass --branch) to clone a different branch.",
                branch
            )),
            BootstrapError::DependencyInstallFailed { attempts, .. } => {
                let mut text = String::from("Attempts:\n");
                for attempt in attempts {
                    text.push_str(&format!("  - {}\n", attempt));
                }
                text.push_str(
                    "Options:\n\
                     1. Install pipx and run the installer through it: pipx install <package>\n\
                     2. Force a system install: python3 -m pip install --user --break-system-packages -r requirements.txt\n\
                     3. Create a virtual environment manually:\n\
                        python3 -m venv .venv && .venv/bin/python -m pip install -r requirements.txt",
                );
                Some(text)
            }
            BootstrapError::EntryPointNotFound(_) => Some(
                "The installer path is resolved relative to the repository root.".to_string(),
            ),
            BootstrapError::EntryPointMissing { .. } => Some(
                "Pass the installer path explicitly as the second argument.".to_string(),
            ),
            BootstrapError::Interrupted(_) | BootstrapError::Io { .. } => None,
        }
    }
}

/// Result type alias for bootstrap operations.
pub type Result<T> = std::result::Result<T, BootstrapError>;
