//! CLI argument parsing for ghboot.
//!
//! Uses clap derive macros. Options must precede the repository identifier;
//! everything from the repository onward is captured verbatim so that flags
//! meant for the installer script are never interpreted here.

use clap::Parser;

/// Bootstrap a private GitHub repository's installer.
///
/// Installs the GitHub CLI if needed, logs in through the browser, verifies
/// access to OWNER/REPOSITORY, clones it into a temporary directory, installs
/// its Python requirements and runs its installer script with ARGS.
#[derive(Parser, Debug)]
#[command(name = "ghboot")]
#[command(author, version, about, long_about = None)]
#[command(override_usage = "ghboot [OPTIONS] <OWNER/REPOSITORY> [INSTALLER_PATH] [ARGS]...")]
pub struct Cli {
    /// Branch to clone (overrides the BRANCH environment variable).
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Base Python interpreter (overrides GHBOOT_PYTHON).
    #[arg(long, value_name = "PATH")]
    pub python: Option<String>,

    /// Disable colored status output.
    #[arg(long)]
    pub no_color: bool,

    /// Log every external command.
    #[arg(short, long)]
    pub verbose: bool,

    /// OWNER/REPOSITORY, then an optional installer path relative to the
    /// repository root, then arguments forwarded to the installer.
    #[arg(
        value_name = "OWNER/REPOSITORY",
        required = true,
        num_args = 1..,
        trailing_var_arg = true
    )]
    pub invocation: Vec<String>,
}

impl Cli {
    /// The repository identifier as typed.
    pub fn repository(&self) -> &str {
        self.invocation.first().map(String::as_str).unwrap_or_default()
    }

    /// Everything after the repository identifier.
    pub fn trailing(&self) -> &[String] {
        self.invocation.get(1..).unwrap_or_default()
    }
}
