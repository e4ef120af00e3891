//! Ensure the GitHub CLI is present, installing it through the first
//! supported package manager if it is not.

use super::StepContext;
use crate::error::{BootstrapError, Result};
use crate::process::{CommandRunner, CommandSpec};
use std::path::PathBuf;

const SUDO: &str = "sudo";
const APT_KEYRING_DIR: &str = "/etc/apt/keyrings";
const APT_KEYRING: &str = "/etc/apt/keyrings/githubcli-archive-keyring.gpg";
const APT_KEYRING_URL: &str = "https://cli.github.com/packages/githubcli-archive-keyring.gpg";
const APT_SOURCE_LIST: &str = "/etc/apt/sources.list.d/github-cli.list";
const RPM_REPO_URL: &str = "https://cli.github.com/packages/rpm/gh-cli.repo";

/// Package managers able to install the GitHub CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Homebrew,
    Apt,
    Dnf,
    Yum,
}

impl PackageManager {
    /// Probe order: macOS, then Debian family, then RedHat family.
    pub const PROBE_ORDER: [PackageManager; 4] = [
        PackageManager::Homebrew,
        PackageManager::Apt,
        PackageManager::Dnf,
        PackageManager::Yum,
    ];

    /// Executable whose presence selects this package manager.
    pub fn program(self) -> &'static str {
        match self {
            PackageManager::Homebrew => "brew",
            PackageManager::Apt => "apt-get",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PackageManager::Homebrew => "Homebrew",
            PackageManager::Apt => "apt",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
        }
    }

    /// Whether the install commands need root.
    pub fn needs_elevation(self) -> bool {
        !matches!(self, PackageManager::Homebrew)
    }
}

/// What [`ensure_cli_present`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliStatus {
    AlreadyInstalled(PathBuf),
    Installed(PackageManager),
}

/// First package manager found on PATH, in [`PackageManager::PROBE_ORDER`].
pub fn detect_package_manager(runner: &dyn CommandRunner) -> Option<PackageManager> {
    PackageManager::PROBE_ORDER
        .into_iter()
        .find(|pm| runner.locate(pm.program()).is_some())
}

/// Commands that install the GitHub CLI with `pm`, before elevation.
///
/// `arch` is the Debian architecture and only used for apt.
pub fn install_commands(pm: PackageManager, tool: &str, arch: &str) -> Vec<CommandSpec> {
    match pm {
        PackageManager::Homebrew => vec![CommandSpec::new("brew", ["install", tool]).interactive()],
        PackageManager::Apt => vec![
            CommandSpec::new("mkdir", ["-p", "-m", "755", APT_KEYRING_DIR]).interactive(),
            CommandSpec::new("curl", ["-fsSL", APT_KEYRING_URL, "-o", APT_KEYRING]).interactive(),
            CommandSpec::new("chmod", ["go+r", APT_KEYRING]).interactive(),
            CommandSpec::new("tee", [APT_SOURCE_LIST]).with_stdin(format!(
                "deb [arch={} signed-by={}] https://cli.github.com/packages stable main\n",
                arch, APT_KEYRING
            )),
            CommandSpec::new("apt-get", ["update"]).interactive(),
            CommandSpec::new("apt-get", ["install", "-y", tool]).interactive(),
        ],
        PackageManager::Dnf => vec![
            CommandSpec::new("dnf", ["install", "-y", "dnf-command(config-manager)"]).interactive(),
            CommandSpec::new("dnf", ["config-manager", "--add-repo", RPM_REPO_URL]).interactive(),
            CommandSpec::new("dnf", ["install", "-y", tool]).interactive(),
        ],
        PackageManager::Yum => vec![
            CommandSpec::new("yum", ["install", "-y", "yum-utils"]).interactive(),
            CommandSpec::new("yum-config-manager", ["--add-repo", RPM_REPO_URL]).interactive(),
            CommandSpec::new("yum", ["install", "-y", tool]).interactive(),
        ],
    }
}

/// Install the GitHub CLI unless it is already on PATH.
pub fn ensure_cli_present(ctx: &StepContext<'_>) -> Result<CliStatus> {
    let tool = ctx.settings.gh.as_str();
    if let Some(path) = ctx.runner.locate(tool) {
        log::debug!("{} found at {}", tool, path.display());
        ctx.console.success("GitHub CLI is installed");
        return Ok(CliStatus::AlreadyInstalled(path));
    }

    ctx.console.warning("GitHub CLI not found, installing it");
    let pm = detect_package_manager(ctx.runner)
        .ok_or_else(|| BootstrapError::ToolMissing(tool.to_string()))?;
    ctx.console.info(&format!("Installing GitHub CLI with {}", pm.label()));

    let arch = if pm == PackageManager::Apt {
        debian_architecture(ctx, tool)?
    } else {
        String::new()
    };

    let elevate = pm.needs_elevation() && !ctx.runner.is_root();
    for command in install_commands(pm, tool, &arch) {
        let command = if elevate {
            command.wrapped_in(SUDO)
        } else {
            command
        };
        let output = ctx.runner.run(&command)?;
        if !output.is_success() {
            return Err(BootstrapError::InstallFailed {
                tool: tool.to_string(),
                detail: format!("`{}` failed: {}", command.display(), output.failure_reason()),
            });
        }
    }

    if ctx.runner.locate(tool).is_none() {
        return Err(BootstrapError::InstallFailed {
            tool: tool.to_string(),
            detail: format!("{} reported success but {} is not on PATH", pm.label(), tool),
        });
    }
    ctx.console.success("GitHub CLI installed");
    Ok(CliStatus::Installed(pm))
}

fn debian_architecture(ctx: &StepContext<'_>, tool: &str) -> Result<String> {
    let output = ctx
        .runner
        .run(&CommandSpec::new("dpkg", ["--print-architecture"]))?;
    if !output.is_success() || output.stdout.is_empty() {
        return Err(BootstrapError::InstallFailed {
            tool: tool.to_string(),
            detail: format!(
                "could not determine the package architecture: {}",
                output.failure_reason()
            ),
        });
    }
    Ok(output.stdout.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::process::CommandOutput;
    use crate::test_support::{CountingPrompt, ScriptedRunner, step_context};

    #[test]
    fn present_cli_is_left_alone() {
        let runner = ScriptedRunner::new().with_programs(&["gh", "brew"]);
        let prompt = CountingPrompt::default();
        let settings = Settings::default();
        let ctx = step_context(&runner, &prompt, &settings);

        let status = ensure_cli_present(&ctx).unwrap();
        assert_eq!(status, CliStatus::AlreadyInstalled(PathBuf::from("/usr/bin/gh")));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn detection_follows_priority_order() {
        let runner = ScriptedRunner::new().with_programs(&["yum", "dnf", "apt-get", "brew"]);
        assert_eq!(detect_package_manager(&runner), Some(PackageManager::Homebrew));

        let runner = ScriptedRunner::new().with_programs(&["yum", "dnf", "apt-get"]);
        assert_eq!(detect_package_manager(&runner), Some(PackageManager::Apt));

        let runner = ScriptedRunner::new().with_programs(&["yum", "dnf"]);
        assert_eq!(detect_package_manager(&runner), Some(PackageManager::Dnf));

        let runner = ScriptedRunner::new().with_programs(&["yum"]);
        assert_eq!(detect_package_manager(&runner), Some(PackageManager::Yum));

        let runner = ScriptedRunner::new();
        assert_eq!(detect_package_manager(&runner), None);
    }

    #[test]
    fn no_package_manager_is_tool_missing() {
        let runner = ScriptedRunner::new();
        let prompt = CountingPrompt::default();
        let settings = Settings::default();
        let ctx = step_context(&runner, &prompt, &settings);

        let err = ensure_cli_present(&ctx).unwrap_err();
        assert!(matches!(err, BootstrapError::ToolMissing(ref t) if t == "gh"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn homebrew_installs_without_sudo() {
        let runner = ScriptedRunner::new()
            .with_programs(&["brew"])
            .provides(&["brew", "install", "gh"], "gh");
        let prompt = CountingPrompt::default();
        let settings = Settings::default();
        let ctx = step_context(&runner, &prompt, &settings);

        let status = ensure_cli_present(&ctx).unwrap();
        assert_eq!(status, CliStatus::Installed(PackageManager::Homebrew));
        assert_eq!(runner.call_lines(), ["brew install gh"]);
    }

    #[test]
    fn apt_runs_repository_setup_under_sudo() {
        let runner = ScriptedRunner::new()
            .with_programs(&["apt-get"])
            .on(
                &["dpkg", "--print-architecture"],
                CommandOutput::success().with_stdout("arm64"),
            )
            .provides(&["sudo", "apt-get", "install"], "gh");
        let prompt = CountingPrompt::default();
        let settings = Settings::default();
        let ctx = step_context(&runner, &prompt, &settings);

        assert_eq!(
            ensure_cli_present(&ctx).unwrap(),
            CliStatus::Installed(PackageManager::Apt)
        );

        let lines = runner.call_lines();
        assert_eq!(lines[0], "dpkg --print-architecture");
        assert!(lines[1..].iter().all(|l| l.starts_with("sudo ")));
        assert_eq!(lines.last().unwrap(), "sudo apt-get install -y gh");

        let tee = runner
            .calls()
            .into_iter()
            .find(|c| c.args.first().map(String::as_str) == Some("tee"))
            .unwrap();
        assert!(tee.stdin.unwrap().contains("arch=arm64"));
    }

    #[test]
    fn root_skips_sudo() {
        let runner = ScriptedRunner::new()
            .as_root()
            .with_programs(&["dnf"])
            .provides(&["dnf", "install", "-y", "gh"], "gh");
        let prompt = CountingPrompt::default();
        let settings = Settings::default();
        let ctx = step_context(&runner, &prompt, &settings);

        ensure_cli_present(&ctx).unwrap();
        assert!(runner.call_lines().iter().all(|l| !l.starts_with("sudo")));
        assert!(runner.ran("dnf config-manager --add-repo"));
    }

    #[test]
    fn installer_failure_stops_the_sequence() {
        let runner = ScriptedRunner::new()
            .with_programs(&["yum"])
            .on(
                &["sudo", "yum-config-manager"],
                CommandOutput::failure(1, "Cannot retrieve repository metadata"),
            );
        let prompt = CountingPrompt::default();
        let settings = Settings::default();
        let ctx = step_context(&runner, &prompt, &settings);

        let err = ensure_cli_present(&ctx).unwrap_err();
        match err {
            BootstrapError::InstallFailed { detail, .. } => {
                assert!(detail.contains("Cannot retrieve repository metadata"));
            }
            other => panic!("expected InstallFailed, got {:?}", other),
        }
        assert!(!runner.ran("sudo yum install -y gh"));
    }

    #[test]
    fn successful_install_without_binary_is_a_failure() {
        let runner = ScriptedRunner::new().with_programs(&["brew"]);
        let prompt = CountingPrompt::default();
        let settings = Settings::default();
        let ctx = step_context(&runner, &prompt, &settings);

        let err = ensure_cli_present(&ctx).unwrap_err();
        assert!(matches!(err, BootstrapError::InstallFailed { .. }));
    }
}
