//! External command runner for ghboot.
//!
//! Every collaborator (the GitHub CLI, package managers, Python, the final
//! installer script) is invoked through [`CommandRunner`], so the bootstrap
//! steps can be exercised against a scripted runner in tests.

use crate::error::{BootstrapError, Result};
use crate::exit_codes;
use crate::signals;
use std::ffi::OsStr;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How the child's standard streams are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Share the terminal with the child (interactive or visible commands).
    Inherit,
    /// Capture stdout and stderr for inspection.
    Capture,
}

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub stdio: StdioMode,
    /// Bytes written to the child's stdin, which is then closed.
    pub stdin: Option<String>,
}

impl CommandSpec {
    /// A captured command with no working directory override.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            stdio: StdioMode::Capture,
            stdin: None,
        }
    }

    pub fn interactive(mut self) -> Self {
        self.stdio = StdioMode::Inherit;
        self
    }

    pub fn in_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Prefix the command with `wrapper` (e.g. `sudo`).
    pub fn wrapped_in(mut self, wrapper: &str) -> Self {
        let program = std::mem::replace(&mut self.program, wrapper.to_string());
        self.args.insert(0, program);
        self
    }

    /// Shell-quoted rendering for logs and diagnostics.
    pub fn display(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }
}

/// Result of running a command to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` if the child was terminated by a signal.
    pub code: Option<i32>,
    /// Terminating signal, if any.
    pub signal: Option<i32>,
    /// Standard output (trimmed, empty unless captured).
    pub stdout: String,
    /// Standard error (trimmed, empty unless captured).
    pub stderr: String,
}

impl CommandOutput {
    #[cfg(test)]
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit status to report for this command when it is the last thing run.
    pub fn exit_status(&self) -> i32 {
        match (self.code, self.signal) {
            (Some(code), _) => code,
            (None, Some(signal)) => exit_codes::for_signal(signal),
            (None, None) => exit_codes::FAILURE,
        }
    }

    /// One-line explanation of a failure: the first `error`/`fatal` line of
    /// stderr (or stdout), else its last line, else the status.
    pub fn failure_reason(&self) -> String {
        let text = if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let flagged = lines.clone().find(|l| {
            let lower = l.to_ascii_lowercase();
            lower.starts_with("error") || lower.starts_with("fatal")
        });
        match flagged.or_else(|| lines.next_back()) {
            Some(line) => line.to_string(),
            None => match (self.code, self.signal) {
                (Some(code), _) => format!("exit code {}", code),
                (None, Some(signal)) => format!("terminated by signal {}", signal),
                (None, None) => "unknown failure".to_string(),
            },
        }
    }
}

/// Executes external commands on behalf of the bootstrap steps.
pub trait CommandRunner {
    /// Run `spec` to completion. A non-zero exit is reported in the output,
    /// not as an error; errors are reserved for spawn failures and interrupts.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// Resolve `program` on the search path.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Whether the current user is root (privileged commands skip `sudo`).
    fn is_root(&self) -> bool;
}

/// Runner that spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        signals::check()?;
        log::debug!("running: {}", spec.display());

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }
        match spec.stdio {
            StdioMode::Inherit => {
                command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            StdioMode::Capture => {
                command.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }
        command.stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });

        let mut child = command.spawn().map_err(|e| {
            BootstrapError::io(format!("failed to execute {}", spec.program), e)
        })?;

        if let Some(input) = &spec.stdin
            && let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(input.as_bytes())
        {
            let _ = child.kill();
            let _ = child.wait();
            return Err(BootstrapError::io(
                format!("failed to write to {}", spec.program),
                e,
            ));
        }

        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);
        let status = wait_interruptibly(&mut child)?;
        let stdout = join_reader(stdout_reader)?;
        let stderr = join_reader(stderr_reader)?;
        let output = CommandOutput {
            code: status.code(),
            signal: terminating_signal(&status),
            stdout,
            stderr,
        };
        log::debug!("{} exited with {:?}", spec.program, output.code);
        Ok(output)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        let path = std::env::var_os("PATH")?;
        locate_in(program, &path)
    }

    fn is_root(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }
}

/// Find an executable named `program` in a `PATH`-style list of directories.
/// A `program` containing a path separator is checked directly.
pub fn locate_in(program: &str, path: &OsStr) -> Option<PathBuf> {
    if program.contains(std::path::MAIN_SEPARATOR) {
        let candidate = PathBuf::from(program);
        return is_executable(&candidate).then_some(candidate);
    }
    std::env::split_paths(path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Wait for the child, forwarding any termination signal we receive.
///
/// SIGINT is not forwarded: a terminal interrupt already reaches the whole
/// foreground process group. The child is always reaped before the caller
/// unwinds with `Interrupted`.
fn wait_interruptibly(child: &mut Child) -> Result<ExitStatus> {
    let mut forwarded = false;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if let Some(signal) = signals::pending() {
                    return Err(BootstrapError::Interrupted(signal));
                }
                return Ok(status);
            }
            Ok(None) => {
                if !forwarded && let Some(signal) = signals::pending() {
                    if signal != nix::libc::SIGINT {
                        log::debug!("forwarding signal {} to child {}", signal, child.id());
                        signals::forward(child.id(), signal);
                    }
                    forwarded = true;
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                return Err(BootstrapError::io("failed to check process status", e));
            }
        }
    }
}

/// Drain a pipe on a separate thread so a chatty child cannot fill it and
/// stall while we poll.
fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_reader(reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<String> {
    let Some(reader) = reader else {
        return Ok(String::new());
    };
    let bytes = reader
        .join()
        .unwrap_or_else(|_| Err(std::io::Error::other("reader thread panicked")))
        .map_err(|e| BootstrapError::io("failed to read command output", e))?;
    Ok(String::from_utf8_lossy(&bytes).trim().to_string())
}

fn terminating_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}
