//! Color-coded status lines and the acknowledgement prompt.

use crate::error::{BootstrapError, Result};
use crate::signals;
use colored::Colorize;
use std::io::{BufRead, Write};
use std::os::fd::AsFd;

/// Severity of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Info => "[INFO]",
            Level::Success => "[SUCCESS]",
            Level::Warning => "[WARNING]",
            Level::Error => "[ERROR]",
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Level::Warning | Level::Error)
    }
}

/// Render a status line, optionally colorizing the tag.
pub fn format_line(level: Level, message: &str, color: bool) -> String {
    let tag = level.tag();
    if !color {
        return format!("{} {}", tag, message);
    }
    let tag = match level {
        Level::Info => tag.blue(),
        Level::Success => tag.green(),
        Level::Warning => tag.yellow(),
        Level::Error => tag.red().bold(),
    };
    format!("{} {}", tag, message)
}

/// Writes progress to the terminal.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    color: bool,
}

impl Console {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn say(&self, level: Level, message: &str) {
        let line = format_line(level, message, self.color);
        if level.to_stderr() {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    pub fn info(&self, message: &str) {
        self.say(Level::Info, message);
    }

    pub fn success(&self, message: &str) {
        self.say(Level::Success, message);
    }

    pub fn warning(&self, message: &str) {
        self.say(Level::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.say(Level::Error, message);
    }

    /// Print a multi-line advisory block under an error.
    pub fn advise(&self, text: &str) {
        for line in text.lines() {
            eprintln!("  {}", line);
        }
    }
}

/// Blocks until the user acknowledges a message.
pub trait Prompt {
    fn wait_for_enter(&self, message: &str) -> Result<()>;
}

/// Reads the acknowledgement from standard input. No timeout; a termination
/// signal aborts the wait.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn wait_for_enter(&self, message: &str) -> Result<()> {
        use nix::errno::Errno;
        use nix::poll::{PollFd, PollFlags, PollTimeout, poll};

        print!("{} ", message);
        std::io::stdout()
            .flush()
            .map_err(|e| BootstrapError::io("failed to write prompt", e))?;

        let stdin = std::io::stdin();
        loop {
            signals::check()?;
            let mut fds = [PollFd::new(stdin.as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, PollTimeout::from(100u16)) {
                Ok(0) | Err(Errno::EINTR) => continue,
                Ok(_) => break,
                Err(e) => return Err(BootstrapError::io("failed to wait for input", e.into())),
            }
        }

        let mut line = String::new();
        stdin
            .lock()
            .read_line(&mut line)
            .map_err(|e| BootstrapError::io("failed to read input", e))?;
        Ok(())
    }
}
