//! Termination signal capture.
//!
//! The handler records the signal number and returns. Long-running waits
//! poll [`pending`] and unwind with `BootstrapError::Interrupted`, so the
//! workspace guard is dropped before the process exits. Handlers are reset
//! to their defaults in child processes on exec.

use crate::error::{BootstrapError, Result};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::Pid;
use std::sync::atomic::{AtomicI32, Ordering};

/// Signals that abort the bootstrap.
pub const HANDLED: [Signal; 3] = [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP];

static RECEIVED: AtomicI32 = AtomicI32::new(0);

extern "C" fn record(signal: nix::libc::c_int) {
    RECEIVED.store(signal, Ordering::SeqCst);
}

/// Install the recording handler for every signal in [`HANDLED`].
pub fn install() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(record),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for sig in HANDLED {
        // SAFETY: the handler performs a single atomic store, which is async-signal-safe.
        unsafe { signal::sigaction(sig, &action) }.map_err(|e| {
            BootstrapError::io(
                format!("failed to install {} handler", sig.as_str()),
                e.into(),
            )
        })?;
    }
    Ok(())
}

/// The most recent termination signal received, if any.
pub fn pending() -> Option<i32> {
    match RECEIVED.load(Ordering::SeqCst) {
        0 => None,
        n => Some(n),
    }
}

/// Fail with `Interrupted` if a termination signal has arrived.
pub fn check() -> Result<()> {
    match pending() {
        Some(signal) => Err(BootstrapError::Interrupted(signal)),
        None => Ok(()),
    }
}

/// Deliver `signal` to the child process `pid`. Errors are ignored since the
/// child may already have exited.
pub fn forward(pid: u32, signal: i32) {
    let Ok(sig) = Signal::try_from(signal) else {
        return;
    };
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    let _ = signal::kill(Pid::from_raw(raw), sig);
}

#[cfg(test)]
pub(crate) fn set_pending(signal: i32) {
    RECEIVED.store(signal, Ordering::SeqCst);
}
