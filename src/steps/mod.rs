//! The bootstrap steps, in execution order.
//!
//! Each step is a free function taking a [`StepContext`] and either returns
//! what the next step needs or fails the whole run.

pub mod access;
pub mod auth;
pub mod cli_install;
pub mod deps;
pub mod fetch;
pub mod launch;

use crate::config::Settings;
use crate::console::{Console, Prompt};
use crate::process::CommandRunner;

/// Collaborators shared by every step.
pub struct StepContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub prompt: &'a dyn Prompt,
    pub console: Console,
    pub settings: &'a Settings,
}
