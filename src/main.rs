//! ghboot: bootstrap a private GitHub repository's installer.
//!
//! This is the main entry point for the `ghboot` CLI. It parses arguments,
//! resolves settings, runs the bootstrap steps and maps the outcome to an
//! exit status.

mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod exit_codes;
pub mod fallback;
pub mod orchestrator;
pub mod process;
pub mod signals;
pub mod steps;

#[cfg(test)]
mod test_support;

use cli::Cli;
use clap::Parser;
use config::Settings;
use console::{Console, StdinPrompt};
use error::Result;
use orchestrator::{Invocation, Orchestrator};
use process::SystemRunner;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                exit_codes::FAILURE
            } else {
                exit_codes::SUCCESS
            };
            return exit_code(code);
        }
    };

    init_logging(cli.verbose);
    let settings = Settings::resolve(&cli, |key| std::env::var(key).ok());
    let console = Console::new(settings.color);

    match run(&cli, &settings) {
        Ok(status) => exit_code(status),
        Err(err) => {
            console.error(&err.to_string());
            if let Some(advice) = err.remediation() {
                console.advise(&advice);
            }
            exit_code(err.exit_code())
        }
    }
}

fn run(cli: &Cli, settings: &Settings) -> Result<i32> {
    let invocation = Invocation::parse(cli.repository(), cli.trailing())?;
    signals::install()?;
    Orchestrator::new(settings, &SystemRunner, &StdinPrompt).run(&invocation)
}

fn init_logging(verbose: bool) {
    let env = env_logger::Env::new().filter_or(config::LOG_ENV, "warn");
    let mut builder = env_logger::Builder::from_env(env);
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn exit_code(status: i32) -> ExitCode {
    ExitCode::from(u8::try_from(status).unwrap_or(exit_codes::FAILURE as u8))
}
