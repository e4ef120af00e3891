//! Ordered fallback chains.
//!
//! A chain tries each strategy in turn. The first success short-circuits the
//! rest; every failure is recorded so an exhausted chain can report all of
//! them at once. Hard errors (interrupts, I/O) abort the chain immediately.

use crate::error::Result;

/// Outcome of a single strategy attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    /// The strategy worked and produced a value.
    Done(T),
    /// The strategy did not apply or failed; move on to the next one.
    Failed(String),
}

/// A strategy that failed, with its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure<S> {
    pub strategy: S,
    pub reason: String,
}

/// Result of running a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chain<S, T> {
    Succeeded {
        strategy: S,
        value: T,
        failures: Vec<Failure<S>>,
    },
    Exhausted(Vec<Failure<S>>),
}

impl<S, T> Chain<S, T> {
    pub fn failures(&self) -> &[Failure<S>] {
        match self {
            Chain::Succeeded { failures, .. } => failures,
            Chain::Exhausted(failures) => failures,
        }
    }
}

/// Try `strategies` in order with `attempt`, stopping at the first success.
pub fn first_success<S, T, I, F>(strategies: I, mut attempt: F) -> Result<Chain<S, T>>
where
    I: IntoIterator<Item = S>,
    F: FnMut(&S) -> Result<Attempt<T>>,
{
    let mut failures = Vec::new();
    for strategy in strategies {
        match attempt(&strategy)? {
            Attempt::Done(value) => {
                return Ok(Chain::Succeeded {
                    strategy,
                    value,
                    failures,
                });
            }
            Attempt::Failed(reason) => failures.push(Failure { strategy, reason }),
        }
    }
    Ok(Chain::Exhausted(failures))
}
