use crate::config::Settings;
use crate::console::{Console, Prompt};
use crate::error::Result;
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use crate::steps::StepContext;
use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

type Handler = Box<dyn FnMut(&CommandSpec) -> CommandOutput>;

struct Rule {
    prefix: Vec<String>,
    handler: Handler,
    provides: Option<String>,
}

impl Rule {
    fn matches(&self, spec: &CommandSpec) -> bool {
        let words: Vec<&str> = std::iter::once(spec.program.as_str())
            .chain(spec.args.iter().map(String::as_str))
            .collect();
        words.len() >= self.prefix.len()
            && self.prefix.iter().zip(&words).all(|(p, w)| p == w)
    }
}

/// Runner that records every command and answers from scripted rules.
///
/// Rules match on a word prefix of `program args...`; the most recently
/// added matching rule wins. Unmatched commands succeed with empty output.
pub(crate) struct ScriptedRunner {
    rules: RefCell<Vec<Rule>>,
    calls: RefCell<Vec<CommandSpec>>,
    on_path: RefCell<HashSet<String>>,
    root: bool,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self {
            rules: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            on_path: RefCell::new(HashSet::new()),
            root: false,
        }
    }

    pub(crate) fn as_root(mut self) -> Self {
        self.root = true;
        self
    }

    pub(crate) fn with_programs(self, programs: &[&str]) -> Self {
        self.on_path
            .borrow_mut()
            .extend(programs.iter().map(|p| p.to_string()));
        self
    }

    /// Always answer commands starting with `prefix` with `output`.
    pub(crate) fn on(self, prefix: &[&str], output: CommandOutput) -> Self {
        self.on_fn(prefix, move |_| output.clone())
    }

    /// Answer with successive outputs; the last one repeats.
    pub(crate) fn on_sequence(self, prefix: &[&str], outputs: Vec<CommandOutput>) -> Self {
        let mut queue: VecDeque<CommandOutput> = outputs.into();
        self.on_fn(prefix, move |_| {
            if queue.len() > 1 {
                queue.pop_front().unwrap_or_default()
            } else {
                queue.front().cloned().unwrap_or_default()
            }
        })
    }

    pub(crate) fn on_fn<F>(self, prefix: &[&str], handler: F) -> Self
    where
        F: FnMut(&CommandSpec) -> CommandOutput + 'static,
    {
        self.rules.borrow_mut().push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            handler: Box::new(handler),
            provides: None,
        });
        self
    }

    /// A successful command starting with `prefix` puts `program` on PATH.
    pub(crate) fn provides(self, prefix: &[&str], program: &str) -> Self {
        self.rules.borrow_mut().push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            handler: Box::new(|_| CommandOutput::success()),
            provides: Some(program.to_string()),
        });
        self
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    /// Rendered command lines, in order.
    pub(crate) fn call_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(CommandSpec::display).collect()
    }

    pub(crate) fn ran(&self, prefix: &str) -> bool {
        self.call_lines().iter().any(|line| line.starts_with(prefix))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(spec.clone());
        let mut rules = self.rules.borrow_mut();
        let Some(rule) = rules.iter_mut().rev().find(|r| r.matches(spec)) else {
            return Ok(CommandOutput::success());
        };
        let output = (rule.handler)(spec);
        if output.is_success()
            && let Some(program) = &rule.provides
        {
            self.on_path.borrow_mut().insert(program.clone());
        }
        Ok(output)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.on_path
            .borrow()
            .contains(program)
            .then(|| Path::new("/usr/bin").join(program))
    }

    fn is_root(&self) -> bool {
        self.root
    }
}

/// Prompt that returns immediately and counts acknowledgements.
#[derive(Default)]
pub(crate) struct CountingPrompt {
    count: Cell<u32>,
}

impl CountingPrompt {
    pub(crate) fn count(&self) -> u32 {
        self.count.get()
    }
}

impl Prompt for CountingPrompt {
    fn wait_for_enter(&self, _message: &str) -> Result<()> {
        self.count.set(self.count.get() + 1);
        Ok(())
    }
}

pub(crate) fn step_context<'a>(
    runner: &'a ScriptedRunner,
    prompt: &'a CountingPrompt,
    settings: &'a Settings,
) -> StepContext<'a> {
    StepContext {
        runner,
        prompt,
        console: Console::new(false),
        settings,
    }
}

/// Write `files` (relative path, contents) under `root`, creating parents.
pub(crate) fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
}
