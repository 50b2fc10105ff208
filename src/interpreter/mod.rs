// src/interpreter/mod.rs

//! # Interpreter
//!
//! Drives one input line through the pipeline: built-ins first, then
//! resolve, bind and dispatch against the active command tree. Sub-mode
//! requests coming out of the dispatcher are applied to the mode stack here.
//!
//! `run` repeats this over a [`LineSource`] until `quit`, or until end of
//! input in normal mode.

pub mod builtins;

use crate::{
    constants::SHELL_ESCAPE,
    core::{
        binder::{self, BindError},
        compiler::{self, LoadError},
        dispatcher::{self, DispatchError, Dispatched, FuncHost, Hosts, MethodRegistry},
        document::DocumentSource,
        help,
        mode_manager::{Mode, ModeError, ModeManager},
        resolver::{self, LineError, Resolution},
    },
    models::CommandTree,
};
use colored::Colorize;
use std::{io, sync::Arc};
use thiserror::Error;

/// Anything that stops a single line from running. None of these end the loop.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Line(#[from] LineError),
    #[error("Unknown command '{0}'")]
    NotFound(String),
    #[error("Ambiguous command, candidates: {}", .0.join(", "))]
    Ambiguous(Vec<String>),
    #[error("Incomplete command '{0}', type '?' to list its sub-commands")]
    Incomplete(String),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Mode(#[from] ModeError),
}

/// What happened after a line ran successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Text for the display channel (possibly empty).
    Output(String),
    /// A sub-mode became active; its intro, if any, should be shown.
    EnteredMode { intro: Option<String> },
    /// The previous tree is active again.
    LeftMode,
    /// The interpreter should stop.
    Quit,
}

/// Supplies input lines to the interpreter loop.
pub trait LineSource {
    /// Reads one line shown with `prompt`. `tree` is the tree answering commands, for
    /// completion. `Ok(None)` means end of input.
    fn read_line(&mut self, prompt: &str, tree: &Arc<CommandTree>) -> io::Result<Option<String>>;
}

#[derive(Debug)]
pub struct Interpreter {
    modes: ModeManager,
    hosts: Hosts,
}

impl Interpreter {
    /// Creates an interpreter over an already compiled tree, with the default hosts.
    pub fn new(tree: CommandTree, max_depth: usize) -> Self {
        Self::with_hosts(tree, Hosts::default(), max_depth)
    }

    pub fn with_hosts(tree: CommandTree, hosts: Hosts, max_depth: usize) -> Self {
        Self {
            modes: ModeManager::new(tree, max_depth),
            hosts,
        }
    }

    /// Loads and compiles a document, then creates an interpreter over it.
    pub fn from_source(
        source: &DocumentSource,
        prompt: impl Into<String>,
        intro: Option<String>,
        max_depth: usize,
    ) -> Result<Self, LoadError> {
        let tree = compiler::load_tree(source, prompt, intro, max_depth)?;
        Ok(Self::new(tree, max_depth))
    }

    /// Host methods callable from `method` actions.
    pub fn methods_mut(&mut self) -> &mut MethodRegistry {
        &mut self.hosts.methods
    }

    /// Replaces the host that runs `func` statements.
    pub fn set_func_host(&mut self, host: Box<dyn FuncHost>) {
        self.hosts.funcs = host;
    }

    pub fn modes(&self) -> &ModeManager {
        &self.modes
    }

    pub fn active_tree(&self) -> Arc<CommandTree> {
        Arc::clone(self.modes.active())
    }

    /// Runs one input line.
    ///
    /// A failed line leaves the active tree and the mode stack as they were.
    pub fn execute_line(&mut self, line: &str) -> Result<Outcome, CommandError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Outcome::Output(String::new()));
        }
        if let Some(command_line) = trimmed.strip_prefix(SHELL_ESCAPE) {
            return builtins::shell_escape(command_line);
        }

        let tokens = resolver::tokenize(trimmed)?;
        if let Some((first, args)) = tokens.split_first()
            && let Some(builtin) = builtins::find(first)
        {
            log::debug!("Running built-in '{}'.", builtin.name);
            return (builtin.handler)(self, args);
        }

        // The tree is held by its own `Arc` so the mode stack can change below.
        let tree = self.active_tree();
        match resolver::resolve(&tree, &tokens) {
            Resolution::Matched { node, rest } => {
                let args = binder::bind(node, &rest)?;
                match dispatcher::dispatch(node, &args, &mut self.hosts)? {
                    Dispatched::Output(text) => Ok(Outcome::Output(text)),
                    Dispatched::EnterSubtree(spec) => {
                        let entered = self.modes.enter(spec)?;
                        Ok(Outcome::EnteredMode {
                            intro: entered.intro.clone(),
                        })
                    }
                }
            }
            Resolution::Describe { node, prefix } => Ok(Outcome::Output(help::render_listing(
                &help::listing(node, &prefix),
            ))),
            Resolution::Ambiguous(candidates) => Err(CommandError::Ambiguous(candidates)),
            Resolution::NotFound(token) => Err(CommandError::NotFound(token)),
            Resolution::Incomplete(node) => Err(CommandError::Incomplete(node.name.clone())),
        }
    }

    /// Leaves the current sub-mode. In normal mode this reports that there is nothing
    /// to leave.
    pub fn leave_mode(&mut self) -> Result<Outcome, CommandError> {
        self.modes.exit()?;
        Ok(Outcome::LeftMode)
    }

    /// Reads and runs lines until `quit`, or until end of input in normal mode.
    /// End of input inside a sub-mode leaves that sub-mode.
    ///
    /// Only failures to write to `out` or to read from `source` end the loop early.
    pub fn run(&mut self, source: &mut dyn LineSource, out: &mut dyn io::Write) -> io::Result<()> {
        if let Some(intro) = &self.modes.active().intro {
            writeln!(out, "{}", intro.green())?;
        }

        loop {
            let tree = self.active_tree();
            let Some(line) = source.read_line(&tree.prompt, &tree)? else {
                if self.modes.mode() == Mode::Normal {
                    log::debug!("End of input, leaving the interpreter.");
                    break;
                }
                self.modes.exit().ok();
                continue;
            };

            match self.execute_line(&line) {
                Ok(Outcome::Quit) => break,
                Ok(Outcome::Output(text)) => write_block(out, &text)?,
                Ok(Outcome::EnteredMode { intro }) => {
                    if let Some(intro) = intro {
                        writeln!(out, "{}", intro.green())?;
                    }
                }
                Ok(Outcome::LeftMode) => {}
                Err(e) => report(out, &e)?,
            }
        }
        Ok(())
    }
}

/// Writes command output, ending it with a newline if it lacks one.
fn write_block(out: &mut dyn io::Write, text: &str) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    write!(out, "{}", text)?;
    if !text.ends_with('\n') {
        writeln!(out)?;
    }
    Ok(())
}

fn report(out: &mut dyn io::Write, error: &CommandError) -> io::Result<()> {
    log::debug!("Command failed: {:?}", error);
    writeln!(out, "{} {}", "**".red().bold(), error)?;
    if let CommandError::Dispatch(DispatchError::ShellCommandFailed { output, .. }) = error {
        write_block(out, output)?;
    }
    Ok(())
}
