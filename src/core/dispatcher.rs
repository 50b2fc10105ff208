// src/core/dispatcher.rs

//! Turns a resolved node and its bound arguments into a side effect.
//!
//! Shell actions run through the platform shell. Func and method actions are
//! delegated to host capabilities injected by the embedding program, so the
//! interpreter itself never evaluates code.

use crate::{
    core::interpolator::{self, InterpolationError},
    models::{Action, BoundArgs, CommandNode, SubtreeSpec},
    system::executor::{self, ExecutionError},
};
use anyhow::anyhow;
use std::{collections::HashMap, fmt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Command '{command}' failed with exit code {code}")]
    ShellCommandFailed {
        command: String,
        code: i32,
        /// Everything captured up to and including the failing command.
        output: String,
    },
    #[error(transparent)]
    ShellSpawnFailed(#[from] ExecutionError),
    #[error("Func execution failed: {0:#}")]
    FuncExecutionFailed(anyhow::Error),
    #[error("Method '{0}' is not registered")]
    MethodNotFound(String),
    #[error("Method '{name}' failed: {cause:#}")]
    MethodFailed { name: String, cause: anyhow::Error },
    #[error(transparent)]
    UnboundPlaceholder(#[from] InterpolationError),
    #[error("'{0}' is not a runnable command")]
    NotRunnable(String),
}

/// What a dispatched command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched<'t> {
    /// Text for the display channel. May be empty.
    Output(String),
    /// The command asks to switch to a sub-mode; the caller owns the mode stack.
    EnterSubtree(&'t SubtreeSpec),
}

// --- METHOD REGISTRY ---

/// A host method. It receives the bound arguments and returns its display output.
pub type MethodFn = Box<dyn FnMut(&BoundArgs) -> anyhow::Result<String>>;

/// Named host methods that `method` actions can call.
#[derive(Default)]
pub struct MethodRegistry {
    methods: HashMap<String, MethodFn>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a method under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, method: F)
    where
        F: FnMut(&BoundArgs) -> anyhow::Result<String> + 'static,
    {
        self.methods.insert(name.into(), Box::new(method));
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn call(&mut self, name: &str, args: &BoundArgs) -> Result<String, DispatchError> {
        let method = self
            .methods
            .get_mut(name)
            .ok_or_else(|| DispatchError::MethodNotFound(name.to_string()))?;
        method(args).map_err(|cause| DispatchError::MethodFailed {
            name: name.to_string(),
            cause,
        })
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.names())
            .finish()
    }
}

// --- FUNC HOST ---

/// Executes the opaque statements of a `func` action.
pub trait FuncHost {
    fn run(&mut self, statements: &[String], args: &BoundArgs) -> anyhow::Result<String>;
}

/// Runs each func statement with the platform shell. Bound arguments are exported as
/// environment variables, with `-` in names replaced by `_`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellFuncHost;

impl ShellFuncHost {
    fn environment(args: &BoundArgs) -> HashMap<String, String> {
        args.iter()
            .map(|(name, value)| (name.replace('-', "_"), value.to_string()))
            .collect()
    }
}

impl FuncHost for ShellFuncHost {
    fn run(&mut self, statements: &[String], args: &BoundArgs) -> anyhow::Result<String> {
        let env = Self::environment(args);
        let mut output = String::new();
        for statement in statements {
            let captured = executor::run_and_capture(statement, &env)?;
            output.push_str(&captured.output);
            if !captured.success() {
                return Err(anyhow!(
                    "statement '{}' exited with code {}",
                    statement,
                    captured.exit_code()
                ));
            }
        }
        Ok(output)
    }
}

/// The capabilities that func and method actions are delegated to.
pub struct Hosts {
    pub methods: MethodRegistry,
    pub funcs: Box<dyn FuncHost>,
}

impl Default for Hosts {
    fn default() -> Self {
        Self {
            methods: MethodRegistry::new(),
            funcs: Box::new(ShellFuncHost),
        }
    }
}

impl fmt::Debug for Hosts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hosts")
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

// --- DISPATCH ---

/// Executes the action of `node` with the bound arguments.
///
/// # Arguments
/// * `node` - A runnable node returned by the resolver.
/// * `args` - The arguments bound for it.
/// * `hosts` - Func and method capabilities.
///
/// # Returns
/// The command's output, or a request to enter a sub-mode.
pub fn dispatch<'t>(
    node: &'t CommandNode,
    args: &BoundArgs,
    hosts: &mut Hosts,
) -> Result<Dispatched<'t>, DispatchError> {
    let action = node
        .action
        .as_ref()
        .ok_or_else(|| DispatchError::NotRunnable(node.name.clone()))?;

    match action {
        Action::Shell(templates) => run_shell(templates, args).map(Dispatched::Output),
        Action::Func(statements) => hosts
            .funcs
            .run(statements, args)
            .map(Dispatched::Output)
            .map_err(DispatchError::FuncExecutionFailed),
        Action::Method(name) => hosts.methods.call(name, args).map(Dispatched::Output),
        Action::Subtree(spec) => Ok(Dispatched::EnterSubtree(spec)),
    }
}

/// Renders every template first, then runs them in order, stopping at the first failure.
fn run_shell(templates: &[String], args: &BoundArgs) -> Result<String, DispatchError> {
    let command_lines = interpolator::render_all(templates, args)?;
    let env = HashMap::new();

    let mut output = String::new();
    for command_line in command_lines {
        let captured = executor::run_and_capture(&command_line, &env)?;
        output.push_str(&captured.output);
        if !captured.success() {
            return Err(DispatchError::ShellCommandFailed {
                command: command_line,
                code: captured.exit_code(),
                output,
            });
        }
    }
    Ok(output)
}
