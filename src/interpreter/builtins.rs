// src/interpreter/builtins.rs

use super::{CommandError, Interpreter, Outcome};
use crate::{
    constants::{BACK_COMMAND, EXIT_COMMAND, HELP_COMMAND, QUIT_COMMAND, SHELL_ESCAPE},
    core::{
        dispatcher::DispatchError,
        help::{self, ListingEntry},
        mode_manager::Mode,
    },
    models::CommandNode,
    system::executor,
};

// --- Built-in Definition and Registry ---

/// A command answered by the interpreter itself, in every mode.
#[derive(Debug)]
pub struct BuiltinDefinition {
    pub name: &'static str,
    pub help: &'static str,
    pub handler: fn(&mut Interpreter, &[String]) -> Result<Outcome, CommandError>,
}

/// Checked before the active tree, so these names shadow tree commands.
pub static BUILTIN_REGISTRY: &[BuiltinDefinition] = &[
    BuiltinDefinition {
        name: HELP_COMMAND,
        help: "show detailed help for a command path",
        handler: handle_help,
    },
    BuiltinDefinition {
        name: BACK_COMMAND,
        help: "leave the current sub-mode",
        handler: handle_back,
    },
    BuiltinDefinition {
        name: EXIT_COMMAND,
        help: "leave the current sub-mode, or the interpreter in normal mode",
        handler: handle_exit,
    },
    BuiltinDefinition {
        name: QUIT_COMMAND,
        help: "leave the interpreter",
        handler: handle_quit,
    },
];

const SHELL_ESCAPE_HELP: &str = "run the rest of the line with the system shell";

pub fn find(name: &str) -> Option<&'static BuiltinDefinition> {
    BUILTIN_REGISTRY.iter().find(|builtin| builtin.name == name)
}

/// Listing rows for the built-ins, shell escape included.
pub fn listing() -> Vec<ListingEntry> {
    BUILTIN_REGISTRY
        .iter()
        .map(|builtin| ListingEntry::new(builtin.name, builtin.help))
        .chain(std::iter::once(ListingEntry::new(
            SHELL_ESCAPE,
            SHELL_ESCAPE_HELP,
        )))
        .collect()
}

// --- Handlers ---

fn handle_quit(_: &mut Interpreter, _: &[String]) -> Result<Outcome, CommandError> {
    Ok(Outcome::Quit)
}

fn handle_exit(interpreter: &mut Interpreter, _: &[String]) -> Result<Outcome, CommandError> {
    match interpreter.modes().mode() {
        Mode::Normal => Ok(Outcome::Quit),
        Mode::SubMode { .. } => interpreter.leave_mode(),
    }
}

fn handle_back(interpreter: &mut Interpreter, _: &[String]) -> Result<Outcome, CommandError> {
    interpreter.leave_mode()
}

/// `help` alone lists the active tree and the built-ins. `help <path>` describes
/// one command; partial names are accepted when they are unambiguous.
fn handle_help(interpreter: &mut Interpreter, args: &[String]) -> Result<Outcome, CommandError> {
    let tree = interpreter.active_tree();

    if args.is_empty() {
        let mut text = help::render_listing(&help::listing(&tree.root, ""));
        text.push_str("\nBuilt-in commands:\n");
        text.push_str(&help::render_listing(&listing()));
        return Ok(Outcome::Output(text));
    }

    let (names, node) = walk_path(&tree.root, args)?;
    Ok(Outcome::Output(help::detailed_help(&names, node)))
}

/// Follows `path` from `root`, expanding unique prefixes. Returns the full names walked.
fn walk_path<'t>(
    root: &'t CommandNode,
    path: &[String],
) -> Result<(Vec<String>, &'t CommandNode), CommandError> {
    let mut node = root;
    let mut names = Vec::with_capacity(path.len());

    for token in path {
        node = match node.child(token) {
            Some(child) => child,
            None => {
                let candidates: Vec<&CommandNode> = node.children_with_prefix(token).collect();
                match candidates.as_slice() {
                    [only] => *only,
                    [] => return Err(CommandError::NotFound(token.clone())),
                    many => {
                        return Err(CommandError::Ambiguous(
                            many.iter().map(|child| child.name.clone()).collect(),
                        ));
                    }
                }
            }
        };
        names.push(node.name.clone());
    }
    Ok((names, node))
}

/// Runs a command line with the terminal attached. A non-zero exit is reported as a
/// failed command with no captured output.
pub fn shell_escape(command_line: &str) -> Result<Outcome, CommandError> {
    let status = executor::run_attached(command_line).map_err(DispatchError::from)?;
    if status.success() {
        Ok(Outcome::Output(String::new()))
    } else {
        Err(DispatchError::ShellCommandFailed {
            command: command_line.trim().to_string(),
            code: status.code().unwrap_or(-1),
            output: String::new(),
        }
        .into())
    }
}
