//! # Compiler
//!
//! This module turns a raw command document (a nested JSON/TOML mapping) into an
//! immutable [`CommandTree`]. The dynamic shape of the document, where reserved keys
//! (`help`, `cmd`, `args`) sit next to child command names, is decoded exactly once
//! here; everything downstream works on typed nodes and a closed `Action` enum.

use crate::{
    constants::{
        ARGS_KEY, BACK_COMMAND, BRIEF_HELP_TOKEN, CMD_KEY, DEFAULT_MAX_DEPTH, EXIT_COMMAND,
        FUNC_KEY, HELP_COMMAND, HELP_KEY, LIST_TOKEN, METHOD_KEY, QUIT_COMMAND, SHELL_ESCAPE,
        SHELL_KEY, SUBTREE_FILE_KEY, SUBTREE_INTRO_KEY, SUBTREE_KEY, SUBTREE_PROMPT_KEY,
        SUBTREE_TREE_KEY,
    },
    core::{
        document::{DocumentSource, SourceError},
        paths,
    },
    models::{Action, ArgKind, ArgSpec, ArgValue, CommandNode, CommandTree, SubtreeSpec},
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::{collections::HashSet, path::PathBuf};
use thiserror::Error;

lazy_static! {
    // Accepts "<10-100>", "10-100" and negative bounds such as "<-5-5>".
    static ref RANGE_RE: Regex = Regex::new(r"^\s*<?\s*(-?\d+)\s*-\s*(-?\d+)\s*>?\s*$").unwrap();
}

const ACTION_KEYS: &[&str] = &[SHELL_KEY, FUNC_KEY, METHOD_KEY, SUBTREE_KEY];
const ARG_SPEC_KEYS: &[&str] = &["help", "default", "type", "range", "pattern", "enum"];
const ROOT_PATH: &str = "<root>";

/// Structural errors found while compiling a command document.
/// Every variant carries the `/`-separated path of the offending node.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CompileError {
    #[error("Malformed action at '{path}': {reason}")]
    MalformedAction { path: String, reason: String },
    #[error("Malformed argument '{name}' at '{path}': {reason}")]
    MalformedArgument {
        path: String,
        name: String,
        reason: String,
    },
    #[error("Malformed node at '{path}': {reason}")]
    MalformedNode { path: String, reason: String },
    #[error("Duplicate name '{name}' at '{path}'")]
    DuplicateName { path: String, name: String },
    #[error("Command tree is cyclic or deeper than {limit} levels at '{path}'")]
    CyclicOrTooDeep { path: String, limit: usize },
}

/// Either half of "load a document, then compile it" can fail.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Knobs for a single compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Maximum nesting depth of command nodes below the root.
    pub max_depth: usize,
    /// Directory that relative `subtree` file references resolve against.
    pub base_dir: Option<PathBuf>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            base_dir: None,
        }
    }
}

// --- PUBLIC COMPILER API ---

/// Loads a document from `source` and compiles it into a tree.
///
/// # Arguments
///
/// * `source` - Where the raw document lives.
/// * `prompt` - Prompt shown while this tree is active.
/// * `intro` - Optional text displayed when the tree becomes active.
/// * `max_depth` - Recursion ceiling for the compiler.
pub fn load_tree(
    source: &DocumentSource,
    prompt: impl Into<String>,
    intro: Option<String>,
    max_depth: usize,
) -> Result<CommandTree, LoadError> {
    let document = source.load()?;
    let options = CompileOptions {
        max_depth,
        base_dir: source.base_dir(),
    };
    Ok(compile_tree(&document, prompt, intro, &options)?)
}

/// Compiles a raw document into a [`CommandTree`].
///
/// # Arguments
///
/// * `document` - The raw mapping; top-level keys are the root commands.
/// * `prompt` - Prompt shown while this tree is active.
/// * `intro` - Optional text displayed when the tree becomes active.
/// * `options` - Depth ceiling and base directory for subtree references.
///
/// # Returns
///
/// The compiled tree, or the first structural error encountered.
pub fn compile_tree(
    document: &Value,
    prompt: impl Into<String>,
    intro: Option<String>,
    options: &CompileOptions,
) -> Result<CommandTree, CompileError> {
    let map = document.as_object().ok_or_else(|| CompileError::MalformedNode {
        path: ROOT_PATH.to_string(),
        reason: "the document root must be a mapping".to_string(),
    })?;

    for reserved in [CMD_KEY, ARGS_KEY] {
        if map.contains_key(reserved) {
            return Err(CompileError::MalformedNode {
                path: ROOT_PATH.to_string(),
                reason: format!("the root cannot declare '{}'", reserved),
            });
        }
    }

    let mut path = Vec::new();
    let root = CommandNode {
        name: String::new(),
        help: compile_help(map, &path)?,
        children: compile_children(map, &mut path, 0, options)?,
        args: Vec::new(),
        action: None,
    };

    log::debug!(
        "Compiled command tree with {} top-level commands.",
        root.children.len()
    );

    Ok(CommandTree {
        root,
        prompt: prompt.into(),
        intro,
    })
}

// --- NODE COMPILATION ---

fn compile_children(
    map: &Map<String, Value>,
    path: &mut Vec<String>,
    depth: usize,
    options: &CompileOptions,
) -> Result<Vec<CommandNode>, CompileError> {
    let mut seen = HashSet::new();
    let mut children = Vec::new();

    for (name, value) in map {
        if is_reserved(name) {
            continue;
        }
        if name.trim().is_empty() {
            return Err(CompileError::MalformedNode {
                path: join_path(path),
                reason: "command names cannot be empty".to_string(),
            });
        }
        if let Some(reason) = reserved_name(name, path.is_empty()) {
            return Err(CompileError::MalformedNode {
                path: join_path(path),
                reason,
            });
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(CompileError::DuplicateName {
                path: join_path(path),
                name: name.clone(),
            });
        }

        path.push(name.clone());
        let child = compile_node(name, value, path, depth + 1, options)?;
        path.pop();
        children.push(child);
    }

    Ok(children)
}

fn compile_node(
    name: &str,
    value: &Value,
    path: &mut Vec<String>,
    depth: usize,
    options: &CompileOptions,
) -> Result<CommandNode, CompileError> {
    if depth > options.max_depth {
        return Err(CompileError::CyclicOrTooDeep {
            path: join_path(path),
            limit: options.max_depth,
        });
    }

    let map = value.as_object().ok_or_else(|| CompileError::MalformedNode {
        path: join_path(path),
        reason: format!("expected a mapping, found {}", describe_value(value)),
    })?;

    let action = map
        .get(CMD_KEY)
        .map(|cmd| compile_action(cmd, path, options))
        .transpose()?;

    let args = match map.get(ARGS_KEY) {
        Some(args) => {
            if action.is_none() {
                log::warn!(
                    "'{}' declares arguments but no 'cmd'; they will never be bound.",
                    join_path(path)
                );
            }
            compile_args(args, path)?
        }
        None => Vec::new(),
    };

    Ok(CommandNode {
        name: name.to_string(),
        help: compile_help(map, path)?,
        children: compile_children(map, path, depth, options)?,
        args,
        action,
    })
}

fn compile_help(map: &Map<String, Value>, path: &[String]) -> Result<Option<String>, CompileError> {
    match map.get(HELP_KEY) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(CompileError::MalformedNode {
            path: join_path(path),
            reason: format!("'help' must be a string, found {}", describe_value(other)),
        }),
    }
}

// --- ACTION COMPILATION ---

fn compile_action(
    cmd: &Value,
    path: &[String],
    options: &CompileOptions,
) -> Result<Action, CompileError> {
    let malformed = |reason: String| CompileError::MalformedAction {
        path: join_path(path),
        reason,
    };

    let map = cmd
        .as_object()
        .ok_or_else(|| malformed(format!("'cmd' must be a mapping, found {}", describe_value(cmd))))?;

    if let Some(unknown) = map.keys().find(|key| !ACTION_KEYS.contains(&key.as_str())) {
        return Err(malformed(format!(
            "unknown action '{}' (expected one of: {})",
            unknown,
            ACTION_KEYS.join(", ")
        )));
    }

    let mut entries = map.iter();
    let (key, value) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        (None, _) => return Err(malformed("'cmd' declares no action".to_string())),
        (Some(_), Some(_)) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            return Err(malformed(format!(
                "'cmd' must contain exactly one action, found: {}",
                keys.join(", ")
            )));
        }
    };

    match key.as_str() {
        SHELL_KEY => Ok(Action::Shell(string_list(value).map_err(malformed)?)),
        FUNC_KEY => Ok(Action::Func(string_list(value).map_err(malformed)?)),
        METHOD_KEY => match value.as_str() {
            Some(name) if !name.trim().is_empty() => Ok(Action::Method(name.trim().to_string())),
            _ => Err(malformed("'method' must be a non-empty string".to_string())),
        },
        _ => compile_subtree(value, options).map(Action::Subtree).map_err(malformed),
    }
}

/// Accepts either a single string or a non-empty list of strings.
fn string_list(value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| format!("expected a string, found {}", describe_value(item)))
            })
            .collect(),
        other => Err(format!(
            "expected a string or a non-empty list of strings, found {}",
            describe_value(other)
        )),
    }
}

fn compile_subtree(value: &Value, options: &CompileOptions) -> Result<SubtreeSpec, String> {
    let resolve = |raw: &str| {
        let path = paths::expand_path(raw);
        match &options.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    };

    match value {
        Value::String(file) => Ok(SubtreeSpec {
            source: DocumentSource::File(resolve(file)),
            prompt: None,
            intro: None,
        }),
        Value::Object(map) => {
            let allowed = [
                SUBTREE_FILE_KEY,
                SUBTREE_TREE_KEY,
                SUBTREE_PROMPT_KEY,
                SUBTREE_INTRO_KEY,
            ];
            if let Some(unknown) = map.keys().find(|key| !allowed.contains(&key.as_str())) {
                return Err(format!("unknown subtree key '{}'", unknown));
            }

            let source = match (map.get(SUBTREE_FILE_KEY), map.get(SUBTREE_TREE_KEY)) {
                (Some(Value::String(file)), None) => DocumentSource::File(resolve(file)),
                (None, Some(tree)) if tree.is_object() => DocumentSource::Inline {
                    document: tree.clone(),
                    base_dir: options.base_dir.clone(),
                },
                (Some(_), Some(_)) => {
                    return Err("a subtree takes either 'file' or 'tree', not both".to_string());
                }
                (None, None) => return Err("a subtree needs a 'file' or a 'tree'".to_string()),
                _ => {
                    return Err(
                        "subtree 'file' must be a string and 'tree' a mapping".to_string()
                    );
                }
            };

            Ok(SubtreeSpec {
                source,
                prompt: optional_string(map, SUBTREE_PROMPT_KEY)?,
                intro: optional_string(map, SUBTREE_INTRO_KEY)?,
            })
        }
        other => Err(format!(
            "'subtree' must be a file path or a mapping, found {}",
            describe_value(other)
        )),
    }
}

fn optional_string(map: &Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(format!(
            "'{}' must be a string, found {}",
            key,
            describe_value(other)
        )),
    }
}

// --- ARGUMENT COMPILATION ---

fn compile_args(args: &Value, path: &[String]) -> Result<Vec<ArgSpec>, CompileError> {
    let map = args.as_object().ok_or_else(|| CompileError::MalformedNode {
        path: join_path(path),
        reason: format!("'args' must be a mapping, found {}", describe_value(args)),
    })?;

    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(map.len());

    for (name, value) in map {
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(CompileError::DuplicateName {
                path: join_path(path),
                name: name.clone(),
            });
        }

        let spec = match value {
            // Shorthand: a bare string is the help of a required string argument.
            Value::String(help) => ArgSpec {
                name: name.clone(),
                help: Some(help.clone()),
                default: None,
                kind: ArgKind::String,
            },
            Value::Object(spec) => compile_arg_spec(name, spec).map_err(|reason| {
                CompileError::MalformedArgument {
                    path: join_path(path),
                    name: name.clone(),
                    reason,
                }
            })?,
            other => {
                return Err(CompileError::MalformedArgument {
                    path: join_path(path),
                    name: name.clone(),
                    reason: format!(
                        "expected a help string or a mapping, found {}",
                        describe_value(other)
                    ),
                });
            }
        };
        specs.push(spec);
    }

    Ok(specs)
}

fn compile_arg_spec(name: &str, spec: &Map<String, Value>) -> Result<ArgSpec, String> {
    if let Some(unknown) = spec.keys().find(|key| !ARG_SPEC_KEYS.contains(&key.as_str())) {
        return Err(format!("unknown key '{}'", unknown));
    }

    let default = spec.get("default").map(scalar_to_value).transpose()?;

    Ok(ArgSpec {
        name: name.to_string(),
        help: optional_string(spec, "help")?,
        default,
        kind: compile_arg_kind(spec)?,
    })
}

fn compile_arg_kind(spec: &Map<String, Value>) -> Result<ArgKind, String> {
    let data_keys: Vec<&str> = ["range", "pattern", "enum"]
        .into_iter()
        .filter(|key| spec.contains_key(*key))
        .collect();

    let data_key = match data_keys.as_slice() {
        [] => None,
        [key] => Some(*key),
        _ => {
            return Err(format!(
                "only one of range/pattern/enum may be given, found: {}",
                data_keys.join(", ")
            ));
        }
    };

    let declared_type = optional_string(spec, "type")?;

    match (declared_type.as_deref(), data_key) {
        (None | Some("string"), None) => Ok(ArgKind::String),
        (Some("path"), None) => Ok(ArgKind::Path),
        (Some(t @ ("range" | "pattern" | "enum")), None) => {
            Err(format!("type '{}' needs a '{}' key", t, t))
        }
        (Some(t), Some(key)) if t != key => Err(format!(
            "type '{}' conflicts with the '{}' key",
            t, key
        )),
        (_, Some("range")) => parse_range(spec.get("range")),
        (_, Some("pattern")) => parse_pattern(spec.get("pattern")),
        (_, Some(_)) => parse_enum(spec.get("enum")),
        (Some(other), None) => Err(format!(
            "unknown type '{}' (expected string, path, range, pattern or enum)",
            other
        )),
    }
}

fn parse_range(value: Option<&Value>) -> Result<ArgKind, String> {
    let (low, high) = match value {
        Some(Value::String(s)) => {
            let caps = RANGE_RE
                .captures(s)
                .ok_or_else(|| format!("invalid range '{}' (expected '<low-high>')", s))?;
            let bound = |i: usize| {
                caps.get(i)
                    .map_or("", |m| m.as_str())
                    .parse::<i64>()
                    .map_err(|e| format!("invalid range bound in '{}': {}", s, e))
            };
            (bound(1)?, bound(2)?)
        }
        Some(Value::Array(items)) => match items.as_slice() {
            [low, high] => match (low.as_i64(), high.as_i64()) {
                (Some(low), Some(high)) => (low, high),
                _ => return Err("range bounds must be integers".to_string()),
            },
            _ => return Err("a range list must be exactly [low, high]".to_string()),
        },
        _ => return Err("range must be a '<low-high>' string or a [low, high] list".to_string()),
    };

    if low > high {
        return Err(format!("range lower bound {} exceeds upper bound {}", low, high));
    }
    Ok(ArgKind::Range { low, high })
}

fn parse_pattern(value: Option<&Value>) -> Result<ArgKind, String> {
    let pattern = value
        .and_then(Value::as_str)
        .ok_or_else(|| "pattern must be a string".to_string())?;
    // Anchored so the whole value has to match, not just a substring.
    Regex::new(&format!("^(?:{})$", pattern))
        .map(ArgKind::Pattern)
        .map_err(|e| format!("invalid pattern '{}': {}", pattern, e))
}

fn parse_enum(value: Option<&Value>) -> Result<ArgKind, String> {
    match value {
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|item| scalar_to_value(item).map(|v| v.to_string()))
            .collect::<Result<Vec<_>, _>>()
            .map(ArgKind::Enum),
        _ => Err("enum must be a non-empty list".to_string()),
    }
}

fn scalar_to_value(value: &Value) -> Result<ArgValue, String> {
    match value {
        Value::String(s) => Ok(ArgValue::Text(s.clone())),
        Value::Bool(b) => Ok(ArgValue::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(ArgValue::Integer)
            .or_else(|| n.as_f64().map(ArgValue::Float))
            .ok_or_else(|| format!("unsupported number {}", n)),
        other => Err(format!("expected a scalar, found {}", describe_value(other))),
    }
}

// --- HELPERS ---

fn is_reserved(key: &str) -> bool {
    matches!(key, HELP_KEY | CMD_KEY | ARGS_KEY)
}

/// Names the interpreter answers itself. Built-ins and the shell escape are only
/// looked up as the first word of a line, so they are free below the root.
fn reserved_name(name: &str, at_root: bool) -> Option<String> {
    if name == BRIEF_HELP_TOKEN || name == LIST_TOKEN {
        return Some(format!("'{}' is a reserved name (it lists commands)", name));
    }
    if at_root
        && (matches!(name, HELP_COMMAND | BACK_COMMAND | EXIT_COMMAND | QUIT_COMMAND)
            || name.starts_with(SHELL_ESCAPE))
    {
        return Some(format!("'{}' is a reserved name (built-in command)", name));
    }
    None
}

fn join_path(path: &[String]) -> String {
    if path.is_empty() {
        ROOT_PATH.to_string()
    } else {
        path.join("/")
    }
}

fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
