// src/models.rs

use crate::core::document::DocumentSource;
use regex::Regex;
use std::fmt;

// --- COMPILED COMMAND TREE ---
// These are produced once per document load by the compiler and never mutated afterwards.

/// A named point in the command tree: a namespace, a runnable command, or both.
#[derive(Debug, Clone, Default)]
pub struct CommandNode {
    pub name: String,
    pub help: Option<String>,
    /// Children in declaration order.
    pub children: Vec<CommandNode>,
    /// Argument declarations; the order defines positional binding.
    pub args: Vec<ArgSpec>,
    pub action: Option<Action>,
}

impl CommandNode {
    /// Finds a direct child by its exact name.
    pub fn child(&self, name: &str) -> Option<&CommandNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Finds a declared argument by its exact name.
    pub fn arg(&self, name: &str) -> Option<&ArgSpec> {
        self.args.iter().find(|arg| arg.name == name)
    }

    /// Returns the children whose names start with `prefix`, in declaration order.
    pub fn children_with_prefix<'a>(
        &'a self,
        prefix: &str,
    ) -> impl Iterator<Item = &'a CommandNode> {
        self.children
            .iter()
            .filter(move |child| child.name.starts_with(prefix))
    }

    pub fn is_runnable(&self) -> bool {
        self.action.is_some()
    }

    pub fn help_text(&self) -> &str {
        self.help.as_deref().unwrap_or(crate::constants::NO_HELP)
    }
}

/// One declared argument of a command.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    pub name: String,
    pub help: Option<String>,
    /// `None` means the argument is required.
    pub default: Option<ArgValue>,
    pub kind: ArgKind,
}

impl ArgSpec {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    pub fn help_text(&self) -> &str {
        self.help.as_deref().unwrap_or(crate::constants::NO_HELP)
    }
}

/// The fixed set of argument kinds. Validation data is checked when binding.
#[derive(Debug, Clone)]
pub enum ArgKind {
    String,
    Path,
    Range { low: i64, high: i64 },
    Pattern(Regex),
    Enum(Vec<String>),
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Path => write!(f, "path"),
            Self::Range { low, high } => write!(f, "range(<{}-{}>)", low, high),
            Self::Pattern(re) => write!(f, "pattern({})", display_pattern(re)),
            Self::Enum(values) => write!(f, "enum({})", values.join(", ")),
        }
    }
}

/// Strips the `^(?:...)$` anchoring added by the compiler so help shows what the author wrote.
pub fn display_pattern(re: &Regex) -> &str {
    let source = re.as_str();
    source
        .strip_prefix("^(?:")
        .and_then(|s| s.strip_suffix(")$"))
        .unwrap_or(source)
}

/// How a runnable node executes.
#[derive(Debug, Clone)]
pub enum Action {
    /// Command-line templates with `{{name}}` placeholders, run in order.
    Shell(Vec<String>),
    /// Opaque statements handed to the func host.
    Func(Vec<String>),
    /// Name of a method in the host method registry.
    Method(String),
    /// Switches to another command tree.
    Subtree(SubtreeSpec),
}

/// Where a sub-mode's tree comes from and how it presents itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtreeSpec {
    pub source: DocumentSource,
    pub prompt: Option<String>,
    pub intro: Option<String>,
}

/// A compiled command tree plus its presentation metadata.
#[derive(Debug, Clone)]
pub struct CommandTree {
    pub root: CommandNode,
    pub prompt: String,
    pub intro: Option<String>,
}

impl CommandTree {
    /// Walks an exact path of child names from the root.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&CommandNode> {
        path.iter()
            .try_fold(&self.root, |node, name| node.child(name.as_ref()))
    }
}

// --- BOUND ARGUMENTS ---

/// A scalar argument value, either supplied by the user or taken from a default.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Bound arguments in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    entries: Vec<(String, ArgValue)>,
}

impl BoundArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value, keeping the original position on replacement.
    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ArgValue)> for BoundArgs {
    fn from_iter<I: IntoIterator<Item = (K, ArgValue)>>(iter: I) -> Self {
        let mut args = Self::new();
        for (name, value) in iter {
            args.insert(name, value);
        }
        args
    }
}
