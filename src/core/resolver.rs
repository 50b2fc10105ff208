// src/core/resolver.rs

use crate::{
    constants::{BRIEF_HELP_TOKEN, LIST_TOKEN},
    models::{CommandNode, CommandTree},
};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LineError {
    #[error("Cannot parse input (unbalanced quotes?): {0}")]
    Unparseable(String),
}

/// The outcome of walking a tokenized line down a command tree.
#[derive(Debug, Clone)]
pub enum Resolution<'t> {
    /// A runnable node; `rest` holds the tokens left for the argument binder.
    Matched {
        node: &'t CommandNode,
        rest: Vec<String>,
    },
    /// The last token is a prefix of several children.
    Ambiguous(Vec<String>),
    /// No child matches this token and the current node cannot take arguments.
    NotFound(String),
    /// A namespace node was reached and the line ended there.
    Incomplete(&'t CommandNode),
    /// `?` or `list` was issued at this node. Only children starting with `prefix`
    /// are to be listed.
    Describe {
        node: &'t CommandNode,
        prefix: String,
    },
}

impl PartialEq for Resolution<'_> {
    /// Nodes are compared by identity: two resolutions are equal when they reach the same node.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Matched { node: a, rest: ra },
                Self::Matched { node: b, rest: rb },
            ) => std::ptr::eq(*a, *b) && ra == rb,
            (Self::Ambiguous(a), Self::Ambiguous(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Incomplete(a), Self::Incomplete(b)) => std::ptr::eq(*a, *b),
            (
                Self::Describe { node: a, prefix: pa },
                Self::Describe { node: b, prefix: pb },
            ) => std::ptr::eq(*a, *b) && pa == pb,
            _ => false,
        }
    }
}

/// Splits a line into tokens using shell quoting rules, so `"a b"` is one token.
pub fn tokenize(line: &str) -> Result<Vec<String>, LineError> {
    shlex::split(line).ok_or_else(|| LineError::Unparseable(line.to_string()))
}

/// Resolves a tokenized line against the tree.
///
/// This is a pure function of the tree and the tokens: the same input always yields
/// the same node.
pub fn resolve<'t, S: AsRef<str>>(tree: &'t CommandTree, tokens: &[S]) -> Resolution<'t> {
    let words: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
    if let Some(path) = listing_request(&words) {
        return describe(tree, path);
    }

    let mut node = &tree.root;
    let mut index = 0;

    while let Some(raw) = tokens.get(index) {
        let token: &str = raw.as_ref();
        let is_last = index + 1 == tokens.len();

        if let Some(child) = node.child(token) {
            node = child;
            index += 1;
            continue;
        }

        // An empty token is a value the user quoted on purpose, never a partial name.
        if is_last && !token.is_empty() && !is_explicit_argument(token) {
            let mut candidates = node.children_with_prefix(token);
            match (candidates.next(), candidates.next()) {
                (Some(only), None) => {
                    log::trace!("Expanded partial token '{}' to '{}'.", token, only.name);
                    node = only;
                    index += 1;
                    continue;
                }
                (Some(_), Some(_)) => {
                    let names = node
                        .children_with_prefix(token)
                        .map(|child| child.name.clone())
                        .collect();
                    return Resolution::Ambiguous(names);
                }
                (None, _) => {}
            }
        }

        return if node.is_runnable() {
            Resolution::Matched {
                node,
                rest: rest_of(tokens, index),
            }
        } else {
            Resolution::NotFound(token.to_string())
        };
    }

    if node.is_runnable() {
        Resolution::Matched {
            node,
            rest: Vec::new(),
        }
    } else {
        Resolution::Incomplete(node)
    }
}

/// `? <path>`, `<path> ?` and the same forms with `list`. Returns the path to describe.
fn listing_request<'a, 'w>(words: &'a [&'w str]) -> Option<&'a [&'w str]> {
    let path = match words {
        [path @ .., last] if is_listing_token(last) => path,
        [first, path @ ..] if is_listing_token(first) => path,
        _ => return None,
    };
    match path {
        [first, rest @ ..] if is_listing_token(first) => Some(rest),
        _ => Some(path),
    }
}

fn is_listing_token(token: &str) -> bool {
    token == BRIEF_HELP_TOKEN || token == LIST_TOKEN
}

/// Walks `path` for a listing. A last word that is not a child name but starts one
/// or more becomes the listing filter; words after a runnable node are its arguments.
fn describe<'t>(tree: &'t CommandTree, path: &[&str]) -> Resolution<'t> {
    let mut node = &tree.root;
    let last = path.len().saturating_sub(1);

    for (index, &token) in path.iter().enumerate() {
        if let Some(child) = node.child(token) {
            node = child;
            continue;
        }
        if index == last
            && !is_explicit_argument(token)
            && node.children_with_prefix(token).next().is_some()
        {
            return Resolution::Describe {
                node,
                prefix: token.to_string(),
            };
        }
        if node.is_runnable() {
            break;
        }
        return Resolution::NotFound(token.to_string());
    }

    Resolution::Describe {
        node,
        prefix: String::new(),
    }
}

/// A `name=value` token is always an argument, never a command name.
pub(crate) fn is_explicit_argument(token: &str) -> bool {
    token.find('=').is_some_and(|pos| pos > 0)
}

fn rest_of<S: AsRef<str>>(tokens: &[S], from: usize) -> Vec<String> {
    tokens
        .get(from..)
        .unwrap_or_default()
        .iter()
        .map(|t| t.as_ref().to_string())
        .collect()
}
