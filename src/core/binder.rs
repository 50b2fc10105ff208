// src/core/binder.rs

use crate::{
    core::resolver::is_explicit_argument,
    models::{ArgKind, ArgSpec, ArgValue, BoundArgs, CommandNode, display_pattern},
};
use thiserror::Error;

/// Why a set of tokens could not be bound to a command's declared arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("Missing argument '{0}'")]
    MissingArgument(String),
    #[error("Unknown argument '{0}'")]
    UnknownArgument(String),
    #[error("Argument '{0}' was given more than once")]
    DuplicateArgument(String),
    #[error("Too many arguments: {}", .0.join(" "))]
    TooManyArguments(Vec<String>),
    #[error("Argument '{name}' is out of range: '{value}' is not an integer in <{low}-{high}>")]
    OutOfRange {
        name: String,
        value: String,
        low: i64,
        high: i64,
    },
    #[error("Argument '{name}' does not match pattern '{pattern}': '{value}'")]
    PatternMismatch {
        name: String,
        value: String,
        pattern: String,
    },
    #[error("Argument '{name}' must be one of [{}]: '{value}'", .allowed.join(", "))]
    InvalidEnum {
        name: String,
        value: String,
        allowed: Vec<String>,
    },
    #[error("Argument '{0}' expects a path and cannot be empty")]
    EmptyPath(String),
}

/// One user-supplied value with its consumption state.
#[derive(Debug, Clone, Copy)]
struct SuppliedValue<'a> {
    value: &'a str,
    consumed: bool,
}

/// The raw tokens of a command line, split into explicit `name=value` pairs and
/// bare positional values. Values are borrowed from the tokens; nothing is copied
/// until a value is accepted.
#[derive(Debug)]
struct SuppliedArgs<'a> {
    positional: Vec<SuppliedValue<'a>>,
    named: Vec<(&'a str, SuppliedValue<'a>)>,
}

impl<'a> SuppliedArgs<'a> {
    /// Classifies the tokens. Unknown or repeated explicit names fail here, before
    /// any argument is bound.
    fn parse(tokens: &'a [String], node: &CommandNode) -> Result<Self, BindError> {
        let mut positional = Vec::new();
        let mut named: Vec<(&'a str, SuppliedValue<'a>)> = Vec::new();

        for token in tokens {
            match token.split_once('=') {
                Some((name, value)) if is_explicit_argument(token) => {
                    if node.arg(name).is_none() {
                        return Err(BindError::UnknownArgument(name.to_string()));
                    }
                    if named.iter().any(|(seen, _)| *seen == name) {
                        return Err(BindError::DuplicateArgument(name.to_string()));
                    }
                    named.push((
                        name,
                        SuppliedValue {
                            value,
                            consumed: false,
                        },
                    ));
                }
                _ => positional.push(SuppliedValue {
                    value: token,
                    consumed: false,
                }),
            }
        }

        Ok(Self { positional, named })
    }

    fn consume_named(&mut self, name: &str) -> Option<&'a str> {
        self.named
            .iter_mut()
            .find(|(key, arg)| *key == name && !arg.consumed)
            .map(|(_, arg)| {
                arg.consumed = true;
                arg.value
            })
    }

    fn consume_next_positional(&mut self) -> Option<&'a str> {
        self.positional
            .iter_mut()
            .find(|arg| !arg.consumed)
            .map(|arg| {
                arg.consumed = true;
                arg.value
            })
    }

    fn unconsumed_positional(&self) -> Vec<String> {
        self.positional
            .iter()
            .filter(|arg| !arg.consumed)
            .map(|arg| arg.value.to_string())
            .collect()
    }
}

/// Binds the tokens left after resolution to the node's declared arguments.
///
/// Explicit `name=value` tokens bind by name; bare tokens fill the remaining
/// arguments in declaration order. Missing arguments fall back to their default.
/// Every supplied value is checked against its argument kind; defaults are trusted.
pub fn bind(node: &CommandNode, tokens: &[String]) -> Result<BoundArgs, BindError> {
    let mut supplied = SuppliedArgs::parse(tokens, node)?;

    // Explicit names are claimed first so positional values skip them.
    let explicit: Vec<Option<&str>> = node
        .args
        .iter()
        .map(|spec| supplied.consume_named(&spec.name))
        .collect();

    let mut pending = Vec::with_capacity(node.args.len());
    for (spec, explicit_value) in node.args.iter().zip(explicit) {
        let raw = explicit_value.or_else(|| supplied.consume_next_positional());
        pending.push((spec, raw));
    }

    let leftover = supplied.unconsumed_positional();
    if !leftover.is_empty() {
        return Err(BindError::TooManyArguments(leftover));
    }

    let mut bound = BoundArgs::new();
    for (spec, raw) in pending {
        let value = match (raw, &spec.default) {
            (Some(raw), _) => check_value(spec, raw)?,
            (None, Some(default)) => default.clone(),
            (None, None) => return Err(BindError::MissingArgument(spec.name.clone())),
        };
        bound.insert(spec.name.clone(), value);
    }

    log::debug!("Bound arguments for '{}': {:?}", node.name, bound);
    Ok(bound)
}

/// Validates a user-supplied value against the argument kind and converts it.
pub fn check_value(spec: &ArgSpec, raw: &str) -> Result<ArgValue, BindError> {
    match &spec.kind {
        ArgKind::String => Ok(ArgValue::Text(raw.to_string())),
        ArgKind::Path => {
            if raw.trim().is_empty() {
                Err(BindError::EmptyPath(spec.name.clone()))
            } else {
                Ok(ArgValue::Text(raw.to_string()))
            }
        }
        ArgKind::Range { low, high } => match raw.trim().parse::<i64>() {
            Ok(v) if (*low..=*high).contains(&v) => Ok(ArgValue::Integer(v)),
            _ => Err(BindError::OutOfRange {
                name: spec.name.clone(),
                value: raw.to_string(),
                low: *low,
                high: *high,
            }),
        },
        ArgKind::Pattern(re) => {
            if re.is_match(raw) {
                Ok(ArgValue::Text(raw.to_string()))
            } else {
                Err(BindError::PatternMismatch {
                    name: spec.name.clone(),
                    value: raw.to_string(),
                    pattern: display_pattern(re).to_string(),
                })
            }
        }
        ArgKind::Enum(allowed) => {
            if allowed.iter().any(|candidate| candidate == raw) {
                Ok(ArgValue::Text(raw.to_string()))
            } else {
                Err(BindError::InvalidEnum {
                    name: spec.name.clone(),
                    value: raw.to_string(),
                    allowed: allowed.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compiler::{CompileOptions, compile_tree};
    use crate::models::CommandTree;
    use serde_json::json;

    fn tree() -> CommandTree {
        compile_tree(
            &json!({
                "ping": {
                    "cmd": {"shell": "ping {{ip}} -c {{count}}"},
                    "args": {
                        "ip": "target address",
                        "count": {"help": "packets", "range": "<1-10>", "default": 3}
                    }
                },
                "argument": {
                    "cmd": {"method": "my_method"},
                    "args": {
                        "optional-data": {"default": "no-option"},
                        "range-data": {"range": "<10-100>", "default": 10},
                        "enum-data": {"enum": ["green", "blue", "red"], "default": "red"}
                    }
                },
                "copy": {
                    "cmd": {"shell": "cp {{src}} {{dst}}"},
                    "args": {
                        "src": {"type": "path"},
                        "dst": {"type": "path"}
                    }
                },
                "mac": {
                    "cmd": {"method": "set_mac"},
                    "args": {"addr": {"pattern": "[0-9a-f]{2}(:[0-9a-f]{2}){5}"}}
                }
            }),
            "> ",
            None,
            &CompileOptions::default(),
        )
        .unwrap()
    }

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_and_default() {
        let tree = tree();
        let node = tree.find(&["ping"]).unwrap();
        let bound = bind(node, &tokens(&["10.0.0.1"])).unwrap();
        assert_eq!(bound.get("ip"), Some(&ArgValue::Text("10.0.0.1".to_string())));
        assert_eq!(bound.get("count"), Some(&ArgValue::Integer(3)));
    }

    #[test]
    fn test_explicit_names_are_skipped_by_positionals() {
        let tree = tree();
        let node = tree.find(&["ping"]).unwrap();
        let bound = bind(node, &tokens(&["count=7", "192.168.0.1"])).unwrap();
        assert_eq!(bound.get("ip"), Some(&ArgValue::Text("192.168.0.1".to_string())));
        assert_eq!(bound.get("count"), Some(&ArgValue::Integer(7)));
        // Declaration order is kept regardless of input order.
        let names: Vec<_> = bound.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["ip", "count"]);
    }

    #[test]
    fn test_only_defaults_bind_with_zero_tokens() {
        let tree = tree();
        let node = tree.find(&["argument"]).unwrap();
        let bound = bind(node, &[]).unwrap();
        assert_eq!(bound.len(), 3);
        for spec in &node.args {
            assert_eq!(bound.get(&spec.name), spec.default.as_ref());
        }
    }

    #[test]
    fn test_missing_required_argument() {
        let tree = tree();
        let node = tree.find(&["ping"]).unwrap();
        assert_eq!(
            bind(node, &[]),
            Err(BindError::MissingArgument("ip".to_string()))
        );
    }

    #[test]
    fn test_range_check() {
        let tree = tree();
        let node = tree.find(&["ping"]).unwrap();
        let err = bind(node, &tokens(&["1.1.1.1", "20"])).unwrap_err();
        assert!(matches!(err, BindError::OutOfRange { ref name, low: 1, high: 10, .. } if name == "count"));

        let bound = bind(node, &tokens(&["1.1.1.1", "5"])).unwrap();
        assert_eq!(bound.get("count"), Some(&ArgValue::Integer(5)));

        let err = bind(node, &tokens(&["1.1.1.1", "count=five"])).unwrap_err();
        assert!(matches!(err, BindError::OutOfRange { .. }));
    }

    #[test]
    fn test_enum_check() {
        let tree = tree();
        let node = tree.find(&["argument"]).unwrap();
        assert!(bind(node, &tokens(&["enum-data=blue"])).is_ok());
        let err = bind(node, &tokens(&["enum-data=purple"])).unwrap_err();
        assert!(matches!(err, BindError::InvalidEnum { ref value, .. } if value == "purple"));
    }

    #[test]
    fn test_pattern_requires_full_match() {
        let tree = tree();
        let node = tree.find(&["mac"]).unwrap();
        assert!(bind(node, &tokens(&["00:1a:2b:3c:4d:5e"])).is_ok());
        let err = bind(node, &tokens(&["xx00:1a:2b:3c:4d:5e"])).unwrap_err();
        assert!(matches!(err, BindError::PatternMismatch { ref pattern, .. } if pattern == "[0-9a-f]{2}(:[0-9a-f]{2}){5}"));
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let tree = tree();
        let node = tree.find(&["copy"]).unwrap();
        assert_eq!(
            bind(node, &tokens(&["src=", "/tmp/b"])),
            Err(BindError::EmptyPath("src".to_string()))
        );
        assert!(bind(node, &tokens(&["/does/not/exist", "/tmp/b"])).is_ok());
    }

    #[test]
    fn test_unknown_argument_binds_nothing() {
        let tree = tree();
        let node = tree.find(&["ping"]).unwrap();
        assert_eq!(
            bind(node, &tokens(&["10.0.0.1", "name=value"])),
            Err(BindError::UnknownArgument("name".to_string()))
        );
    }

    #[test]
    fn test_duplicate_explicit_argument() {
        let tree = tree();
        let node = tree.find(&["ping"]).unwrap();
        assert_eq!(
            bind(node, &tokens(&["ip=1.1.1.1", "ip=2.2.2.2"])),
            Err(BindError::DuplicateArgument("ip".to_string()))
        );
    }

    #[test]
    fn test_too_many_arguments() {
        let tree = tree();
        let node = tree.find(&["ping"]).unwrap();
        assert_eq!(
            bind(node, &tokens(&["1.1.1.1", "4", "extra", "more"])),
            Err(BindError::TooManyArguments(tokens(&["extra", "more"])))
        );
    }

    #[test]
    fn test_value_may_contain_equals_sign() {
        let tree = tree();
        let node = tree.find(&["ping"]).unwrap();
        let bound = bind(node, &tokens(&["ip=a=b"])).unwrap();
        assert_eq!(bound.get("ip"), Some(&ArgValue::Text("a=b".to_string())));
    }
}
