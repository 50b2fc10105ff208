// src/core/completion.rs

use crate::{
    constants::{BACK_COMMAND, EXIT_COMMAND, HELP_COMMAND, QUIT_COMMAND},
    core::{paths, resolver::is_explicit_argument},
    models::{ArgKind, ArgSpec, CommandNode, CommandTree},
};
use std::{fs, path::PathBuf};

const BUILTIN_NAMES: &[&str] = &[QUIT_COMMAND, EXIT_COMMAND, BACK_COMMAND, HELP_COMMAND];

/// Splits a partial line into the finished words and the word being typed, with the
/// quotes of the typed word removed.
///
/// Unbalanced quotes are tolerated here: completion runs while the user is still typing.
pub fn split_partial(line: &str) -> (Vec<String>, String) {
    let start = partial_start(line);
    let finished = line.get(..start).unwrap_or_default();
    let partial = line.get(start..).unwrap_or_default();

    let words = shlex::split(finished)
        .unwrap_or_else(|| finished.split_whitespace().map(str::to_string).collect());
    (words, unquote(partial))
}

/// Byte offset where the word being typed begins. Whitespace inside quotes or after a
/// backslash does not end a word.
pub fn partial_start(line: &str) -> usize {
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('\''), _) => {}
            (_, '\\') => escaped = true,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, c) if c.is_whitespace() => start = i + c.len_utf8(),
            (None, _) => {}
        }
    }
    start
}

fn unquote(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in word.chars() {
        if escaped {
            out.push(c);
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('\''), c) => out.push(c),
            (_, '\\') => escaped = true,
            (None, '"' | '\'') => quote = Some(c),
            (_, c) => out.push(c),
        }
    }
    out
}

/// Quotes a replacement that would otherwise split into several words.
fn quote_candidate(candidate: String) -> String {
    if !candidate.contains(char::is_whitespace) {
        return candidate;
    }
    match shlex::try_quote(&candidate) {
        Ok(quoted) => quoted.into_owned(),
        Err(e) => {
            log::trace!("Cannot quote completion '{}': {}", candidate, e);
            candidate
        }
    }
}

/// Returns replacement candidates for the last (possibly empty) word of `line`.
///
/// Command names come back with a trailing space and argument keys with a trailing `=`,
/// so accepting a candidate leaves the cursor ready for the next word.
pub fn complete(tree: &CommandTree, line: &str) -> Vec<String> {
    let (mut words, partial) = split_partial(line);

    // `help <path>` completes command paths only.
    let help_path = words.first().is_some_and(|word| word == HELP_COMMAND);
    if help_path {
        words.remove(0);
    }

    let mut node = &tree.root;
    let mut consumed = 0;
    for word in &words {
        match node.child(word) {
            Some(child) => {
                node = child;
                consumed += 1;
            }
            None => break,
        }
    }

    let arguments = words.get(consumed..).unwrap_or_default();
    if help_path {
        return if arguments.is_empty() {
            node.children_with_prefix(&partial)
                .map(|child| format!("{} ", child.name))
                .collect()
        } else {
            Vec::new()
        };
    }
    if !arguments.is_empty() && !node.is_runnable() {
        return Vec::new();
    }

    if let Some((name, value)) = partial.split_once('=')
        && is_explicit_argument(&partial)
    {
        return node
            .is_runnable()
            .then(|| node.arg(name))
            .flatten()
            .map(|spec| value_candidates(spec, value))
            .unwrap_or_default()
            .into_iter()
            .map(|value| quote_candidate(format!("{}={}", name, value)))
            .collect();
    }

    let mut candidates = Vec::new();
    if arguments.is_empty() {
        candidates.extend(
            node.children_with_prefix(&partial)
                .map(|child| format!("{} ", child.name)),
        );
        if consumed == 0 {
            candidates.extend(
                BUILTIN_NAMES
                    .iter()
                    .filter(|name| name.starts_with(partial.as_str()))
                    .map(|name| format!("{} ", name)),
            );
        }
    }
    if node.is_runnable() {
        candidates.extend(argument_keys(node, arguments, &partial));
    }
    candidates
}

/// `name=` for every declared argument not yet given explicitly.
fn argument_keys(node: &CommandNode, given: &[String], partial: &str) -> Vec<String> {
    node.args
        .iter()
        .filter(|spec| spec.name.starts_with(partial))
        .filter(|spec| {
            !given
                .iter()
                .any(|word| word.split_once('=').is_some_and(|(name, _)| name == spec.name))
        })
        .map(|spec| format!("{}=", spec.name))
        .collect()
}

fn value_candidates(spec: &ArgSpec, prefix: &str) -> Vec<String> {
    match &spec.kind {
        ArgKind::Enum(values) => values
            .iter()
            .filter(|value| value.starts_with(prefix))
            .cloned()
            .collect(),
        ArgKind::Path => path_candidates(prefix),
        _ => Vec::new(),
    }
}

/// Filesystem entries matching a partially typed path. Directories end with `/`.
/// Hidden entries are offered only when the typed name starts with a dot.
fn path_candidates(prefix: &str) -> Vec<String> {
    let (dir_part, file_prefix) = match prefix.rfind('/') {
        Some(pos) => prefix.split_at(pos + 1),
        None => ("", prefix),
    };
    let search_dir = if dir_part.is_empty() {
        PathBuf::from(".")
    } else {
        paths::expand_path(dir_part)
    };

    let Ok(entries) = fs::read_dir(&search_dir) else {
        log::trace!("Cannot list '{}' for completion.", search_dir.display());
        return Vec::new();
    };

    let mut candidates: Vec<String> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            if !name.starts_with(file_prefix)
                || (name.starts_with('.') && !file_prefix.starts_with('.'))
            {
                return None;
            }
            let suffix = if entry.path().is_dir() { "/" } else { "" };
            Some(format!("{}{}{}", dir_part, name, suffix))
        })
        .collect();
    candidates.sort();
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compiler::{CompileOptions, compile_tree};
    use serde_json::json;
    use std::fs::File;

    fn tree() -> CommandTree {
        compile_tree(
            &json!({
                "ping": {
                    "cmd": {"shell": "ping {{ip}}"},
                    "args": {"ip": "target", "count": {"default": 1}}
                },
                "ps": {"cmd": {"shell": "ps"}},
                "show": {
                    "interface": {"cmd": {"shell": "ip link"}},
                    "ip": {"cmd": {"shell": "ip addr"}}
                },
                "color": {
                    "cmd": {"shell": "echo {{shade}}"},
                    "args": {"shade": {"enum": ["green", "grey", "red"]}}
                },
                "cat": {
                    "cmd": {"shell": "cat {{file}}"},
                    "args": {"file": {"type": "path"}}
                }
            }),
            "> ",
            None,
            &CompileOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_split_partial() {
        assert_eq!(
            split_partial("show in"),
            (vec!["show".to_string()], "in".to_string())
        );
        assert_eq!(
            split_partial("show "),
            (vec!["show".to_string()], String::new())
        );
        assert_eq!(split_partial("echo \"open"), (vec!["echo".to_string()], "open".to_string()));
        assert_eq!(
            split_partial("cat 'a b' file=\"my di"),
            (vec!["cat".to_string(), "a b".to_string()], "file=my di".to_string())
        );
    }

    #[test]
    fn test_partial_start_honours_quotes() {
        assert_eq!(partial_start("show in"), 5);
        assert_eq!(partial_start("show "), 5);
        assert_eq!(partial_start("cat file=\"my di"), 4);
        assert_eq!(partial_start("cat my\\ di"), 4);
        assert_eq!(partial_start(""), 0);
    }

    #[test]
    fn test_top_level_commands_and_builtins() {
        let tree = tree();
        assert_eq!(complete(&tree, "p"), vec!["ping ", "ps "]);
        assert_eq!(complete(&tree, "h"), vec!["help "]);
        let all = complete(&tree, "");
        assert!(all.contains(&"show ".to_string()));
        assert!(all.contains(&"quit ".to_string()));
    }

    #[test]
    fn test_nested_commands() {
        let tree = tree();
        assert_eq!(complete(&tree, "show i"), vec!["interface ", "ip "]);
        assert_eq!(complete(&tree, "show in"), vec!["interface "]);
        assert!(complete(&tree, "nothing ").is_empty());
    }

    #[test]
    fn test_help_completes_paths_only() {
        let tree = tree();
        assert_eq!(complete(&tree, "help sh"), vec!["show "]);
        assert_eq!(complete(&tree, "help show i"), vec!["interface ", "ip "]);
        assert!(complete(&tree, "help ping ").is_empty());
    }

    #[test]
    fn test_argument_keys_skip_given_names() {
        let tree = tree();
        assert_eq!(complete(&tree, "ping "), vec!["ip=", "count="]);
        assert_eq!(complete(&tree, "ping ip=1.1.1.1 "), vec!["count="]);
        assert_eq!(complete(&tree, "ping 1.1.1.1 c"), vec!["count="]);
    }

    #[test]
    fn test_enum_values() {
        let tree = tree();
        assert_eq!(
            complete(&tree, "color shade=g"),
            vec!["shade=green", "shade=grey"]
        );
        assert!(complete(&tree, "color nothing=g").is_empty());
    }

    #[test]
    fn test_path_values() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("alpha.txt")).unwrap();
        File::create(dir.path().join(".hidden")).unwrap();
        fs::create_dir(dir.path().join("albums")).unwrap();

        let tree = tree();
        let base = format!("{}/", dir.path().display());
        let line = format!("cat file={}al", base);
        assert_eq!(
            complete(&tree, &line),
            vec![
                format!("file={}albums/", base),
                format!("file={}alpha.txt", base),
            ]
        );

        let line = format!("cat file={}", base);
        assert_eq!(complete(&tree, &line).len(), 2);
    }

    #[test]
    fn test_path_values_with_spaces_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("my dir")).unwrap();

        let tree = tree();
        let base = format!("{}/", dir.path().display());
        let line = format!("cat file=\"{}my d", base);
        let candidates = complete(&tree, &line);
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            shlex::split(&candidates[0]),
            Some(vec![format!("file={}my dir/", base)])
        );
    }
}
