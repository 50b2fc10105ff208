// src/core/help.rs

use crate::{
    constants::CARRIAGE_RETURN_MARKER,
    models::{ArgSpec, CommandNode},
};
use colored::Colorize;

/// Suffix marking a listing entry that only groups sub-commands.
const NAMESPACE_MARKER: &str = "...";

/// One row of a brief listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub help: String,
    /// The entry has sub-commands but cannot run on its own.
    pub namespace_only: bool,
}

impl ListingEntry {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            namespace_only: false,
        }
    }

    fn label(&self) -> String {
        if self.namespace_only {
            format!("{}{}", self.name, NAMESPACE_MARKER)
        } else {
            self.name.clone()
        }
    }
}

/// Lists the children of `node` whose names start with `prefix`, in declaration order.
/// An empty prefix lists every child.
///
/// A `<cr>` row is appended when `node` is runnable itself, meaning the line can
/// be submitted as typed.
pub fn listing(node: &CommandNode, prefix: &str) -> Vec<ListingEntry> {
    let mut entries: Vec<ListingEntry> = node
        .children_with_prefix(prefix)
        .map(|child| ListingEntry {
            name: child.name.clone(),
            help: child.help_text().to_string(),
            namespace_only: !child.is_runnable() && !child.children.is_empty(),
        })
        .collect();

    if node.is_runnable() {
        entries.push(ListingEntry::new(CARRIAGE_RETURN_MARKER, node.help_text()));
    }
    entries
}

/// Renders entries as two aligned columns.
pub fn render_listing(entries: &[ListingEntry]) -> String {
    let width = entries
        .iter()
        .map(|entry| entry.label().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for entry in entries {
        let label = format!("{:<width$}", entry.label(), width = width);
        out.push_str(&format!("  {}  {}\n", label.cyan(), entry.help));
    }
    out
}

/// Renders the detailed help of the node reached by `path`.
///
/// # Arguments
/// * `path` - The command names leading to `node`, used in the usage line.
/// * `node` - The node to describe.
pub fn detailed_help<S: AsRef<str>>(path: &[S], node: &CommandNode) -> String {
    let joined = path
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(" ");

    let mut out = String::new();
    out.push_str(&format!("{}: {}\n", joined.bold(), node.help_text()));

    if node.is_runnable() {
        let mut usage = joined.clone();
        for arg in &node.args {
            usage.push(' ');
            usage.push_str(&usage_token(arg));
        }
        out.push_str(&format!("  usage: {}\n", usage));
    }

    if !node.args.is_empty() {
        out.push_str("  arguments:\n");
        let rows: Vec<(String, String, String)> = node
            .args
            .iter()
            .map(|arg| (arg.name.clone(), arg.kind.to_string(), describe_arg(arg)))
            .collect();
        let name_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0);
        let kind_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(0);
        for (name, kind, text) in rows {
            out.push_str(&format!(
                "    {:<nw$}  {:<kw$}  {}\n",
                name,
                kind,
                text,
                nw = name_width,
                kw = kind_width
            ));
        }
    }

    if !node.children.is_empty() {
        out.push_str("  sub-commands:\n");
        for line in render_listing(&listing(node, "")).lines() {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

fn usage_token(arg: &ArgSpec) -> String {
    if arg.is_required() {
        format!("<{}>", arg.name)
    } else {
        format!("[{}]", arg.name)
    }
}

fn describe_arg(arg: &ArgSpec) -> String {
    match &arg.default {
        Some(default) => format!("{} (default: {})", arg.help_text(), default),
        None => format!("{} (required)", arg.help_text()),
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
                "zeta": {"help": "last letter", "cmd": {"shell": "true"}},
                "alpha": {
                    "help": "first letter",
                    "one": {"cmd": {"shell": "true"}}
                },
                "mid": {
                    "help": "in between",
                    "cmd": {"method": "mid"},
                    "args": {
                        "count": {"help": "how many", "range": "<1-10>", "default": 3},
                        "name": "who"
                    },
                    "child": {"cmd": {"shell": "true"}}
                },
                "bare": {}
            }),
            "> ",
            None,
            &CompileOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_listing_keeps_declaration_order_and_skips_reserved_keys() {
        let tree = tree();
        let names: Vec<String> = listing(&tree.root, "").into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid", "bare"]);
    }

    #[test]
    fn test_listing_marks_namespaces_and_missing_help() {
        let tree = tree();
        let entries = listing(&tree.root, "");
        assert!(entries[1].namespace_only);
        assert!(!entries[0].namespace_only);
        assert!(!entries[3].namespace_only);
        assert_eq!(entries[3].help, "no help");
    }

    #[test]
    fn test_listing_of_runnable_node_has_carriage_return_row() {
        let tree = tree();
        let mid = tree.find(&["mid"]).unwrap();
        let entries = listing(mid, "");
        assert_eq!(
            entries,
            vec![
                ListingEntry::new("child", "no help"),
                ListingEntry::new("<cr>", "in between"),
            ]
        );
    }

    #[test]
    fn test_listing_filtered_by_prefix() {
        let tree = tree();
        let names: Vec<String> = listing(&tree.root, "a").into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["alpha"]);

        let mid = tree.find(&["mid"]).unwrap();
        assert_eq!(
            listing(mid, "x"),
            vec![ListingEntry::new("<cr>", "in between")]
        );
    }

    #[test]
    fn test_render_listing_aligns_columns() {
        colored::control::set_override(false);
        let rendered = render_listing(&[
            ListingEntry::new("a", "first"),
            ListingEntry {
                name: "long".to_string(),
                help: "second".to_string(),
                namespace_only: true,
            },
        ]);
        assert_eq!(rendered, "  a        first\n  long...  second\n");
    }

    #[test]
    fn test_detailed_help_describes_arguments() {
        colored::control::set_override(false);
        let tree = tree();
        let mid = tree.find(&["mid"]).unwrap();
        let text = detailed_help(&["mid"], mid);
        assert!(text.starts_with("mid: in between\n"));
        assert!(text.contains("usage: mid [count] <name>"));
        assert!(text.contains("count  range(<1-10>)  how many (default: 3)"));
        assert!(text.contains("name   string         who (required)"));
        assert!(text.contains("sub-commands:"));
    }
}
