// src/cli/line_editor.rs

use crate::{
    core::completion,
    interpreter::LineSource,
    models::CommandTree,
};
use rustyline::{
    Context, Editor, Helper,
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
};
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Tab completion against the tree that is active when the line is read.
#[derive(Debug)]
pub struct CommandHelper {
    tree: Arc<CommandTree>,
}

impl CommandHelper {
    pub fn new(tree: Arc<CommandTree>) -> Self {
        Self { tree }
    }

    fn set_tree(&mut self, tree: &Arc<CommandTree>) {
        if !Arc::ptr_eq(&self.tree, tree) {
            self.tree = Arc::clone(tree);
        }
    }
}

impl Helper for CommandHelper {}

impl Highlighter for CommandHelper {}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Validator for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let before_cursor = line.get(..pos).unwrap_or(line);
        let start = completion::partial_start(before_cursor);

        let candidates = completion::complete(&self.tree, before_cursor)
            .into_iter()
            .map(|replacement| Pair {
                display: replacement.trim_end().to_string(),
                replacement,
            })
            .collect();
        Ok((start, candidates))
    }
}

/// A rustyline editor that feeds the interpreter loop, with optional history file.
pub struct LineEditor {
    editor: Editor<CommandHelper, DefaultHistory>,
    history_path: Option<PathBuf>,
}

impl LineEditor {
    /// Creates the editor and loads the history file, if one is given and exists.
    pub fn new(tree: Arc<CommandTree>, history_path: Option<PathBuf>) -> Result<Self, ReadlineError> {
        let mut editor: Editor<CommandHelper, DefaultHistory> = Editor::new()?;
        editor.set_helper(Some(CommandHelper::new(tree)));

        if let Some(path) = &history_path
            && path.exists()
            && let Err(e) = editor.load_history(path)
        {
            log::warn!("Could not load history from '{}': {}", path.display(), e);
        }

        Ok(Self {
            editor,
            history_path,
        })
    }

    /// Writes the history file, creating its parent directory if needed.
    pub fn save_history(&mut self) -> Result<(), ReadlineError> {
        let Some(path) = &self.history_path else {
            return Ok(());
        };
        ensure_parent_dir(path)?;
        self.editor.save_history(path)?;
        log::debug!("Saved history to '{}'.", path.display());
        Ok(())
    }
}

impl fmt::Debug for LineEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineEditor")
            .field("history_path", &self.history_path)
            .finish_non_exhaustive()
    }
}

fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

impl LineSource for LineEditor {
    fn read_line(&mut self, prompt: &str, tree: &Arc<CommandTree>) -> io::Result<Option<String>> {
        if let Some(helper) = self.editor.helper_mut() {
            helper.set_tree(tree);
        }

        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty()
                    && let Err(e) = self.editor.add_history_entry(line.as_str())
                {
                    log::debug!("Could not record history entry: {}", e);
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) => Ok(None),
            // Ctrl+C abandons the current line only.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Io(e)) => Err(e),
            Err(e) => Err(io::Error::other(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compiler::{CompileOptions, compile_tree};
    use serde_json::json;

    fn tree(document: serde_json::Value) -> Arc<CommandTree> {
        Arc::new(compile_tree(&document, "> ", None, &CompileOptions::default()).unwrap())
    }

    #[test]
    fn test_completer_replaces_last_word() {
        let helper = CommandHelper::new(tree(json!({
            "show": {"interface": {"cmd": {"shell": "true"}}, "ip": {"cmd": {"shell": "true"}}}
        })));
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);

        let (start, pairs) = helper.complete("show in", 7, &ctx).unwrap();
        assert_eq!(start, 5);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].replacement, "interface ");
        assert_eq!(pairs[0].display, "interface");
    }

    #[test]
    fn test_completer_replaces_quoted_word_whole() {
        let helper = CommandHelper::new(tree(json!({
            "color": {
                "cmd": {"shell": "echo {{shade}}"},
                "args": {"shade": {"enum": ["dark green", "red"]}}
            }
        })));
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);

        let line = "color shade=\"dark g";
        let (start, pairs) = helper.complete(line, line.len(), &ctx).unwrap();
        assert_eq!(start, 6);
        assert_eq!(pairs.len(), 1);
        assert_eq!(
            shlex::split(&pairs[0].replacement),
            Some(vec!["shade=dark green".to_string()])
        );
    }

    #[test]
    fn test_completer_follows_active_tree() {
        let mut helper = CommandHelper::new(tree(json!({"alpha": {"cmd": {"shell": "true"}}})));
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        assert_eq!(helper.complete("al", 2, &ctx).unwrap().1.len(), 1);

        helper.set_tree(&tree(json!({"beta": {"cmd": {"shell": "true"}}})));
        assert!(helper.complete("al", 2, &ctx).unwrap().1.is_empty());
    }

    #[test]
    fn test_ensure_parent_dir_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/history");
        ensure_parent_dir(&path).unwrap();
        assert!(dir.path().join("nested/deeper").is_dir());
    }
}
