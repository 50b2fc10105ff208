// src/constants.rs

/// Reserved document key holding a node's or argument's description.
pub const HELP_KEY: &str = "help";

/// Reserved document key holding a node's action.
pub const CMD_KEY: &str = "cmd";

/// Reserved document key holding a node's argument declarations.
pub const ARGS_KEY: &str = "args";

/// Action keys accepted inside `cmd`.
pub const SHELL_KEY: &str = "shell";
/// See [`SHELL_KEY`].
pub const FUNC_KEY: &str = "func";
/// See [`SHELL_KEY`].
pub const METHOD_KEY: &str = "method";
/// See [`SHELL_KEY`].
pub const SUBTREE_KEY: &str = "subtree";

/// Keys accepted inside a `subtree` mapping.
pub const SUBTREE_FILE_KEY: &str = "file";
/// See [`SUBTREE_FILE_KEY`].
pub const SUBTREE_TREE_KEY: &str = "tree";
/// See [`SUBTREE_FILE_KEY`].
pub const SUBTREE_PROMPT_KEY: &str = "prompt";
/// See [`SUBTREE_FILE_KEY`].
pub const SUBTREE_INTRO_KEY: &str = "intro";

/// Text shown for nodes and arguments declared without `help`.
pub const NO_HELP: &str = "no help";

/// Tokens that request the brief listing of the current node.
pub const BRIEF_HELP_TOKEN: &str = "?";
/// See [`BRIEF_HELP_TOKEN`].
pub const LIST_TOKEN: &str = "list";

/// Marker row appended to a listing when the listed node itself is runnable.
pub const CARRIAGE_RETURN_MARKER: &str = "<cr>";

/// Prompt used when neither the settings nor the command line provide one.
pub const DEFAULT_PROMPT: &str = "jcmd> ";

/// Intro used when neither the settings nor the command line provide one.
pub const DEFAULT_INTRO: &str = "[Line-oriented Command Interface using JSON]";

/// Default recursion ceiling for the tree compiler.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Name of the directory holding jcmd configuration (inside the system config dir).
pub const CONFIG_DIR_NAME: &str = "jcmd";

/// Name of the settings file inside the configuration directory.
pub const SETTINGS_FILENAME: &str = "config.toml";

/// Default location of the readline history file.
pub const DEFAULT_HISTORY_FILE: &str = "~/.jcmdhistory";

/// Commands handled by the interpreter itself, before tree resolution.
pub const QUIT_COMMAND: &str = "quit";
/// See [`QUIT_COMMAND`].
pub const EXIT_COMMAND: &str = "exit";
/// See [`QUIT_COMMAND`].
pub const BACK_COMMAND: &str = "back";
/// See [`QUIT_COMMAND`].
pub const HELP_COMMAND: &str = "help";
/// Prefix that hands the rest of the line to the platform shell.
pub const SHELL_ESCAPE: &str = "!";
