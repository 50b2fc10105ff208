// src/cli/mod.rs

use crate::{
    constants::{DEFAULT_INTRO, DEFAULT_PROMPT},
    core::{
        compiler::{self, CompileOptions},
        document::DocumentSource,
    },
    interpreter::Interpreter,
    system::settings::{self, Settings},
};
use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Map, Value};
use std::{io, path::PathBuf};

pub mod line_editor;

use line_editor::LineEditor;

/// jcmd: an interactive command interpreter built from a JSON or TOML command tree.
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// The document describing the command tree (`.json`, or `.toml`).
    pub document: Option<PathBuf>,

    /// The prompt shown in normal mode.
    #[arg(long)]
    pub prompt: Option<String>,

    /// The banner printed on start.
    #[arg(long)]
    pub intro: Option<String>,

    /// How deep command trees may nest.
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Do not read or write the history file.
    #[arg(long)]
    pub no_history: bool,

    /// Settings file to use instead of `<config dir>/jcmd/config.toml`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// The startup values after command-line flags have overridden the settings file.
#[derive(Debug, Clone, PartialEq)]
pub struct StartupOptions {
    pub document: Option<PathBuf>,
    pub prompt: String,
    pub intro: String,
    pub max_depth: usize,
    pub history_path: Option<PathBuf>,
}

impl StartupOptions {
    pub fn resolve(cli: &Cli, settings: &Settings) -> Self {
        let history_enabled = settings.history && !cli.no_history;
        Self {
            document: cli.document.clone(),
            prompt: cli
                .prompt
                .clone()
                .or_else(|| settings.prompt.clone())
                .unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            intro: cli
                .intro
                .clone()
                .or_else(|| settings.intro.clone())
                .unwrap_or_else(|| DEFAULT_INTRO.to_string()),
            max_depth: cli.max_depth.unwrap_or(settings.max_depth),
            history_path: history_enabled.then(|| settings.history_path()),
        }
    }
}

/// Builds the interpreter for the given options. Without a document the tree is empty
/// and only the built-in commands are available.
pub fn build_interpreter(options: &StartupOptions) -> Result<Interpreter> {
    let intro = Some(options.intro.clone());
    match &options.document {
        Some(path) => {
            let source = DocumentSource::file(path);
            Interpreter::from_source(&source, options.prompt.clone(), intro, options.max_depth)
                .with_context(|| format!("Failed to load command tree from '{}'", path.display()))
        }
        None => {
            log::warn!("No command document given; only built-in commands are available.");
            let tree = compiler::compile_tree(
                &Value::Object(Map::new()),
                options.prompt.clone(),
                intro,
                &CompileOptions::default(),
            )?;
            Ok(Interpreter::new(tree, options.max_depth))
        }
    }
}

/// Loads settings, builds the interpreter and runs it on the terminal until it ends.
pub fn run(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    let settings = settings::load_settings(cli.config.as_deref())?;
    let options = StartupOptions::resolve(&cli, &settings);

    let mut interpreter = build_interpreter(&options)?;
    let mut editor = LineEditor::new(interpreter.active_tree(), options.history_path.clone())
        .context("Failed to initialize the line editor")?;

    let mut stdout = io::stdout();
    interpreter
        .run(&mut editor, &mut stdout)
        .context("Terminal input/output failed")?;

    if let Err(e) = editor.save_history() {
        log::warn!("Could not save history: {}", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::parse_from([
            "jcmd",
            "tree.json",
            "--prompt",
            "cli> ",
            "--max-depth",
            "5",
            "--no-history",
        ]);
        let settings = Settings {
            prompt: Some("file> ".to_string()),
            intro: Some("from settings".to_string()),
            ..Settings::default()
        };

        let options = StartupOptions::resolve(&cli, &settings);
        assert_eq!(options.document, Some(PathBuf::from("tree.json")));
        assert_eq!(options.prompt, "cli> ");
        assert_eq!(options.intro, "from settings");
        assert_eq!(options.max_depth, 5);
        assert_eq!(options.history_path, None);
    }

    #[test]
    fn test_defaults_without_flags_or_settings() {
        let options = StartupOptions::resolve(&Cli::default(), &Settings::default());
        assert_eq!(options.prompt, DEFAULT_PROMPT);
        assert_eq!(options.intro, DEFAULT_INTRO);
        assert!(options.history_path.is_some());
    }

    #[test]
    fn test_build_interpreter_reports_compile_errors() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(br#"{"bad": {"cmd": {}}}"#).unwrap();

        let options = StartupOptions {
            document: Some(file.path().to_path_buf()),
            ..StartupOptions::resolve(&Cli::default(), &Settings::default())
        };
        let err = build_interpreter(&options).unwrap_err();
        assert!(err.to_string().starts_with("Failed to load command tree"));
    }

    #[test]
    fn test_demo_router_enters_toml_sub_mode() {
        let demo = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/router.json");
        let options = StartupOptions {
            document: Some(demo),
            ..StartupOptions::resolve(&Cli::default(), &Settings::default())
        };
        let mut interpreter = build_interpreter(&options).unwrap();
        interpreter.execute_line("conf").unwrap();
        assert_eq!(interpreter.modes().prompt(), "router(config)# ");
        assert!(interpreter.active_tree().find(&["interface", "show"]).is_some());
        assert!(interpreter.active_tree().find(&["interface", "all"]).is_some());
    }

    #[test]
    fn test_demo_commands_are_all_reachable() {
        colored::control::set_override(false);
        let demo = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/router.json");
        let options = StartupOptions {
            document: Some(demo),
            ..StartupOptions::resolve(&Cli::default(), &Settings::default())
        };
        let mut interpreter = build_interpreter(&options).unwrap();
        interpreter.execute_line("configure").unwrap();
        let Ok(crate::interpreter::Outcome::Output(listing)) = interpreter.execute_line("interface ?")
        else {
            panic!("Expected a listing");
        };
        assert!(listing.contains("all "));
        assert!(listing.contains("show "));
    }

    #[test]
    fn test_build_interpreter_without_document() {
        let options = StartupOptions::resolve(&Cli::default(), &Settings::default());
        let interpreter = build_interpreter(&options).unwrap();
        assert!(interpreter.active_tree().root.children.is_empty());
        assert_eq!(interpreter.modes().prompt(), DEFAULT_PROMPT);
    }
}
