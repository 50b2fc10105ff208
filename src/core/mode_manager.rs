// src/core/mode_manager.rs

use crate::{
    core::compiler::{self, LoadError},
    models::{CommandTree, SubtreeSpec},
};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModeError {
    #[error("Cannot enter sub-mode: {0}")]
    Load(#[from] LoadError),
    #[error("Not in a sub-mode; there is nothing to leave.")]
    NothingToExit,
}

/// Which tree is answering commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// `depth` is the number of sub-modes entered, starting at 1.
    SubMode { depth: usize },
}

/// A stack of command trees above the base tree.
///
/// Trees are shared through `Arc`, so a clone of [`ModeManager::active`] stays valid
/// after the stack changes.
#[derive(Debug)]
pub struct ModeManager {
    base: Arc<CommandTree>,
    stack: Vec<Arc<CommandTree>>,
    max_depth: usize,
}

impl ModeManager {
    /// # Arguments
    /// * `base` - The tree active in normal mode.
    /// * `max_depth` - Compiler depth ceiling used for sub-mode documents.
    pub fn new(base: CommandTree, max_depth: usize) -> Self {
        Self {
            base: Arc::new(base),
            stack: Vec::new(),
            max_depth,
        }
    }

    pub fn active(&self) -> &Arc<CommandTree> {
        self.stack.last().unwrap_or(&self.base)
    }

    pub fn mode(&self) -> Mode {
        match self.stack.len() {
            0 => Mode::Normal,
            depth => Mode::SubMode { depth },
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn prompt(&self) -> &str {
        &self.active().prompt
    }

    /// Loads and compiles the sub-mode's document, then makes it the active tree.
    ///
    /// The prompt falls back to the current prompt when the subtree declares none.
    /// On error the stack is left untouched.
    pub fn enter(&mut self, spec: &SubtreeSpec) -> Result<&Arc<CommandTree>, ModeError> {
        let prompt = spec
            .prompt
            .clone()
            .unwrap_or_else(|| self.prompt().to_string());
        let tree = compiler::load_tree(&spec.source, prompt, spec.intro.clone(), self.max_depth)?;

        self.stack.push(Arc::new(tree));
        log::debug!(
            "Entered sub-mode from {} (depth {}).",
            spec.source,
            self.stack.len()
        );
        Ok(self.active())
    }

    /// Leaves the current sub-mode and returns the tree that is active again.
    pub fn exit(&mut self) -> Result<&Arc<CommandTree>, ModeError> {
        self.stack.pop().ok_or(ModeError::NothingToExit)?;
        log::debug!("Left sub-mode (depth {}).", self.stack.len());
        Ok(self.active())
    }
}
