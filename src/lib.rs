//! # jcmd
//!
//! Hierarchical, line-oriented command interpreters described by a declarative
//! command tree (JSON, TOML, or an in-memory `serde_json::Value`).
//!
//! A document is compiled once into an immutable [`models::CommandTree`]. Each input
//! line is then resolved against the active tree, its arguments are bound and checked,
//! and the command is dispatched to a shell, a host method or a host func. Commands may
//! also switch to a sub-mode with a tree of its own.
//!
//! ```no_run
//! use jcmd::{core::document::DocumentSource, interpreter::Interpreter};
//!
//! let source = DocumentSource::file("router.json");
//! let mut interpreter = Interpreter::from_source(&source, "router> ", None, 64)?;
//! interpreter
//!     .methods_mut()
//!     .register("version", |_| Ok("1.0".to_string()));
//! # Ok::<(), jcmd::core::compiler::LoadError>(())
//! ```

pub mod cli;
pub mod constants;
pub mod core;
pub mod interpreter;
pub mod models;
pub mod system;
