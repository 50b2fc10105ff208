// src/core/mod.rs

pub mod binder;
pub mod compiler;
pub mod completion;
pub mod dispatcher;
pub mod document;
pub mod help;
pub mod interpolator;
pub mod mode_manager;
pub mod paths;
pub mod resolver;
