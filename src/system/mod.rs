//! # System Interaction Layer
//!
//! Boundary between the interpreter and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: spawns command lines through the platform shell (`sh -c`, or
//!   `cmd /C` on Windows), either capturing their output or with the terminal attached.
//! - **`settings`**: loads the user's `config.toml` (prompt, intro, history, compiler depth).

pub mod executor;
pub mod settings;
