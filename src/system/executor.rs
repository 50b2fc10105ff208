// src/system/executor.rs

use std::collections::HashMap;
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
}

/// The result of a finished command whose output was captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Stdout followed by stderr.
    pub output: String,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// The exit code, with signal termination reported as `-1`.
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(-1)
    }
}

/// Builds a command that hands the whole line to the platform shell, so pipes,
/// redirections and quoting behave as the user typed them.
fn shell_command(command_line: &str) -> StdCommand {
    if cfg!(target_os = "windows") {
        let mut command = StdCommand::new("cmd");
        command.arg("/C").arg(command_line);
        command
    } else {
        let mut command = StdCommand::new("sh");
        command.arg("-c").arg(command_line);
        command
    }
}

/// Runs a command line through the platform shell and captures its output.
///
/// A non-zero exit status is not an error here; callers decide what it means.
pub fn run_and_capture(
    command_line: &str,
    env_vars: &HashMap<String, String>,
) -> Result<CapturedOutput, ExecutionError> {
    let trimmed_command = command_line.trim();
    if trimmed_command.is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }

    log::debug!("Running shell command: {}", trimmed_command);
    let command_output = shell_command(trimmed_command)
        .envs(env_vars)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| ExecutionError::CommandFailed(trimmed_command.to_string(), e))?;

    let mut output = String::from_utf8_lossy(&command_output.stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&command_output.stderr));

    let captured = CapturedOutput {
        code: command_output.status.code(),
        output,
    };
    log::trace!(
        "Command '{}' finished with code {:?}.",
        trimmed_command,
        captured.code
    );
    Ok(captured)
}

/// Runs a command line with the terminal attached, for interactive shell escapes.
pub fn run_attached(command_line: &str) -> Result<ExitStatus, ExecutionError> {
    let trimmed_command = command_line.trim();
    if trimmed_command.is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }

    shell_command(trimmed_command)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| ExecutionError::CommandFailed(trimmed_command.to_string(), e))
}
