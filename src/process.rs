//! Scoped subprocess execution.
//!
//! Every external tool (container engine, scp, ssh) is launched the same way:
//! build a [`CommandLine`], run it to completion, capture exit status and both
//! output streams. No timeout is applied here; whatever the tool itself does
//! on a stalled transport is what the caller gets.

use crate::error::{DeployError, DeployResult};
use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// A program plus its arguments, not yet executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<OsString>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg.replace('\'', r"'\''"))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Exit status and captured output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    /// Exit code; -1 when the process was terminated by a signal
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Successful, empty output.
    pub fn ok() -> Self {
        Self::new(0, "", "")
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }

    /// The most useful diagnostic text: stderr if present, else stdout.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Runs command lines to completion.
pub struct CommandRunner;

impl CommandRunner {
    /// Run `command` and wait for it, capturing stdout and stderr.
    ///
    /// A non-zero exit is not an error here; only failing to launch is.
    pub async fn run(command: &CommandLine) -> DeployResult<CommandOutput> {
        debug!(command = %command, "Running command");

        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| DeployError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let output = CommandOutput::from(output);
        debug!(
            program = %command.program,
            status = output.status,
            "Command finished"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_arguments_with_spaces() {
        let cmd = CommandLine::new("ssh")
            .args(["-p", "22", "bot@example.com"])
            .arg("cd '/srv/bot' && ./update");
        assert_eq!(
            cmd.to_string(),
            r#"ssh -p 22 bot@example.com 'cd '\''/srv/bot'\'' && ./update'"#
        );
    }

    #[test]
    fn test_combined_output() {
        assert_eq!(CommandOutput::new(0, "out\n", "").combined(), "out\n");
        assert_eq!(CommandOutput::new(1, "", "err\n").combined(), "err\n");
        assert_eq!(
            CommandOutput::new(1, "out\n", "err\n").combined(),
            "out\nerr\n"
        );
    }

    #[test]
    fn test_diagnostic_prefers_stderr() {
        let output = CommandOutput::new(1, "stdout text", "  stderr text\n");
        assert_eq!(output.diagnostic(), "stderr text");

        let output = CommandOutput::new(1, "stdout text\n", "");
        assert_eq!(output.diagnostic(), "stdout text");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captures_status_and_output() {
        let cmd = CommandLine::new("sh").args(["-c", "echo hello; echo oops >&2; exit 3"]);
        let output = CommandRunner::run(&cmd).await.unwrap();

        assert_eq!(output.status, 3);
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_run_missing_program_is_spawn_error() {
        let cmd = CommandLine::new("nonexistent_command_12345");
        let result = CommandRunner::run(&cmd).await;

        assert!(matches!(result, Err(DeployError::Spawn { .. })));
    }
}
