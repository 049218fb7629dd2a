//! Deployment error taxonomy.
//!
//! A container that is simply absent during teardown is not an error at all
//! (see [`TeardownOutcome`](crate::engine::TeardownOutcome)); everything here
//! terminates the current operation.

use crate::process::CommandOutput;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of a local replace or a remote trigger.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The engine refused to start the fresh container.
    #[error("failed to start container '{name}' (exit {status}): {diagnostic}")]
    StartFailure {
        name: String,
        status: i32,
        diagnostic: String,
    },

    /// The env file could not be copied to the remote host.
    #[error("failed to copy env file to {destination} (exit {status}): {diagnostic}")]
    TransferFailure {
        destination: String,
        status: i32,
        diagnostic: String,
    },

    /// The remote update command exited non-zero.
    #[error("remote update exited with status {status}")]
    RemoteExecutionFailure { status: i32, output: CommandOutput },

    /// The container engine daemon could not be reached during teardown.
    #[error("container engine unavailable: {diagnostic}")]
    EngineUnavailable { diagnostic: String },

    /// The env file for the new container does not exist.
    #[error("env file not found: {}", .path.display())]
    MissingEnvFile { path: PathBuf },

    /// A tool binary (docker, scp, ssh) could not be launched.
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A required configuration value is missing or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DeployError {
    /// Process exit code for this failure.
    ///
    /// A remote failure exits with the remote status so automation sees the
    /// same code it would on the remote host. Everything else exits 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            DeployError::RemoteExecutionFailure { status, .. } => {
                u8::try_from(*status).ok().filter(|c| *c != 0).unwrap_or(1)
            }
            _ => 1,
        }
    }

    /// Short operator-facing hint printed after the error line.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            DeployError::StartFailure { .. } => {
                Some("check that the image exists locally and the env file is well-formed")
            }
            DeployError::TransferFailure { .. } => {
                Some("check SSH credentials and that the remote working directory exists")
            }
            DeployError::EngineUnavailable { .. } => Some("is the container engine running?"),
            DeployError::MissingEnvFile { .. } => {
                Some("create the env file or pass --env-file")
            }
            _ => None,
        }
    }
}

/// Convenience alias used across the library.
pub type DeployResult<T> = Result<T, DeployError>;
