//! Remote transport seams: one for copying a file, one for running a command.

use crate::deploy::RemoteEndpoint;
use crate::error::DeployResult;
use crate::process::CommandOutput;
use async_trait::async_trait;
use std::path::Path;

/// Copies a local file to a remote host over an authenticated channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecureCopier: Send + Sync {
    /// Copy `local` to `remote_path` on `endpoint`, overwriting it.
    async fn copy(
        &self,
        local: &Path,
        endpoint: &RemoteEndpoint,
        remote_path: &str,
    ) -> DeployResult<CommandOutput>;
}

/// Runs a single command on a remote host and waits for it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Execute `command` in one session on `endpoint`.
    async fn execute(
        &self,
        endpoint: &RemoteEndpoint,
        command: &str,
    ) -> DeployResult<CommandOutput>;
}
