//! Remote trigger: push the env file, then run the remote update entry point.

use super::target::RemoteEndpoint;
use crate::error::{DeployError, DeployResult};
use crate::process::CommandOutput;
use crate::transport::{RemoteExecutor, SecureCopier};
use std::path::Path;
use std::fs::File;
use tracing::{error, info, warn};

/// Outcome of a successful remote trigger.
#[derive(Debug, Clone)]
pub struct RemoteReport {
    /// Whether the local env file was copied over
    pub uploaded: bool,
    /// Output of the remote update command, verbatim
    pub output: CommandOutput,
}

/// Performs a fresh-start replacement on a remote host.
///
/// Two steps, each attempted once: optional upload, then one remote command.
/// A failed upload means the remote command is never run.
pub struct RemoteDeployTrigger<'a> {
    copier: &'a dyn SecureCopier,
    executor: &'a dyn RemoteExecutor,
}

impl<'a> RemoteDeployTrigger<'a> {
    pub fn new(copier: &'a dyn SecureCopier, executor: &'a dyn RemoteExecutor) -> Self {
        Self { copier, executor }
    }

    /// Upload `local_env_file` if it is a readable file, then run the remote update.
    pub async fn trigger_remote(
        &self,
        endpoint: &RemoteEndpoint,
        local_env_file: Option<&Path>,
    ) -> DeployResult<RemoteReport> {
        info!(%endpoint, work_dir = %endpoint.work_dir, "Triggering remote deployment");

        let uploaded = match local_env_file.filter(|path| readable_file(path)) {
            Some(path) => {
                self.upload(endpoint, path).await?;
                true
            }
            None => {
                info!(env_file = ?local_env_file, "No local env file, keeping the remote one");
                false
            }
        };

        let command = endpoint.remote_command();
        info!(%endpoint, %command, "Running remote update");
        let output = self.executor.execute(endpoint, &command).await?;

        if !output.success() {
            error!(
                %endpoint,
                status = output.status,
                output = %output.combined().trim_end(),
                "Remote update failed"
            );
            return Err(DeployError::RemoteExecutionFailure {
                status: output.status,
                output,
            });
        }

        info!(%endpoint, uploaded, "Remote deployment finished");
        Ok(RemoteReport { uploaded, output })
    }

    async fn upload(&self, endpoint: &RemoteEndpoint, local: &Path) -> DeployResult<()> {
        let remote_path = endpoint.remote_env_path();
        info!(
            local = %local.display(),
            %endpoint,
            %remote_path,
            "Uploading env file"
        );

        let output = self.copier.copy(local, endpoint, &remote_path).await?;
        if !output.success() {
            let diagnostic = output.diagnostic();
            error!(%endpoint, status = output.status, %diagnostic, "Env file upload failed");
            return Err(DeployError::TransferFailure {
                destination: format!("{}:{}", endpoint.destination(), remote_path),
                status: output.status,
                diagnostic,
            });
        }
        Ok(())
    }
}

/// An existing regular file this process can open.
fn readable_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    match File::open(path) {
        Ok(_) => true,
        Err(e) => {
            warn!(env_file = %path.display(), error = %e, "Local env file is not readable, skipping upload");
            false
        }
    }
}
