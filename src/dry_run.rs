//! Dry-run mode: log the exact commands a real run would issue, run none.
//!
//! Every call reports success, so a dry run walks the whole sequence and
//! shows each step an operator would see.

use crate::deploy::RemoteEndpoint;
use crate::engine::{ContainerEngine, DockerCli};
use crate::error::DeployResult;
use crate::process::{CommandLine, CommandOutput};
use crate::transport::{RemoteExecutor, ScpCopier, SecureCopier, SshExecutor};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Wraps a real implementation and records the commands it would run.
pub struct DryRun<T> {
    inner: T,
    issued: Mutex<Vec<String>>,
}

impl<T> DryRun<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            issued: Mutex::new(Vec::new()),
        }
    }

    /// Commands "issued" so far, in order.
    pub fn issued(&self) -> Vec<String> {
        self.issued
            .lock()
            .map(|issued| issued.clone())
            .unwrap_or_default()
    }

    fn record(&self, command: CommandLine) -> DeployResult<CommandOutput> {
        let rendered = command.to_string();
        info!(command = %rendered, "[dry-run] would run");
        if let Ok(mut issued) = self.issued.lock() {
            issued.push(rendered);
        }
        Ok(CommandOutput::ok())
    }
}

#[async_trait]
impl ContainerEngine for DryRun<DockerCli> {
    async fn stop(&self, name: &str) -> DeployResult<CommandOutput> {
        self.record(self.inner.stop_command(name))
    }

    async fn force_remove(&self, name: &str) -> DeployResult<CommandOutput> {
        self.record(self.inner.remove_command(name))
    }

    async fn run_detached(
        &self,
        name: &str,
        image: &str,
        env_file: &Path,
    ) -> DeployResult<CommandOutput> {
        self.record(self.inner.run_command(name, image, env_file))
    }
}

#[async_trait]
impl SecureCopier for DryRun<ScpCopier> {
    async fn copy(
        &self,
        local: &Path,
        endpoint: &RemoteEndpoint,
        remote_path: &str,
    ) -> DeployResult<CommandOutput> {
        self.record(self.inner.copy_command(local, endpoint, remote_path))
    }
}

#[async_trait]
impl RemoteExecutor for DryRun<SshExecutor> {
    async fn execute(
        &self,
        endpoint: &RemoteEndpoint,
        command: &str,
    ) -> DeployResult<CommandOutput> {
        self.record(self.inner.execute_command(endpoint, command))
    }
}
