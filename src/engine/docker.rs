//! Docker-compatible CLI engine.
//!
//! Works with any binary that speaks the docker CLI dialect (`docker`,
//! `podman`, `nerdctl`).

use super::traits::ContainerEngine;
use crate::error::DeployResult;
use crate::process::{CommandLine, CommandOutput, CommandRunner};
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// Container engine driven through the docker CLI.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    /// Create an engine that invokes `binary` (usually `docker`).
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn stop_command(&self, name: &str) -> CommandLine {
        CommandLine::new(&self.binary).args(["stop", name])
    }

    pub fn remove_command(&self, name: &str) -> CommandLine {
        CommandLine::new(&self.binary).args(["rm", "-f", name])
    }

    pub fn run_command(&self, name: &str, image: &str, env_file: &Path) -> CommandLine {
        CommandLine::new(&self.binary)
            .args(["run", "-d", "--name", name, "--env-file"])
            .arg(env_file)
            .arg(image)
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

#[async_trait]
impl ContainerEngine for DockerCli {
    async fn stop(&self, name: &str) -> DeployResult<CommandOutput> {
        debug!(%name, "docker stop");
        CommandRunner::run(&self.stop_command(name)).await
    }

    async fn force_remove(&self, name: &str) -> DeployResult<CommandOutput> {
        debug!(%name, "docker rm -f");
        CommandRunner::run(&self.remove_command(name)).await
    }

    async fn run_detached(
        &self,
        name: &str,
        image: &str,
        env_file: &Path,
    ) -> DeployResult<CommandOutput> {
        debug!(%name, %image, env_file = %env_file.display(), "docker run -d");
        CommandRunner::run(&self.run_command(name, image, env_file)).await
    }
}
