//! Container engine seam.
//!
//! The replacer only needs three verbs against a name-addressed container.
//! Implementations report the engine's exit status and diagnostics as-is;
//! deciding which failures matter is left to the caller.

use crate::error::DeployResult;
use crate::process::CommandOutput;
use async_trait::async_trait;
use std::path::Path;

/// Trait for container engines that can stop, remove and run containers.
///
/// `Err` is reserved for failing to talk to the engine at all (e.g. the CLI
/// binary is missing). A non-zero exit is returned as `Ok` output.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Stop the container called `name`.
    async fn stop(&self, name: &str) -> DeployResult<CommandOutput>;

    /// Remove the container called `name`, killing it if still running.
    async fn force_remove(&self, name: &str) -> DeployResult<CommandOutput>;

    /// Start a detached container `name` from `image`, environment read from `env_file`.
    async fn run_detached(
        &self,
        name: &str,
        image: &str,
        env_file: &Path,
    ) -> DeployResult<CommandOutput>;
}
