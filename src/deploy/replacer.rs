//! Local fresh-start replacement of the workload container.

use super::target::DeploymentTarget;
use crate::engine::{ContainerEngine, TeardownOutcome};
use crate::error::{DeployError, DeployResult};
use crate::process::CommandOutput;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

/// Outcome of a successful replace.
#[derive(Debug, Clone)]
pub struct ReplaceReport {
    pub name: String,
    pub stop: TeardownOutcome,
    pub remove: TeardownOutcome,
    /// Container ID printed by the engine for the new instance
    pub container_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ReplaceReport {
    /// First 12 characters of the container ID, as `docker ps` shows it.
    pub fn short_id(&self) -> &str {
        short_id(&self.container_id)
    }
}

/// Forces the named container into a freshly started state.
///
/// Stop and remove are best-effort; only the run step decides the result.
pub struct ContainerReplacer<'a> {
    engine: &'a dyn ContainerEngine,
}

impl<'a> ContainerReplacer<'a> {
    pub fn new(engine: &'a dyn ContainerEngine) -> Self {
        Self { engine }
    }

    /// Stop, remove and start `target` again.
    ///
    /// Any state inside the previous instance is lost. Nothing is retried.
    pub async fn replace(&self, target: &DeploymentTarget) -> DeployResult<ReplaceReport> {
        let started_at = Utc::now();
        let name = target.name();

        info!(
            %name,
            image = %target.image(),
            env_file = %target.env_file().display(),
            "Replacing container"
        );

        // Refuse before touching the running instance.
        if !target.env_file().is_file() {
            error!(env_file = %target.env_file().display(), "Env file missing, container left untouched");
            return Err(DeployError::MissingEnvFile {
                path: target.env_file().to_path_buf(),
            });
        }

        let (stop, remove) = self.teardown(name).await?;

        info!(%name, "[3/3] Starting fresh container");
        let output = self
            .engine
            .run_detached(name, target.image(), target.env_file())
            .await?;

        if !output.success() {
            let diagnostic = output.diagnostic();
            error!(%name, status = output.status, %diagnostic, "Container failed to start");
            return Err(DeployError::StartFailure {
                name: name.to_string(),
                status: output.status,
                diagnostic,
            });
        }

        let container_id = output.stdout.trim().to_string();
        let finished_at = Utc::now();
        info!(
            %name,
            container_id = %short_id(&container_id),
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "Container started"
        );

        Ok(ReplaceReport {
            name: name.to_string(),
            stop,
            remove,
            container_id,
            started_at,
            finished_at,
        })
    }

    /// Stop then force-remove `name`, tolerating absence.
    ///
    /// Safe to call any number of times whether or not the container exists.
    /// Only an unreachable engine or a missing engine binary is fatal.
    pub async fn teardown(&self, name: &str) -> DeployResult<(TeardownOutcome, TeardownOutcome)> {
        info!(%name, "[1/3] Stopping container");
        let output = self.engine.stop(name).await?;
        let stop = Self::tolerate("stop", name, &output)?;

        info!(%name, "[2/3] Removing container");
        let output = self.engine.force_remove(name).await?;
        let remove = Self::tolerate("remove", name, &output)?;

        Ok((stop, remove))
    }

    fn tolerate(step: &str, name: &str, output: &CommandOutput) -> DeployResult<TeardownOutcome> {
        let outcome = TeardownOutcome::classify(output);
        match &outcome {
            TeardownOutcome::Done => debug!(%step, %name, "Done"),
            TeardownOutcome::Absent => info!(%step, %name, "No existing container, nothing to do"),
            TeardownOutcome::Failed(diagnostic) => warn!(
                %step,
                %name,
                status = output.status,
                %diagnostic,
                "Best-effort step failed, continuing"
            ),
            TeardownOutcome::Unreachable(diagnostic) => {
                error!(%step, %name, %diagnostic, "Container engine unreachable");
                return Err(DeployError::EngineUnavailable {
                    diagnostic: diagnostic.clone(),
                });
            }
        }
        Ok(outcome)
    }
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}
