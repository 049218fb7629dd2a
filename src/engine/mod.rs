//! Container engine integration.
//!
//! - `traits`: the `ContainerEngine` seam the replacer is written against
//! - `docker`: docker-CLI implementation (also drives podman)
//! - teardown outcome classification for the best-effort stop/remove steps

mod docker;
mod traits;

pub use docker::DockerCli;
pub use traits::ContainerEngine;

#[cfg(test)]
pub use traits::MockContainerEngine;

use crate::process::CommandOutput;

/// Engine messages meaning the container does not exist.
const ABSENT_MARKERS: &[&str] = &[
    "no such container",
    "no container with name or id",
    "is not running",
];

/// Engine messages meaning the engine itself could not be reached.
const UNREACHABLE_MARKERS: &[&str] = &[
    "cannot connect to the docker daemon",
    "cannot connect to podman",
    "error during connect",
    "is the docker daemon running",
];

/// Result of a best-effort teardown step (stop or forced remove).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownOutcome {
    /// The engine reported success.
    Done,
    /// There was nothing to stop or remove.
    Absent,
    /// The engine could not be reached.
    Unreachable(String),
    /// Some other failure; logged and ignored.
    Failed(String),
}

impl TeardownOutcome {
    /// Classify the output of a stop or remove call.
    pub fn classify(output: &CommandOutput) -> Self {
        if output.success() {
            return TeardownOutcome::Done;
        }

        let diagnostic = output.diagnostic();
        let lowered = diagnostic.to_lowercase();

        if UNREACHABLE_MARKERS.iter().any(|m| lowered.contains(m)) {
            TeardownOutcome::Unreachable(diagnostic)
        } else if ABSENT_MARKERS.iter().any(|m| lowered.contains(m)) {
            TeardownOutcome::Absent
        } else {
            TeardownOutcome::Failed(diagnostic)
        }
    }
}
