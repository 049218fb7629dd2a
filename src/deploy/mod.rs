//! Deployment state transitions.
//!
//! - `target`: the workload and remote host descriptions
//! - `replacer`: local stop → remove → run, only run gates success
//! - `remote`: conditional env upload, then one remote update command

mod remote;
mod replacer;
mod target;

pub use remote::{RemoteDeployTrigger, RemoteReport};
pub use replacer::{ContainerReplacer, ReplaceReport};
pub use target::{DeploymentTarget, RemoteEndpoint};
