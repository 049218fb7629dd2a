//! # Tradebot Deployer
//!
//! Fresh-start redeployment of the trading bot container, either on this
//! host or on a remote one over SSH.
//!
//! ## Architecture
//!
//! - `config`: Configuration loading and existence checks
//! - `deploy`: Container replacement and remote trigger sequencing
//! - `engine`: Container engine seam and docker-CLI implementation
//! - `transport`: Secure copy and remote execution seams (OpenSSH)
//! - `process`: Scoped subprocess execution with captured output
//! - `dry_run`: Command-logging stand-ins for every seam
//! - `error`: Deployment error taxonomy

pub mod config;
pub mod deploy;
pub mod dry_run;
pub mod engine;
pub mod error;
pub mod process;
pub mod transport;

pub use config::Config;
pub use error::{DeployError, DeployResult};
