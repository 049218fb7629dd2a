//! Configuration management for the deployer.
//!
//! Loads settings from an optional config file and `DEPLOY__*` environment
//! variables. Built once in `main` and handed to the components by reference.

use crate::error::{DeployError, DeployResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix (`DEPLOY__REMOTE__HOST=...`).
pub const ENV_PREFIX: &str = "DEPLOY";

/// Optional dotenv file with deployer settings. Not the workload's env file.
pub const DOTENV_FILE: &str = "deploy.env";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The container workload
    #[serde(default)]
    pub workload: WorkloadConfig,
    /// Remote host for `deploy`
    #[serde(default)]
    pub remote: RemoteConfig,
    /// External tool binaries
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Container name, also used as the image reference
    #[serde(default = "default_name")]
    pub name: String,
    /// KEY=VALUE file handed to the container
    #[serde(default = "default_env_file")]
    pub env_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    /// Directory holding the remote copy of this tooling
    #[serde(default = "default_work_dir")]
    pub work_dir: String,
    /// Env file name under `work_dir`
    #[serde(default = "default_env_file")]
    pub env_file_name: String,
    /// Command run inside `work_dir` to replace the container
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
    /// Private key for scp/ssh (otherwise agent / ~/.ssh/config)
    #[serde(default)]
    pub identity_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_docker")]
    pub docker: String,
    #[serde(default = "default_scp")]
    pub scp: String,
    #[serde(default = "default_ssh")]
    pub ssh: String,
}

// Default value functions
fn default_name() -> String {
    "tradebot".to_string()
}

fn default_env_file() -> String {
    ".env".to_string()
}

fn default_port() -> u16 {
    22
}

fn default_work_dir() -> String {
    "~/tradebot".to_string()
}

fn default_entry_point() -> String {
    "./tradebot-deployer update".to_string()
}

fn default_docker() -> String {
    "docker".to_string()
}

fn default_scp() -> String {
    "scp".to_string()
}

fn default_ssh() -> String {
    "ssh".to_string()
}

impl Config {
    /// Load configuration from `deploy.env`, the config file and environment variables.
    ///
    /// `file` is a base name (`deploy` matches `deploy.toml`, `deploy.yaml`, ...)
    /// or a path; it is optional unless `required` is set.
    pub fn load(file: &str, required: bool) -> Result<Self> {
        dotenvy::from_filename(DOTENV_FILE).ok();
        Self::load_with_prefix(file, required, ENV_PREFIX)
    }

    /// Same as [`Config::load`] without the dotenv step, reading
    /// `{prefix}__*` variables.
    fn load_with_prefix(file: &str, required: bool, prefix: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file).required(required))
            .add_source(config::Environment::with_prefix(prefix).separator("__"))
            .build()
            .with_context(|| format!("Failed to build configuration from '{}'", file))?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Check the values a local replace needs.
    pub fn validate_local(&self) -> DeployResult<()> {
        require("workload.name", &self.workload.name)?;
        require("workload.env_file", &self.workload.env_file)?;
        if self.workload.name.trim().contains(char::is_whitespace) {
            return Err(DeployError::Config(format!(
                "workload.name '{}' must not contain whitespace",
                self.workload.name.trim()
            )));
        }
        Ok(())
    }

    /// Check the values a remote trigger needs.
    pub fn validate_remote(&self) -> DeployResult<()> {
        require("remote.host", &self.remote.host)?;
        require("remote.user", &self.remote.user)?;
        require("remote.work_dir", &self.remote.work_dir)?;
        require("remote.env_file_name", &self.remote.env_file_name)?;
        require("remote.entry_point", &self.remote.entry_point)?;
        // scp in legacy mode hands the remote path to a shell unquoted.
        for (key, value) in [
            ("remote.work_dir", &self.remote.work_dir),
            ("remote.env_file_name", &self.remote.env_file_name),
        ] {
            if value.trim().contains(char::is_whitespace) {
                return Err(DeployError::Config(format!(
                    "{} '{}' must not contain whitespace",
                    key,
                    value.trim()
                )));
            }
        }
        if self.remote.port == 0 {
            return Err(DeployError::Config("remote.port must be non-zero".to_string()));
        }
        Ok(())
    }
}

fn require(key: &str, value: &str) -> DeployResult<()> {
    if value.trim().is_empty() {
        return Err(DeployError::Config(format!("{} is not set", key)));
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workload: WorkloadConfig::default(),
            remote: RemoteConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            env_file: default_env_file(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            user: String::new(),
            work_dir: default_work_dir(),
            env_file_name: default_env_file(),
            entry_point: default_entry_point(),
            identity_file: None,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            docker: default_docker(),
            scp: default_scp(),
            ssh: default_ssh(),
        }
    }
}
