//! What gets deployed, and where.

use crate::config::Config;
use crate::error::DeployResult;
use std::fmt;
use std::path::{Path, PathBuf};

/// A single workload instance on the local host.
///
/// `name` is both the container name and the image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    name: String,
    env_file: PathBuf,
}

impl DeploymentTarget {
    pub fn new(name: impl Into<String>, env_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            env_file: env_file.into(),
        }
    }

    /// Build from the `workload` section of the configuration.
    pub fn from_config(config: &Config) -> DeployResult<Self> {
        config.validate_local()?;
        Ok(Self::new(
            config.workload.name.trim(),
            &config.workload.env_file,
        ))
    }

    /// Container name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Image reference; always the same as the container name.
    pub fn image(&self) -> &str {
        &self.name
    }

    pub fn env_file(&self) -> &Path {
        &self.env_file
    }
}

/// A remote host running its own copy of this tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Deployment root on the remote host
    pub work_dir: String,
    /// File name of the env file under `work_dir`
    pub env_file_name: String,
    /// Update command, run from inside `work_dir`
    pub entry_point: String,
    /// Private key passed to scp/ssh with `-i`
    pub identity_file: Option<PathBuf>,
}

impl RemoteEndpoint {
    /// Build from the `remote` section of the configuration.
    pub fn from_config(config: &Config) -> DeployResult<Self> {
        config.validate_remote()?;
        let remote = &config.remote;
        Ok(Self {
            host: remote.host.trim().to_string(),
            port: remote.port,
            user: remote.user.trim().to_string(),
            work_dir: normalize_dir(remote.work_dir.trim()),
            env_file_name: remote.env_file_name.clone(),
            entry_point: remote.entry_point.clone(),
            identity_file: remote.identity_file.as_ref().map(PathBuf::from),
        })
    }

    /// `user@host`, as scp and ssh expect it.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Where the env file lands on the remote host.
    pub fn remote_env_path(&self) -> String {
        if self.work_dir.ends_with('/') {
            format!("{}{}", self.work_dir, self.env_file_name)
        } else {
            format!("{}/{}", self.work_dir, self.env_file_name)
        }
    }

    /// The single shell command run on the remote host.
    ///
    /// A leading `~/` is left outside the quotes so the remote shell expands it.
    pub fn remote_command(&self) -> String {
        let dir = match self.work_dir.strip_prefix("~/") {
            Some(rest) => format!("~/{}", shell_quote(rest)),
            None if self.work_dir == "~" => "~".to_string(),
            None => shell_quote(&self.work_dir),
        };
        format!("cd {} && {}", dir, self.entry_point)
    }
}

impl fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

/// Strip trailing slashes, keeping a bare `/`.
fn normalize_dir(dir: &str) -> String {
    match dir.trim_end_matches('/') {
        "" if dir.starts_with('/') => "/".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Single-quote `s` for a POSIX shell.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployError;

    fn endpoint(work_dir: &str) -> RemoteEndpoint {
        RemoteEndpoint {
            host: "bot.example.com".to_string(),
            port: 2222,
            user: "deploy".to_string(),
            work_dir: work_dir.to_string(),
            env_file_name: ".env".to_string(),
            entry_point: "./tradebot-deployer update".to_string(),
            identity_file: None,
        }
    }

    #[test]
    fn test_target_name_is_image() {
        let target = DeploymentTarget::new("tradebot", ".env");
        assert_eq!(target.name(), "tradebot");
        assert_eq!(target.image(), target.name());
        assert_eq!(target.env_file(), Path::new(".env"));
    }

    #[test]
    fn test_endpoint_paths() {
        let ep = endpoint("/srv/tradebot");
        assert_eq!(ep.destination(), "deploy@bot.example.com");
        assert_eq!(ep.remote_env_path(), "/srv/tradebot/.env");
        assert_eq!(ep.to_string(), "deploy@bot.example.com:2222");
    }

    #[test]
    fn test_remote_command_quotes_directory() {
        assert_eq!(
            endpoint("/srv/trade bot").remote_command(),
            "cd '/srv/trade bot' && ./tradebot-deployer update"
        );
        assert_eq!(
            endpoint("~/tradebot").remote_command(),
            "cd ~/'tradebot' && ./tradebot-deployer update"
        );
        assert_eq!(
            endpoint("~").remote_command(),
            "cd ~ && ./tradebot-deployer update"
        );
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.remote.host = "bot.example.com".to_string();
        config.remote.user = "deploy".to_string();
        config.remote.work_dir = "/srv/tradebot/".to_string();

        let ep = RemoteEndpoint::from_config(&config).unwrap();
        assert_eq!(ep.port, 22);
        assert_eq!(ep.work_dir, "/srv/tradebot");
        assert_eq!(ep.remote_env_path(), "/srv/tradebot/.env");

        config.remote.work_dir = "/".to_string();
        let ep = RemoteEndpoint::from_config(&config).unwrap();
        assert_eq!(ep.remote_env_path(), "/.env");
    }

    #[test]
    fn test_from_config_requires_host() {
        let config = Config::default();
        assert!(matches!(
            RemoteEndpoint::from_config(&config),
            Err(DeployError::Config(_))
        ));
    }
}
