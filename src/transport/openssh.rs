//! OpenSSH client implementations (`scp` and `ssh` binaries).
//!
//! Both run with `BatchMode=yes`: a missing key or unknown host fails fast
//! instead of blocking on an interactive prompt.

use super::traits::{RemoteExecutor, SecureCopier};
use crate::deploy::RemoteEndpoint;
use crate::error::DeployResult;
use crate::process::{CommandLine, CommandOutput, CommandRunner};
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

const BATCH_MODE: &str = "BatchMode=yes";

fn with_identity(command: CommandLine, endpoint: &RemoteEndpoint) -> CommandLine {
    match &endpoint.identity_file {
        Some(key) => command.arg("-i").arg(key),
        None => command,
    }
}

/// Copies files with `scp`.
#[derive(Debug, Clone)]
pub struct ScpCopier {
    binary: String,
}

impl ScpCopier {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn copy_command(
        &self,
        local: &Path,
        endpoint: &RemoteEndpoint,
        remote_path: &str,
    ) -> CommandLine {
        let command = CommandLine::new(&self.binary)
            .args(["-o", BATCH_MODE, "-P"])
            .arg(endpoint.port.to_string());
        with_identity(command, endpoint)
            .arg(local)
            .arg(format!("{}:{}", endpoint.destination(), remote_path))
    }
}

impl Default for ScpCopier {
    fn default() -> Self {
        Self::new("scp")
    }
}

#[async_trait]
impl SecureCopier for ScpCopier {
    async fn copy(
        &self,
        local: &Path,
        endpoint: &RemoteEndpoint,
        remote_path: &str,
    ) -> DeployResult<CommandOutput> {
        debug!(local = %local.display(), %endpoint, %remote_path, "scp");
        CommandRunner::run(&self.copy_command(local, endpoint, remote_path)).await
    }
}

/// Runs remote commands with `ssh`.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    binary: String,
}

impl SshExecutor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn execute_command(&self, endpoint: &RemoteEndpoint, command: &str) -> CommandLine {
        let ssh = CommandLine::new(&self.binary)
            .args(["-o", BATCH_MODE, "-p"])
            .arg(endpoint.port.to_string());
        with_identity(ssh, endpoint)
            .arg(endpoint.destination())
            .arg(command)
    }
}

impl Default for SshExecutor {
    fn default() -> Self {
        Self::new("ssh")
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn execute(
        &self,
        endpoint: &RemoteEndpoint,
        command: &str,
    ) -> DeployResult<CommandOutput> {
        debug!(%endpoint, %command, "ssh");
        CommandRunner::run(&self.execute_command(endpoint, command)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn endpoint() -> RemoteEndpoint {
        RemoteEndpoint {
            host: "10.0.0.5".to_string(),
            port: 2222,
            user: "deploy".to_string(),
            work_dir: "/srv/tradebot".to_string(),
            env_file_name: ".env".to_string(),
            entry_point: "./tradebot-deployer update".to_string(),
            identity_file: None,
        }
    }

    #[test]
    fn test_scp_command() {
        let ep = endpoint();
        let cmd = ScpCopier::default().copy_command(Path::new(".env"), &ep, &ep.remote_env_path());
        assert_eq!(
            cmd.to_string(),
            "scp -o BatchMode=yes -P 2222 .env deploy@10.0.0.5:/srv/tradebot/.env"
        );
    }

    #[test]
    fn test_ssh_command() {
        let ep = endpoint();
        let cmd = SshExecutor::default().execute_command(&ep, &ep.remote_command());
        assert_eq!(cmd.program(), "ssh");
        assert_eq!(
            cmd.arguments().last().map(|a| a.to_string_lossy().into_owned()),
            Some("cd '/srv/tradebot' && ./tradebot-deployer update".to_string())
        );
        assert!(cmd.to_string().starts_with("ssh -o BatchMode=yes -p 2222 deploy@10.0.0.5 "));
    }

    #[test]
    fn test_identity_file_is_passed() {
        let mut ep = endpoint();
        ep.identity_file = Some(PathBuf::from("/home/op/.ssh/bot_ed25519"));

        let cmd = SshExecutor::default().execute_command(&ep, "true");
        assert_eq!(
            cmd.to_string(),
            "ssh -o BatchMode=yes -p 2222 -i /home/op/.ssh/bot_ed25519 deploy@10.0.0.5 true"
        );

        let cmd = ScpCopier::new("/usr/bin/scp").copy_command(Path::new("a.env"), &ep, "/tmp/.env");
        assert_eq!(
            cmd.to_string(),
            "/usr/bin/scp -o BatchMode=yes -P 2222 -i /home/op/.ssh/bot_ed25519 a.env deploy@10.0.0.5:/tmp/.env"
        );
    }
}
