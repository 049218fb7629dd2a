//! Tradebot Deployer - Main Entry Point
//!
//! `update` replaces the bot container on this host; `deploy` pushes the env
//! file to the remote host and runs `update` there.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tracing::{info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tradebot_deployer::config::Config;
use tradebot_deployer::deploy::{
    ContainerReplacer, DeploymentTarget, RemoteDeployTrigger, RemoteEndpoint,
};
use tradebot_deployer::dry_run::DryRun;
use tradebot_deployer::engine::{ContainerEngine, DockerCli};
use tradebot_deployer::error::DeployError;
use tradebot_deployer::process::CommandOutput;
use tradebot_deployer::transport::{RemoteExecutor, ScpCopier, SecureCopier, SshExecutor};

/// Tradebot Deployer CLI
#[derive(Parser)]
#[command(name = "tradebot-deployer")]
#[command(version, about = "Fresh-start redeployment of the trading bot container")]
struct Cli {
    /// Config file, base name or path (default: optional `deploy.*`)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log the commands that would run without running them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stop, remove and start the bot container on this host
    Update {
        /// Container and image name
        #[arg(short, long)]
        name: Option<String>,

        /// Env file handed to the container
        #[arg(short, long)]
        env_file: Option<String>,
    },

    /// Upload the env file to the remote host and run its update
    Deploy {
        /// Remote host
        #[arg(long)]
        host: Option<String>,

        /// Remote SSH port
        #[arg(short, long)]
        port: Option<u16>,

        /// Remote SSH user
        #[arg(short, long)]
        user: Option<String>,

        /// Deployment directory on the remote host
        #[arg(short, long)]
        work_dir: Option<String>,

        /// Local env file to upload (skipped if it does not exist)
        #[arg(short, long)]
        env_file: Option<String>,

        /// Private key for scp/ssh
        #[arg(short, long)]
        identity_file: Option<String>,
    },

    /// Print the resolved configuration as JSON
    Config,
}

const LOG_DIR: &str = "logs";
const DEFAULT_CONFIG: &str = "deploy";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match init_logging(cli.json_logs, cli.command.writes_log_file()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: failed to initialise logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_failure(&err),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(file) => Config::load(file, true)?,
        None => Config::load(DEFAULT_CONFIG, false)?,
    };
    cli.command.apply_overrides(&mut config);

    match cli.command {
        Commands::Update { .. } => {
            print_banner(cli.dry_run);
            log_config(&config);
            run_update(&config, cli.dry_run).await
        }
        Commands::Deploy { .. } => {
            print_banner(cli.dry_run);
            log_config(&config);
            run_deploy(&config, cli.dry_run).await
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

impl Commands {
    /// `config` only prints; it leaves no log file behind.
    fn writes_log_file(&self) -> bool {
        !matches!(self, Commands::Config)
    }

    /// Apply the subcommand's flags on top of the loaded configuration.
    fn apply_overrides(&self, config: &mut Config) {
        match self {
            Commands::Update { name, env_file } => {
                if let Some(name) = name {
                    config.workload.name = name.clone();
                }
                if let Some(env_file) = env_file {
                    config.workload.env_file = env_file.clone();
                }
            }
            Commands::Deploy {
                host,
                port,
                user,
                work_dir,
                env_file,
                identity_file,
            } => {
                let remote = &mut config.remote;
                if let Some(host) = host {
                    remote.host = host.clone();
                }
                if let Some(port) = port {
                    remote.port = *port;
                }
                if let Some(user) = user {
                    remote.user = user.clone();
                }
                if let Some(work_dir) = work_dir {
                    remote.work_dir = work_dir.clone();
                }
                if identity_file.is_some() {
                    remote.identity_file = identity_file.clone();
                }
                if let Some(env_file) = env_file {
                    config.workload.env_file = env_file.clone();
                }
            }
            Commands::Config => {}
        }
    }
}

/// Replace the container on this host.
async fn run_update(config: &Config, dry_run: bool) -> Result<()> {
    let target = DeploymentTarget::from_config(config)?;

    let docker = DockerCli::new(&config.tools.docker);
    let engine: Box<dyn ContainerEngine> = if dry_run {
        Box::new(DryRun::new(docker))
    } else {
        Box::new(docker)
    };

    let report = ContainerReplacer::new(engine.as_ref())
        .replace(&target)
        .await?;

    println!("{} started ({})", report.name, report.short_id());
    Ok(())
}

/// Push the env file and replace the container on the remote host.
async fn run_deploy(config: &Config, dry_run: bool) -> Result<()> {
    let endpoint = RemoteEndpoint::from_config(config)?;
    let local_env = Path::new(&config.workload.env_file);

    let scp = ScpCopier::new(&config.tools.scp);
    let ssh = SshExecutor::new(&config.tools.ssh);
    let (copier, executor): (Box<dyn SecureCopier>, Box<dyn RemoteExecutor>) = if dry_run {
        (Box::new(DryRun::new(scp)), Box::new(DryRun::new(ssh)))
    } else {
        (Box::new(scp), Box::new(ssh))
    };

    let result = RemoteDeployTrigger::new(copier.as_ref(), executor.as_ref())
        .trigger_remote(&endpoint, Some(local_env))
        .await;

    match result {
        Ok(report) => {
            relay_output(&report.output);
            info!(uploaded = report.uploaded, "Remote output relayed");
            println!("{} redeployed on {}", config.workload.name, endpoint);
            Ok(())
        }
        Err(err) => {
            if let DeployError::RemoteExecutionFailure { output, .. } = &err {
                relay_output(output);
            }
            Err(err.into())
        }
    }
}

/// Write remote output to our own stdout/stderr unchanged.
fn relay_output(output: &CommandOutput) {
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    if let Err(e) = relay(output, &mut stdout.lock(), &mut stderr.lock()) {
        warn!(error = %e, "Failed to relay remote output");
    }
}

fn relay(output: &CommandOutput, out: &mut impl Write, err: &mut impl Write) -> std::io::Result<()> {
    out.write_all(output.stdout.as_bytes())?;
    out.flush()?;
    err.write_all(output.stderr.as_bytes())?;
    err.flush()
}

/// Process exit code for a failed run.
///
/// Looks through the whole error chain so added context does not hide a
/// remote status.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    deploy_error(err).map_or(1, DeployError::exit_code)
}

fn deploy_error(err: &anyhow::Error) -> Option<&DeployError> {
    err.chain().find_map(|cause| cause.downcast_ref::<DeployError>())
}

/// Print the diagnostic and map the failure to an exit code.
fn report_failure(err: &anyhow::Error) -> ExitCode {
    eprintln!("error: {:#}", err);
    if let Some(hint) = deploy_error(err).and_then(DeployError::hint) {
        eprintln!("hint: {}", hint);
    }
    ExitCode::from(exit_code_for(err))
}

/// Initialize logging to stdout, plus an hourly rolling file when `to_file` is set.
fn init_logging(json: bool, to_file: bool) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

    let (writer, guard) = if to_file {
        std::fs::create_dir_all(LOG_DIR)?;
        let file_appender = tracing_appender::rolling::hourly(LOG_DIR, "deployer.log");
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        (BoxMakeWriter::new(std::io::stdout.and(file_writer)), Some(guard))
    } else {
        (BoxMakeWriter::new(std::io::stdout), None)
    };

    let filter = EnvFilter::from_default_env()
        .add_directive("tradebot_deployer=debug".parse()?)
        .add_directive(Level::INFO.into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(false);

    if json {
        builder.json().init();
    } else {
        builder.with_ansi(false).init();
    }

    Ok(guard)
}

fn print_banner(dry_run: bool) {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        timestamp = %Utc::now().to_rfc3339(),
        dry_run,
        "Tradebot Deployer"
    );
}

/// Log configuration on startup.
fn log_config(config: &Config) {
    info!("Configuration:");
    info!("   Workload: {}", config.workload.name);
    info!("   Env file: {}", config.workload.env_file);
    info!("   Engine:   {}", config.tools.docker);
    if !config.remote.host.is_empty() {
        info!(
            "   Remote:   {}@{}:{} ({})",
            config.remote.user, config.remote.host, config.remote.port, config.remote.work_dir
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_parse_update() {
        let cli = Cli::try_parse_from(["tradebot-deployer", "update", "--env-file", "prod.env"]).unwrap();
        assert!(!cli.dry_run);
        match cli.command {
            Commands::Update { name, env_file } => {
                assert!(name.is_none());
                assert_eq!(env_file.as_deref(), Some("prod.env"));
            }
            _ => panic!("expected update"),
        }
    }

    #[test]
    fn test_parse_deploy_with_global_flags() {
        let cli = Cli::try_parse_from([
            "tradebot-deployer",
            "deploy",
            "--host",
            "10.0.0.5",
            "-p",
            "2222",
            "--dry-run",
            "--config",
            "prod.toml",
        ])
        .unwrap();

        assert!(cli.dry_run);
        assert_eq!(cli.config.as_deref(), Some("prod.toml"));
        match cli.command {
            Commands::Deploy { host, port, .. } => {
                assert_eq!(host.as_deref(), Some("10.0.0.5"));
                assert_eq!(port, Some(2222));
            }
            _ => panic!("expected deploy"),
        }
    }

    #[test]
    fn test_deploy_flags_override_config() {
        let cli = Cli::try_parse_from([
            "tradebot-deployer",
            "deploy",
            "--host",
            "10.0.0.5",
            "--user",
            "ops",
            "--env-file",
            "prod.env",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.command.apply_overrides(&mut config);

        assert_eq!(config.workload.env_file, "prod.env");
        assert_eq!(config.remote.host, "10.0.0.5");
        assert_eq!(config.remote.user, "ops");
        assert_eq!(config.remote.port, 22);
        assert!(config.remote.identity_file.is_none());
    }

    #[test]
    fn test_update_flags_override_config() {
        let cli = Cli::try_parse_from(["tradebot-deployer", "update", "-n", "arbbot"]).unwrap();
        let mut config = Config::default();
        cli.command.apply_overrides(&mut config);

        assert_eq!(config.workload.name, "arbbot");
        assert_eq!(config.workload.env_file, ".env");
    }

    #[test]
    fn test_config_command_writes_no_log_file() {
        let config = Cli::try_parse_from(["tradebot-deployer", "config"]).unwrap();
        assert!(!config.command.writes_log_file());

        let update = Cli::try_parse_from(["tradebot-deployer", "update"]).unwrap();
        assert!(update.command.writes_log_file());
    }

    #[test]
    fn test_exit_code_mapping() {
        let start = anyhow::Error::from(DeployError::StartFailure {
            name: "tradebot".to_string(),
            status: 125,
            diagnostic: "Unable to find image 'tradebot:latest' locally".to_string(),
        });
        assert_eq!(exit_code_for(&start), 1);

        let remote = anyhow::Error::from(DeployError::RemoteExecutionFailure {
            status: 3,
            output: CommandOutput::new(3, "", "boom\n"),
        });
        assert_eq!(exit_code_for(&remote), 3);

        let config = anyhow::anyhow!("Failed to build configuration from 'deploy'");
        assert_eq!(exit_code_for(&config), 1);
    }

    #[test]
    fn test_exit_code_survives_context() {
        let result: Result<()> = Err(DeployError::RemoteExecutionFailure {
            status: 4,
            output: CommandOutput::new(4, "", ""),
        }
        .into());
        let err = result.context("deploy to bot.example.com").unwrap_err();
        assert_eq!(exit_code_for(&err), 4);
    }

    #[test]
    fn test_relay_writes_remote_output_verbatim() {
        let output = CommandOutput::new(1, "[1/3] Stopping container\n", "error: no such image\n");
        let (mut out, mut err) = (Vec::new(), Vec::new());

        relay(&output, &mut out, &mut err).unwrap();

        assert_eq!(out, b"[1/3] Stopping container\n");
        assert_eq!(err, b"error: no such image\n");
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["tradebot-deployer"]).is_err());
    }
}
