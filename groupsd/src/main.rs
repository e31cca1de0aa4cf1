use clap::{Parser, Subcommand};
use groups::config::ENABLE_ENV_VAR;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod observability;

#[derive(Parser)]
#[command(version, about = "Serves group membership for the chat host")]
struct Cli {
    #[arg(long, default_value = "config.yaml")]
    config_file_path: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run the HTTP service.
    GroupsApi,
    /// Snapshot the store into a fallback document.
    ExportFallback {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Metrics(#[from] observability::MetricsInitError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Serve(#[from] groups::api::ServeError),
    #[error(transparent)]
    Export(#[from] groups::ExportError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "groupsd exited with an error");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = config::Config::from_file(&cli.config_file_path)?;
    let _sentry = observability::init_logging(config.common.logging.as_ref());

    if let Some(metrics) = &config.common.metrics {
        observability::init_metrics(metrics)?;
    }

    // The only place the environment is consulted.
    let env_flag = std::env::var(ENABLE_ENV_VAR).ok();
    let groups_config = config.groups.with_enabled_override(env_flag.as_deref());

    match cli.command {
        CliCommand::GroupsApi => {
            tracing::info!(enabled = groups_config.enabled, "starting groups API");
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            rt.block_on(groups::run(groups_config))?;
        }
        CliCommand::ExportFallback { output } => {
            let count = groups::export_fallback(&groups_config, output.as_deref())?;
            tracing::info!(count, "exported groups to fallback document");
        }
    }

    Ok(())
}
