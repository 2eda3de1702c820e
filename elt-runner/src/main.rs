use std::sync::Arc;

use clap::Parser;
use elt_config::Environment;
use elt_config::shared::PipelineConfig;
use elt_telemetry::init_tracing_with_pipeline;
use tracing::{error, info};

use crate::config::{load_pipeline_config, load_pipeline_credentials};
use crate::core::{Command, run_command};

mod config;
mod core;

/// Runs the ELT pipeline or one of its stages.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Defaults to `run`.
    #[command(subcommand)]
    command: Option<Command>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run);

    let config = load_pipeline_config()?;

    // Log entries are tagged with the unit of work being run.
    let _log_flusher =
        init_tracing_with_pipeline(env!("CARGO_BIN_NAME"), Some(command.name().to_owned()))?;

    // Initialize Sentry before the async runtime starts
    let _sentry_guard = init_sentry(&config)?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main(command, config))?;

    Ok(())
}

async fn async_main(command: Command, config: PipelineConfig) -> anyhow::Result<()> {
    if let Err(err) = execute(command, &config).await {
        report_failure(command, &err);

        return Err(err);
    }

    Ok(())
}

/// Reads the credentials and runs `command` with them.
async fn execute(command: Command, config: &PipelineConfig) -> anyhow::Result<()> {
    let credentials = load_pipeline_credentials(config)?;
    run_command(command, config, &credentials).await?;

    Ok(())
}

/// Sends `err` to Sentry, when configured, and logs it.
fn report_failure(command: Command, err: &anyhow::Error) {
    let source: &(dyn std::error::Error + Send + Sync + 'static) = err.as_ref();
    sentry::capture_error(source);
    error!("an error occurred while running `{}`: {err:#}", command.name());
}

/// Initializes Sentry if a DSN is configured.
///
/// Tags every event with the `elt` service and captures panics.
fn init_sentry(config: &PipelineConfig) -> anyhow::Result<Option<sentry::ClientInitGuard>> {
    if let Some(sentry_config) = &config.sentry {
        info!("initializing sentry with supplied dsn");

        let environment = Environment::load()?;
        let guard = sentry::init(sentry::ClientOptions {
            dsn: Some(sentry_config.dsn.parse()?),
            environment: Some(environment.to_string().into()),
            integrations: vec![Arc::new(
                sentry::integrations::panic::PanicIntegration::new(),
            )],
            ..Default::default()
        });

        sentry::configure_scope(|scope| {
            scope.set_tag("service", "elt");
        });

        return Ok(Some(guard));
    }

    info!("sentry not configured, skipping initialization");

    Ok(None)
}

#[cfg(test)]
mod tests {
    use elt::test_utils::pipeline::pipeline_config;

    use super::*;

    #[test]
    fn defaults_to_run() {
        let cli = Cli::parse_from(["elt"]);

        assert_eq!(cli.command.unwrap_or(Command::Run), Command::Run);
    }

    #[test]
    fn parses_subcommands() {
        for (arg, command) in [
            ("load", Command::Load),
            ("replicate", Command::Replicate),
            ("transform", Command::Transform),
            ("run", Command::Run),
        ] {
            let cli = Cli::parse_from(["elt", arg]);
            assert_eq!(cli.command, Some(command));
        }
    }

    #[test]
    fn rejects_unknown_subcommands() {
        assert!(Cli::try_parse_from(["elt", "schedule"]).is_err());
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_the_command_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = pipeline_config(dir.path());
        config.transform.program = "touch".to_owned();
        config.transform.args = vec!["ran".to_owned()];

        let err = execute(Command::Transform, &config).await.unwrap_err();
        report_failure(Command::Transform, &err);

        assert!(err.to_string().contains("credentials.json"));
        assert!(!dir.path().join("ran").exists());
    }
}
