use clap::Subcommand;
use elt::error::EltResult;
use elt::pipeline::{Pipeline, run_stage};
use elt::stages::{CsvLoadStage, ReplicationStage};
use elt::store::postgres::PgStore;
use elt::transform::TransformTrigger;
use elt_config::shared::{CredentialsConfig, PipelineConfig, StoreRole};
use tracing::info;

/// Units of work the runner can execute. Each one is a task an external scheduler can retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Load the csv files into the source store.
    Load,
    /// Replicate the source tables into the warehouse staging schema.
    Replicate,
    /// Run the transformation over the staging tables.
    Transform,
    /// Load, replicate and transform, in that order.
    Run,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Load => "load",
            Command::Replicate => "replicate",
            Command::Transform => "transform",
            Command::Run => "run",
        }
    }
}

/// Executes `command`. Stores are created here and dropped on return, so nothing is shared
/// between invocations.
pub async fn run_command(
    command: Command,
    config: &PipelineConfig,
    credentials: &CredentialsConfig,
) -> EltResult<()> {
    info!(command = command.name(), "starting command");

    match command {
        Command::Load => {
            let source = PgStore::for_role(credentials, StoreRole::Source)?;
            run_stage(&CsvLoadStage::new(config, source)).await?;
        }
        Command::Replicate => {
            let source = PgStore::for_role(credentials, StoreRole::Source)?;
            let warehouse = PgStore::for_role(credentials, StoreRole::Warehouse)?;
            run_stage(&ReplicationStage::new(config, source, warehouse)).await?;
        }
        Command::Transform => {
            TransformTrigger::new(config).run().await?;
        }
        Command::Run => {
            // Each stage gets its own stores.
            let load_source = PgStore::for_role(credentials, StoreRole::Source)?;
            let replication_source = PgStore::for_role(credentials, StoreRole::Source)?;
            let warehouse = PgStore::for_role(credentials, StoreRole::Warehouse)?;

            let pipeline = Pipeline::new(
                CsvLoadStage::new(config, load_source),
                ReplicationStage::new(config, replication_source, warehouse),
                TransformTrigger::new(config),
            );
            pipeline.run().await?;
        }
    }

    info!(command = command.name(), "command completed");

    Ok(())
}

