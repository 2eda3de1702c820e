//! Sequencing of the pipeline stages.
//!
//! Contains the [`Pipeline`] that runs the csv load and the replication one after the other and
//! announces each completed stage to a [`PipelineEventListener`]. What happens after replication,
//! such as running the transformation, is entirely up to the listener.

use std::future::Future;

use tracing::{error, info};

use crate::error::EltResult;
use crate::stages::Stage;
use crate::types::{PipelineEvent, StageReport};

/// Receives the events of a pipeline run.
pub trait PipelineEventListener {
    /// Handles `event`. An error fails the pipeline run.
    fn on_event(&self, event: &PipelineEvent) -> impl Future<Output = EltResult<()>> + Send;
}

/// A listener ignoring every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl PipelineEventListener for NoopListener {
    async fn on_event(&self, _event: &PipelineEvent) -> EltResult<()> {
        Ok(())
    }
}

/// Outcome of a complete pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub load: StageReport,
    pub replication: StageReport,
}

/// Runs the load stage, then the replication stage.
///
/// Stages never overlap and the first failure ends the run: later stages do not run and no event
/// is emitted for the failed stage.
#[derive(Debug)]
pub struct Pipeline<L, R, E> {
    load: L,
    replication: R,
    listener: E,
}

impl<L, R, E> Pipeline<L, R, E>
where
    L: Stage + Sync,
    R: Stage + Sync,
    E: PipelineEventListener + Sync,
{
    pub fn new(load: L, replication: R, listener: E) -> Self {
        Self {
            load,
            replication,
            listener,
        }
    }

    pub async fn run(&self) -> EltResult<PipelineReport> {
        info!("starting pipeline run");

        let load = run_stage(&self.load).await?;
        self.listener
            .on_event(&PipelineEvent::LoadCompleted(load.clone()))
            .await?;

        let replication = run_stage(&self.replication).await?;
        self.listener
            .on_event(&PipelineEvent::ReplicationCompleted(replication.clone()))
            .await?;

        info!(
            loaded_rows = load.total_rows(),
            replicated_rows = replication.total_rows(),
            "pipeline run completed"
        );

        Ok(PipelineReport { load, replication })
    }
}

/// Runs `stage` and logs its report or its failure.
pub async fn run_stage<S: Stage + Sync>(stage: &S) -> EltResult<StageReport> {
    let kind = stage.kind();
    info!(stage = %kind, "starting stage");

    match stage.run().await {
        Ok(report) => {
            for table in &report.tables {
                info!(
                    stage = %kind,
                    source = %table.source,
                    destination = %table.destination,
                    rows = table.rows,
                    "table written"
                );
            }
            info!(
                stage = %kind,
                tables = report.tables.len(),
                rows = report.total_rows(),
                elapsed_ms = report.elapsed.as_millis() as u64,
                "stage completed"
            );

            Ok(report)
        }
        Err(err) => {
            error!(stage = %kind, error = %err, "stage failed");

            Err(err)
        }
    }
}
