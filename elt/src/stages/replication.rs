use std::time::Instant;

use elt_config::shared::{PipelineConfig, TableSpec};
use elt_postgres::schema::TableName;
use tracing::{Instrument, info};

use crate::error::EltResult;
use crate::stages::Stage;
use crate::store::{TableDestination, TableSource};
use crate::types::{StageKind, StageReport, TableReport};

/// Copies whole tables of the source store into the warehouse staging schema.
///
/// The source is only read. Each destination table is dropped and recreated, so running the
/// stage twice leaves the same contents behind.
#[derive(Debug)]
pub struct ReplicationStage<S, D> {
    source_schema: String,
    target_schema: String,
    tables: Vec<TableSpec>,
    source: S,
    destination: D,
}

impl<S, D> ReplicationStage<S, D>
where
    S: TableSource + Sync,
    D: TableDestination + Sync,
{
    pub fn new(config: &PipelineConfig, source: S, destination: D) -> Self {
        Self {
            source_schema: config.replication.source_schema.clone(),
            target_schema: config.replication.target_schema.clone(),
            tables: config.replication.tables.clone(),
            source,
            destination,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    async fn replicate_table(&self, table: &TableSpec) -> EltResult<TableReport> {
        let source = TableName::new(self.source_schema.clone(), table.source.clone());
        let destination = TableName::new(self.target_schema.clone(), table.destination.clone());

        let dataset = self.source.read_table(&source).await?;
        let rows = self
            .destination
            .replace_table(&destination, &dataset)
            .await?;

        info!(%source, %destination, rows, "replicated table");

        Ok(TableReport {
            source: source.to_string(),
            destination,
            rows,
        })
    }
}

impl<S, D> Stage for ReplicationStage<S, D>
where
    S: TableSource + Sync,
    D: TableDestination + Sync,
{
    fn kind(&self) -> StageKind {
        StageKind::Replication
    }

    async fn run(&self) -> EltResult<StageReport> {
        let started = Instant::now();
        let mut reports = Vec::with_capacity(self.tables.len());

        for table in &self.tables {
            let span = tracing::info_span!("replicate_table", source = %table.source);
            reports.push(self.replicate_table(table).instrument(span).await?);
        }

        Ok(StageReport {
            stage: StageKind::Replication,
            tables: reports,
            elapsed: started.elapsed(),
        })
    }
}
