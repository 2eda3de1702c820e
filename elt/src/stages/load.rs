use std::path::PathBuf;
use std::time::Instant;

use elt_config::shared::{PipelineConfig, TableSpec};
use elt_postgres::schema::TableName;
use tracing::{Instrument, info};

use crate::bail;
use crate::error::{EltResult, ErrorKind};
use crate::flatfile::{CsvReadOptions, read_csv_file};
use crate::stages::Stage;
use crate::store::TableDestination;
use crate::types::{StageKind, StageReport, TableReport};

/// Loads csv files into tables of the source store, replacing them.
#[derive(Debug)]
pub struct CsvLoadStage<D> {
    project_root: PathBuf,
    schema: String,
    csv_options: CsvReadOptions,
    tables: Vec<TableSpec>,
    destination: D,
}

impl<D> CsvLoadStage<D>
where
    D: TableDestination + Sync,
{
    pub fn new(config: &PipelineConfig, destination: D) -> Self {
        Self {
            project_root: config.project_root.clone(),
            schema: config.load.schema.clone(),
            csv_options: CsvReadOptions::from(&config.load.csv),
            tables: config.load.tables.clone(),
            destination,
        }
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    async fn load_table(&self, table: &TableSpec) -> EltResult<TableReport> {
        let path = self.project_root.join(&table.source);

        // Checked before anything else so that a missing file never opens a connection.
        match tokio::fs::try_exists(&path).await {
            Ok(true) => {}
            Ok(false) => {
                bail!(
                    ErrorKind::MissingInput,
                    "CSV file not found",
                    path.display()
                );
            }
            Err(err) => {
                bail!(
                    ErrorKind::IoError,
                    "CSV file could not be checked",
                    format!("{}: {err}", path.display())
                );
            }
        }

        let dataset = read_csv_file(&path, &self.csv_options).await?;
        let destination = TableName::new(self.schema.clone(), table.destination.clone());
        let rows = self
            .destination
            .replace_table(&destination, &dataset)
            .await?;

        info!(
            source = %path.display(),
            destination = %destination,
            rows,
            "loaded csv file"
        );

        Ok(TableReport {
            source: table.source.clone(),
            destination,
            rows,
        })
    }
}

impl<D> Stage for CsvLoadStage<D>
where
    D: TableDestination + Sync,
{
    fn kind(&self) -> StageKind {
        StageKind::Load
    }

    async fn run(&self) -> EltResult<StageReport> {
        let started = Instant::now();
        let mut reports = Vec::with_capacity(self.tables.len());

        for table in &self.tables {
            let span = tracing::info_span!("load_table", source = %table.source);
            reports.push(self.load_table(table).instrument(span).await?);
        }

        Ok(StageReport {
            stage: StageKind::Load,
            tables: reports,
            elapsed: started.elapsed(),
        })
    }
}
