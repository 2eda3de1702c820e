use std::fmt;
use std::time::Duration;

use elt_postgres::schema::TableName;

/// The stages a pipeline run goes through, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Csv files into the source store.
    Load,
    /// Source store tables into the warehouse staging schema.
    Replication,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Load => f.write_str("load"),
            StageKind::Replication => f.write_str("replication"),
        }
    }
}

/// Outcome of writing one destination table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    /// Csv path or source table the rows came from.
    pub source: String,
    pub destination: TableName,
    pub rows: u64,
}

/// Outcome of a completed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: StageKind,
    /// One entry per inventory entry, in inventory order.
    pub tables: Vec<TableReport>,
    pub elapsed: Duration,
}

impl StageReport {
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|table| table.rows).sum()
    }
}

/// Notifications emitted while a pipeline run progresses.
///
/// Events are only emitted for stages that succeeded as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    LoadCompleted(StageReport),
    ReplicationCompleted(StageReport),
}
