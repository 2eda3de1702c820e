use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use elt_postgres::schema::TableName;
use tokio::sync::Mutex;
use tracing::info;

use crate::bail;
use crate::error::{EltResult, ErrorKind};
use crate::store::{TableDestination, TableSource};
use crate::types::Dataset;

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<TableName, Dataset>,
    writes: Vec<TableName>,
    rejected: HashSet<TableName>,
}

/// A store keeping tables in memory, for tests.
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `dataset` as `table_name` without recording a write.
    pub async fn insert_table(&self, table_name: TableName, dataset: Dataset) {
        let mut inner = self.inner.lock().await;
        inner.tables.insert(table_name, dataset);
    }

    pub async fn table(&self, table_name: &TableName) -> Option<Dataset> {
        let inner = self.inner.lock().await;
        inner.tables.get(table_name).cloned()
    }

    /// Returns the tables replaced so far, in write order.
    pub async fn writes(&self) -> Vec<TableName> {
        let inner = self.inner.lock().await;
        inner.writes.clone()
    }

    /// Makes every later replace of `table_name` fail.
    pub async fn reject_writes_to(&self, table_name: TableName) {
        let mut inner = self.inner.lock().await;
        inner.rejected.insert(table_name);
    }
}

impl TableSource for MemoryStore {
    async fn read_table(&self, table_name: &TableName) -> EltResult<Dataset> {
        let inner = self.inner.lock().await;
        let Some(dataset) = inner.tables.get(table_name) else {
            bail!(
                ErrorKind::ReadFailed,
                "Source table not found",
                format!("table {table_name} does not exist")
            );
        };

        info!(table = %table_name, rows = dataset.rows.len(), "read table from memory");

        Ok(dataset.clone())
    }
}

impl TableDestination for MemoryStore {
    async fn replace_table(&self, table_name: &TableName, dataset: &Dataset) -> EltResult<u64> {
        let mut inner = self.inner.lock().await;
        if inner.rejected.contains(table_name) {
            bail!(
                ErrorKind::WriteFailed,
                "Destination rejected the write",
                format!("table {table_name}")
            );
        }

        info!(table = %table_name, rows = dataset.rows.len(), "writing table to memory");

        inner.tables.insert(table_name.clone(), dataset.clone());
        inner.writes.push(table_name.clone());

        Ok(dataset.row_count())
    }
}
