use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// How a destination table is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Drop and recreate the destination, then copy every source row.
    #[default]
    Replace,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadMode::Replace => f.write_str("replace"),
        }
    }
}

/// One entry of a stage's table inventory.
///
/// For the load stage `source` is a csv path relative to the project root, for the replication
/// stage it is a table name in the source schema. `destination` is always a bare table name;
/// the schema comes from the stage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub mode: LoadMode,
}

impl TableSpec {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            mode: LoadMode::Replace,
        }
    }
}

/// Validates an ordered inventory for `stage`.
///
/// The inventory must be non-empty, have no blank names and write each destination once.
pub fn validate_table_inventory(
    stage: &'static str,
    tables: &[TableSpec],
) -> Result<(), ValidationError> {
    if tables.is_empty() {
        return Err(ValidationError::EmptyTableInventory(stage));
    }

    let mut destinations = HashSet::with_capacity(tables.len());
    for table in tables {
        if table.source.trim().is_empty() || table.destination.trim().is_empty() {
            return Err(ValidationError::EmptyTableName(stage));
        }

        if !destinations.insert(table.destination.as_str()) {
            return Err(ValidationError::DuplicateDestination {
                stage,
                destination: table.destination.clone(),
            });
        }
    }

    Ok(())
}
