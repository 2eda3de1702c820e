use elt_postgres::schema::ColumnSchema;

use crate::conversions::table_row::TableRow;

/// An in-memory table: ordered columns and the rows conforming to them.
///
/// Every row holds exactly one value per column, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub column_schemas: Vec<ColumnSchema>,
    pub rows: Vec<TableRow>,
}

impl Dataset {
    pub fn new(column_schemas: Vec<ColumnSchema>, rows: Vec<TableRow>) -> Self {
        Self {
            column_schemas,
            rows,
        }
    }

    pub fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.column_schemas.iter().map(|column| column.name.as_str())
    }
}
