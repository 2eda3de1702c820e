use std::fmt;

use pg_escape::quote_identifier;
use tokio_postgres::types::Type;

/// An object identifier in Postgres.
pub type Oid = u32;

/// A schema-qualified Postgres table name.
#[derive(Debug, Clone, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct TableName {
    pub schema: String,
    pub name: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> TableName {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Returns the name quoted according to Postgres identifier rules, ready to be spliced into
    /// a statement.
    pub fn as_quoted_identifier(&self) -> String {
        let quoted_schema = quote_identifier(&self.schema);
        let quoted_name = quote_identifier(&self.name);

        format!("{quoted_schema}.{quoted_name}")
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A column of a table being moved through the pipeline.
///
/// `typ` drives how values are decoded and encoded, `type_name` is the SQL type used when the
/// destination table is created (for example `character varying(50)` or `numeric(10,2)`).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub typ: Type,
    pub type_name: String,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, typ: Type, type_name: impl Into<String>) -> ColumnSchema {
        Self {
            name: name.into(),
            typ,
            type_name: type_name.into(),
        }
    }

    /// Returns the column definition used in `create table` statements.
    ///
    /// Constraints are not carried over, destination columns are always nullable.
    pub fn column_definition(&self) -> String {
        format!("{} {}", quote_identifier(&self.name), self.type_name)
    }
}

/// Returns the comma separated, quoted column names of `columns`.
pub fn quoted_column_list(columns: &[ColumnSchema]) -> String {
    columns
        .iter()
        .map(|column| quote_identifier(&column.name))
        .collect::<Vec<_>>()
        .join(", ")
}
