//! Data types shared by the stages of the pipeline.
//!
//! Re-exports the row and schema types so that stage and store code only depends on this module.

mod dataset;
mod pipeline;

pub use crate::conversions::{Cell, numeric::PgNumeric, table_row::TableRow};
pub use dataset::*;
pub use pipeline::*;

// Re-exports.
pub use elt_postgres::schema::{ColumnSchema, TableName};
pub use tokio_postgres::types::Type;
