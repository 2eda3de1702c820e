//! Reading of flat files into [`crate::types::Dataset`]s.

mod infer;
mod reader;

pub use infer::{InferredType, infer_column_type};
pub use reader::{CsvReadOptions, read_csv, read_csv_file};
