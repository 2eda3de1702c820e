use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use numeric::PgNumeric;
use std::fmt::Debug;
use uuid::Uuid;

pub mod bool;
pub mod numeric;
pub mod table_row;
pub mod text;

/// A single typed value of a row.
///
/// Types without a dedicated variant travel as [`Cell::String`] holding their exact Postgres text
/// representation, which the destination parses back into the column type.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    String(String),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Numeric(PgNumeric),
    Date(NaiveDate),
    TimeStamp(NaiveDateTime),
    TimeStampTz(DateTime<Utc>),
    Uuid(Uuid),
}
