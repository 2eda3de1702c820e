use elt_postgres::types::{BOOL_TYPE_NAME, FLOAT8_TYPE_NAME, INT8_TYPE_NAME, TEXT_TYPE_NAME};
use tokio_postgres::types::Type;

use crate::conversions::Cell;
use crate::conversions::bool::parse_csv_bool;

/// Column types a csv column can be inferred as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredType {
    Bool,
    Int,
    Float,
    Text,
}

impl InferredType {
    pub fn typ(&self) -> Type {
        match self {
            InferredType::Bool => Type::BOOL,
            InferredType::Int => Type::INT8,
            InferredType::Float => Type::FLOAT8,
            InferredType::Text => Type::TEXT,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            InferredType::Bool => BOOL_TYPE_NAME,
            InferredType::Int => INT8_TYPE_NAME,
            InferredType::Float => FLOAT8_TYPE_NAME,
            InferredType::Text => TEXT_TYPE_NAME,
        }
    }

    /// Converts a non-null `value` of a column inferred as `self`.
    ///
    /// Must only be called with values that took part in inferring `self`, which is why parse
    /// failures fall back to text instead of erroring.
    pub fn to_cell(&self, value: &str) -> Cell {
        match self {
            InferredType::Bool => parse_csv_bool(value)
                .map(Cell::Bool)
                .unwrap_or_else(|| Cell::String(value.to_string())),
            InferredType::Int => value
                .trim()
                .parse()
                .map(Cell::I64)
                .unwrap_or_else(|_| Cell::String(value.to_string())),
            InferredType::Float => value
                .trim()
                .parse()
                .map(Cell::F64)
                .unwrap_or_else(|_| Cell::String(value.to_string())),
            InferredType::Text => Cell::String(value.to_string()),
        }
    }
}

/// Infers the type of a column from its non-null values.
///
/// The first type every value parses as wins, in the order boolean, integer, float. Columns
/// without any value are text.
pub fn infer_column_type<'a>(values: impl IntoIterator<Item = &'a str>) -> InferredType {
    let mut seen_value = false;
    let mut is_bool = true;
    let mut is_int = true;
    let mut is_float = true;

    for value in values {
        seen_value = true;

        is_bool = is_bool && parse_csv_bool(value).is_some();
        is_int = is_int && value.trim().parse::<i64>().is_ok();
        is_float = is_float && value.trim().parse::<f64>().is_ok();

        if !is_bool && !is_float {
            return InferredType::Text;
        }
    }

    if !seen_value {
        InferredType::Text
    } else if is_bool {
        InferredType::Bool
    } else if is_int {
        InferredType::Int
    } else {
        InferredType::Float
    }
}
