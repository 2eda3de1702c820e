use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, ParseBigDecimalError};

/// A Postgres `numeric` value, including the special values Postgres allows for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PgNumeric {
    NaN,
    PositiveInfinity,
    NegativeInfinity,
    Value(BigDecimal),
}

impl FromStr for PgNumeric {
    type Err = ParseBigDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NaN" => Ok(PgNumeric::NaN),
            "Infinity" => Ok(PgNumeric::PositiveInfinity),
            "-Infinity" => Ok(PgNumeric::NegativeInfinity),
            value => Ok(PgNumeric::Value(BigDecimal::from_str(value)?)),
        }
    }
}

impl fmt::Display for PgNumeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PgNumeric::NaN => f.write_str("NaN"),
            PgNumeric::PositiveInfinity => f.write_str("Infinity"),
            PgNumeric::NegativeInfinity => f.write_str("-Infinity"),
            // Plain notation keeps the scale of the source value.
            PgNumeric::Value(value) => f.write_str(&value.to_plain_string()),
        }
    }
}
