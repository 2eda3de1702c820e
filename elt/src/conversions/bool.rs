use crate::bail;
use crate::error::{ErrorKind, EltResult};

/// Parses a boolean in Postgres text output format, where `t` is true and `f` is false.
pub fn parse_bool(s: &str) -> EltResult<bool> {
    if s == "t" {
        Ok(true)
    } else if s == "f" {
        Ok(false)
    } else {
        bail!(
            ErrorKind::ConversionError,
            "Invalid boolean value",
            format!("Boolean value must be 't' or 'f' (received: {s})")
        );
    }
}

/// Parses a boolean as spelled in csv files.
///
/// Only the `true`/`false` spellings in lower, title or upper case are recognised, anything else
/// (including `1`, `yes` or `t`) is not a boolean.
pub fn parse_csv_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}
