//! Text formats of Postgres temporal values.
//!
//! Sessions opened by the pipeline pin `DateStyle` to `ISO, MDY` and `TimeZone` to `UTC`, so
//! these are the only shapes the decoder needs to accept.

/// Date format, `YYYY-MM-DD`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp format with optional fractional seconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Timestamptz format with the offset as `+HH`, `+HHMM` or `+HH:MM`.
pub const TIMESTAMPTZ_FORMAT_HHMM: &str = "%Y-%m-%d %H:%M:%S%.f%#z";

/// Timestamptz format used when writing values, offset as `+HH:MM`.
pub const TIMESTAMPTZ_FORMAT_HH_MM: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

/// Special temporal values that have no calendar representation.
pub const INFINITE_VALUES: &[&str] = &["infinity", "-infinity"];

/// Suffix Postgres appends to dates before the common era.
pub const BC_SUFFIX: &str = " BC";

/// Widest year the `%Y` formats read and write without a sign.
const MAX_YEAR_DIGITS: usize = 4;

/// Returns `true` if `value` is a temporal value that cannot be mapped to a calendar type and has
/// to be carried as text.
///
/// Besides the infinities and dates BC this covers years past 9999, which Postgres prints
/// unsigned and with more than four digits.
pub fn is_non_calendar_value(value: &str) -> bool {
    INFINITE_VALUES.contains(&value) || value.ends_with(BC_SUFFIX) || has_wide_year(value)
}

fn has_wide_year(value: &str) -> bool {
    value
        .split('-')
        .next()
        .is_some_and(|year| {
            year.len() > MAX_YEAR_DIGITS && year.bytes().all(|b| b.is_ascii_digit())
        })
}
