use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use elt_postgres::time::{
    DATE_FORMAT, TIMESTAMP_FORMAT, TIMESTAMPTZ_FORMAT_HH_MM, TIMESTAMPTZ_FORMAT_HHMM,
    is_non_calendar_value,
};
use tokio_postgres::types::Type;
use uuid::Uuid;

use crate::conversions::bool::parse_bool;
use crate::conversions::{Cell, numeric::PgNumeric};
use crate::error::{EltResult, ErrorKind};
use crate::elt_error;

/// Conversions between Postgres text format values and [`Cell`]s.
pub struct TextFormatConverter;

impl TextFormatConverter {
    /// Decodes the text representation `str` of a value of type `typ`.
    ///
    /// Types without a dedicated [`Cell`] variant are kept verbatim as [`Cell::String`]. The same
    /// applies to temporal values outside the calendar (`infinity`, dates BC).
    pub fn try_from_str(typ: &Type, str: &str) -> EltResult<Cell> {
        let cell = match *typ {
            Type::BOOL => Cell::Bool(parse_bool(str)?),
            Type::CHAR | Type::BPCHAR | Type::VARCHAR | Type::NAME | Type::TEXT => {
                Cell::String(str.to_string())
            }
            Type::INT2 => Cell::I16(str.parse()?),
            Type::INT4 => Cell::I32(str.parse()?),
            Type::INT8 => Cell::I64(str.parse()?),
            Type::FLOAT4 => Cell::F32(str.parse()?),
            Type::FLOAT8 => Cell::F64(str.parse()?),
            Type::NUMERIC => Cell::Numeric(str.parse::<PgNumeric>()?),
            Type::DATE | Type::TIMESTAMP | Type::TIMESTAMPTZ if is_non_calendar_value(str) => {
                Cell::String(str.to_string())
            }
            Type::DATE => Cell::Date(NaiveDate::parse_from_str(str, DATE_FORMAT)?),
            Type::TIMESTAMP => {
                Cell::TimeStamp(NaiveDateTime::parse_from_str(str, TIMESTAMP_FORMAT)?)
            }
            Type::TIMESTAMPTZ => {
                let val = match DateTime::<FixedOffset>::parse_from_str(str, TIMESTAMPTZ_FORMAT_HHMM)
                {
                    Ok(val) => val,
                    Err(_) => DateTime::<FixedOffset>::parse_from_str(str, TIMESTAMPTZ_FORMAT_HH_MM)?,
                };
                Cell::TimeStampTz(val.into())
            }
            Type::UUID => Cell::Uuid(Uuid::parse_str(str)?),
            _ => Cell::String(str.to_string()),
        };

        Ok(cell)
    }

    /// Decodes `str` and wraps failures with the column they happened in.
    pub fn try_from_str_for_column(typ: &Type, str: &str, column: &str) -> EltResult<Cell> {
        Self::try_from_str(typ, str).map_err(|err| {
            elt_error!(
                ErrorKind::ParseError,
                "Value could not be decoded",
                format!(
                    "column `{column}` of type {}: {}",
                    typ.name(),
                    err.detail().unwrap_or(err.description())
                )
            )
        })
    }

    /// Renders a non-null `cell` in Postgres text input format, without any COPY escaping.
    ///
    /// Returns `None` for [`Cell::Null`].
    pub fn to_text(cell: &Cell) -> Option<Cow<'_, str>> {
        let text = match cell {
            Cell::Null => return None,
            Cell::Bool(true) => Cow::Borrowed("t"),
            Cell::Bool(false) => Cow::Borrowed("f"),
            Cell::String(value) => Cow::Borrowed(value.as_str()),
            Cell::I16(value) => Cow::Owned(value.to_string()),
            Cell::I32(value) => Cow::Owned(value.to_string()),
            Cell::I64(value) => Cow::Owned(value.to_string()),
            Cell::F32(value) => Cow::Owned(format_float(*value as f64, value.to_string())),
            Cell::F64(value) => Cow::Owned(format_float(*value, value.to_string())),
            Cell::Numeric(value) => Cow::Owned(value.to_string()),
            Cell::Date(value) => Cow::Owned(value.format(DATE_FORMAT).to_string()),
            Cell::TimeStamp(value) => Cow::Owned(value.format(TIMESTAMP_FORMAT).to_string()),
            Cell::TimeStampTz(value) => {
                Cow::Owned(value.format(TIMESTAMPTZ_FORMAT_HH_MM).to_string())
            }
            Cell::Uuid(value) => Cow::Owned(value.hyphenated().to_string()),
        };

        Some(text)
    }
}

/// Spells non-finite floats the way Postgres expects them.
fn format_float(value: f64, rendered: String) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, TimeZone, Utc};

    use super::*;

    #[test]
    fn decodes_scalar_types() {
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::BOOL, "t").unwrap(),
            Cell::Bool(true)
        );
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::INT2, "-7").unwrap(),
            Cell::I16(-7)
        );
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::INT4, "42").unwrap(),
            Cell::I32(42)
        );
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::INT8, "9000000000").unwrap(),
            Cell::I64(9_000_000_000)
        );
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::FLOAT8, "3.25").unwrap(),
            Cell::F64(3.25)
        );
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::VARCHAR, "Jane Doe").unwrap(),
            Cell::String("Jane Doe".to_string())
        );
    }

    #[test]
    fn decodes_non_finite_floats() {
        let Cell::F64(value) = TextFormatConverter::try_from_str(&Type::FLOAT8, "NaN").unwrap()
        else {
            panic!("expected a float cell");
        };
        assert!(value.is_nan());

        assert_eq!(
            TextFormatConverter::try_from_str(&Type::FLOAT4, "-Infinity").unwrap(),
            Cell::F32(f32::NEG_INFINITY)
        );
    }

    #[test]
    fn decodes_temporal_types() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::DATE, "2024-02-29").unwrap(),
            Cell::Date(date)
        );

        let timestamp = date.and_time(NaiveTime::from_hms_micro_opt(13, 45, 1, 250_000).unwrap());
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::TIMESTAMP, "2024-02-29 13:45:01.25").unwrap(),
            Cell::TimeStamp(timestamp)
        );

        let timestamptz = Utc.with_ymd_and_hms(2024, 2, 29, 11, 45, 1).unwrap();
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::TIMESTAMPTZ, "2024-02-29 13:45:01+02")
                .unwrap(),
            Cell::TimeStampTz(timestamptz)
        );
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::TIMESTAMPTZ, "2024-02-29 13:45:01+02:00")
                .unwrap(),
            Cell::TimeStampTz(timestamptz)
        );
    }

    #[test]
    fn keeps_non_calendar_values_as_text() {
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::DATE, "infinity").unwrap(),
            Cell::String("infinity".to_string())
        );
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::TIMESTAMP, "0044-03-15 12:00:00 BC")
                .unwrap(),
            Cell::String("0044-03-15 12:00:00 BC".to_string())
        );
    }

    #[test]
    fn keeps_years_past_9999_as_text() {
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::DATE, "10000-01-01").unwrap(),
            Cell::String("10000-01-01".to_string())
        );
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::TIMESTAMPTZ, "10000-01-01 00:00:00+00")
                .unwrap(),
            Cell::String("10000-01-01 00:00:00+00".to_string())
        );
    }

    #[test]
    fn keeps_unsupported_types_verbatim() {
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::INT4_ARRAY, "{1,2,NULL}").unwrap(),
            Cell::String("{1,2,NULL}".to_string())
        );
        assert_eq!(
            TextFormatConverter::try_from_str(&Type::JSONB, r#"{"a": 1}"#).unwrap(),
            Cell::String(r#"{"a": 1}"#.to_string())
        );
    }

    #[test]
    fn reports_column_of_invalid_values() {
        let err =
            TextFormatConverter::try_from_str_for_column(&Type::INT4, "forty", "age").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert!(err.detail().unwrap().contains("column `age` of type int4"));
    }

    #[test]
    fn renders_text_values() {
        assert_eq!(TextFormatConverter::to_text(&Cell::Null), None);
        assert_eq!(
            TextFormatConverter::to_text(&Cell::Bool(false)).unwrap(),
            "f"
        );
        assert_eq!(
            TextFormatConverter::to_text(&Cell::F64(f64::INFINITY)).unwrap(),
            "Infinity"
        );
        assert_eq!(
            TextFormatConverter::to_text(&Cell::F64(f64::NAN)).unwrap(),
            "NaN"
        );
        assert_eq!(TextFormatConverter::to_text(&Cell::F64(0.1)).unwrap(), "0.1");
        assert_eq!(
            TextFormatConverter::to_text(&Cell::TimeStampTz(
                Utc.with_ymd_and_hms(2024, 2, 29, 11, 45, 1).unwrap()
            ))
            .unwrap(),
            "2024-02-29 11:45:01+00:00"
        );
    }

    #[test]
    fn text_round_trips_through_decoder() {
        let cases = [
            (Type::NUMERIC, "1234.50"),
            (Type::TIMESTAMP, "2024-02-29 13:45:01.123456"),
            (Type::DATE, "1999-12-31"),
            (Type::UUID, "67e55044-10b1-426f-9247-bb680e5fe0c8"),
            (Type::FLOAT4, "1.5"),
        ];

        for (typ, text) in cases {
            let cell = TextFormatConverter::try_from_str(&typ, text).unwrap();
            assert_eq!(TextFormatConverter::to_text(&cell).unwrap(), text);
        }
    }
}
