use bytes::{BufMut, BytesMut};
use elt_postgres::schema::ColumnSchema;

use crate::bail;
use crate::conversions::Cell;
use crate::conversions::text::TextFormatConverter;
use crate::error::{EltResult, ErrorKind};

/// Marker of a `NULL` field in COPY text format.
const NULL_MARKER: &str = "\\N";

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub values: Vec<Cell>,
}

impl TableRow {
    pub fn new(values: Vec<Cell>) -> Self {
        Self { values }
    }
}

/// Conversions between [`TableRow`]s and lines of `COPY ... (format text)`.
pub struct TableRowConverter;

impl TableRowConverter {
    /// Parses one COPY text line, without its terminating newline, into a row typed by
    /// `column_schemas`.
    ///
    /// Fields are tab separated and backslash escaped; a field consisting of `\N` only is null,
    /// while an escaped backslash followed by `N` is the literal text `\N`.
    pub fn try_from(line: &str, column_schemas: &[ColumnSchema]) -> EltResult<TableRow> {
        // Rows of tables without columns are empty lines.
        if column_schemas.is_empty() && line.is_empty() {
            return Ok(TableRow::new(vec![]));
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != column_schemas.len() {
            bail!(
                ErrorKind::ParseError,
                "The number of columns in the schema and row is mismatched",
                format!(
                    "expected {} fields, found {}",
                    column_schemas.len(),
                    fields.len()
                )
            );
        }

        let mut values = Vec::with_capacity(column_schemas.len());
        for (field, column_schema) in fields.into_iter().zip(column_schemas) {
            let value = if field == NULL_MARKER {
                Cell::Null
            } else {
                TextFormatConverter::try_from_str_for_column(
                    &column_schema.typ,
                    &unescape(field),
                    &column_schema.name,
                )?
            };

            values.push(value);
        }

        Ok(TableRow { values })
    }

    /// Appends `row` to `buf` as one COPY text line, newline included.
    pub fn encode(row: &TableRow, buf: &mut BytesMut) {
        for (i, cell) in row.values.iter().enumerate() {
            if i > 0 {
                buf.put_u8(b'\t');
            }

            match TextFormatConverter::to_text(cell) {
                Some(text) => escape_into(&text, buf),
                None => buf.put_slice(NULL_MARKER.as_bytes()),
            }
        }

        buf.put_u8(b'\n');
    }
}

fn unescape(field: &str) -> String {
    let mut value = String::with_capacity(field.len());
    let mut chars = field.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }

        match chars.next() {
            Some('b') => value.push('\u{8}'),
            Some('f') => value.push('\u{c}'),
            Some('n') => value.push('\n'),
            Some('r') => value.push('\r'),
            Some('t') => value.push('\t'),
            Some('v') => value.push('\u{b}'),
            Some(other) => value.push(other),
            None => value.push('\\'),
        }
    }

    value
}

fn escape_into(text: &str, buf: &mut BytesMut) {
    let mut start = 0;

    for (i, byte) in text.bytes().enumerate() {
        let escaped: &[u8] = match byte {
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            _ => continue,
        };

        buf.put_slice(&text.as_bytes()[start..i]);
        buf.put_slice(escaped);
        start = i + 1;
    }

    buf.put_slice(&text.as_bytes()[start..]);
}
