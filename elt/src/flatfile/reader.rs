use std::collections::HashSet;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use elt_config::shared::CsvOptions;
use elt_postgres::schema::ColumnSchema;
use tracing::debug;

use crate::bail;
use crate::conversions::Cell;
use crate::conversions::table_row::TableRow;
use crate::error::{EltResult, ErrorKind};
use crate::flatfile::infer::infer_column_type;
use crate::types::Dataset;

/// How csv files are tokenized.
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    pub delimiter: u8,
    /// Field values read as `NULL`. Matched exactly, without trimming.
    pub null_values: HashSet<String>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self::from(&CsvOptions::default())
    }
}

impl From<&CsvOptions> for CsvReadOptions {
    fn from(options: &CsvOptions) -> Self {
        // Non-ASCII delimiters are rejected when the configuration is validated.
        let delimiter = u8::try_from(options.delimiter).unwrap_or(b',');

        Self {
            delimiter,
            null_values: options.null_values.iter().cloned().collect(),
        }
    }
}

/// Reads the csv file at `path` into a dataset.
///
/// A missing file is reported as [`ErrorKind::MissingInput`] with the path as detail.
pub async fn read_csv_file(path: &Path, options: &CsvReadOptions) -> EltResult<Dataset> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            bail!(
                ErrorKind::MissingInput,
                "CSV file not found",
                path.display()
            );
        }
        Err(err) => {
            bail!(
                ErrorKind::IoError,
                "CSV file could not be read",
                format!("{}: {err}", path.display())
            );
        }
    };

    let dataset = read_csv(content.as_slice(), options)?;
    debug!(
        path = %path.display(),
        columns = dataset.column_schemas.len(),
        rows = dataset.rows.len(),
        "read csv file"
    );

    Ok(dataset)
}

/// Reads csv data whose first record is the header.
///
/// Column names come from the header, column types are inferred from the values. Records shorter
/// than the header are padded with nulls, longer ones are rejected.
pub fn read_csv<R: io::Read>(reader: R, options: &CsvReadOptions) -> EltResult<Dataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(reader);

    let mut records = reader.records();
    let Some(header) = records.next() else {
        bail!(ErrorKind::ParseError, "No columns to parse from file");
    };
    let column_names = column_names(&header?);

    let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
    for record in records {
        let record: StringRecord = record?;
        if record.len() > column_names.len() {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            bail!(
                ErrorKind::ParseError,
                "CSV record has more fields than the header",
                format!(
                    "line {line}: expected {} fields, saw {}",
                    column_names.len(),
                    record.len()
                )
            );
        }

        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|value| {
                if options.null_values.contains(value) {
                    None
                } else {
                    Some(value.to_string())
                }
            })
            .collect();
        row.resize(column_names.len(), None);
        raw_rows.push(row);
    }

    let column_types: Vec<_> = (0..column_names.len())
        .map(|i| infer_column_type(raw_rows.iter().filter_map(|row| row[i].as_deref())))
        .collect();

    let column_schemas = column_names
        .into_iter()
        .zip(&column_types)
        .map(|(name, inferred)| ColumnSchema::new(name, inferred.typ(), inferred.type_name()))
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            let values = row
                .iter()
                .zip(&column_types)
                .map(|(value, inferred)| match value {
                    Some(value) => inferred.to_cell(value),
                    None => Cell::Null,
                })
                .collect();

            TableRow::new(values)
        })
        .collect();

    Ok(Dataset::new(column_schemas, rows))
}

/// Names the columns after the header, filling blanks and de-duplicating repeats.
fn column_names(header: &StringRecord) -> Vec<String> {
    let mut used = HashSet::with_capacity(header.len());
    let mut names = Vec::with_capacity(header.len());

    for (i, name) in header.iter().enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {i}")
        } else {
            name.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while used.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }

        used.insert(candidate.clone());
        names.push(candidate);
    }

    names
}
