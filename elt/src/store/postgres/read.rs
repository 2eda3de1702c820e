use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BytesMut};
use elt_postgres::schema::{ColumnSchema, Oid, TableName, quoted_column_list};
use elt_postgres::types::{TEXT_TYPE_NAME, convert_type_oid_to_type, is_builtin_type};
use futures::StreamExt;
use pg_escape::quote_literal;
use tokio_postgres::{Client, SimpleQueryMessage, SimpleQueryRow};
use tracing::{debug, info, warn};

use crate::conversions::table_row::{TableRow, TableRowConverter};
use crate::error::{EltError, EltResult, ErrorKind};
use crate::store::TableSource;
use crate::store::postgres::PgStore;
use crate::types::Dataset;
use crate::{bail, elt_error};

impl TableSource for PgStore {
    async fn read_table(&self, table_name: &TableName) -> EltResult<Dataset> {
        let client = self.client().await?;

        // Catalog lookups and the copy see the same snapshot.
        client
            .simple_query("begin read only isolation level repeatable read;")
            .await
            .map_err(|err| read_failed(err, "Read transaction could not be started"))?;

        match read_table_in_transaction(client, table_name).await {
            Ok(dataset) => {
                client
                    .simple_query("commit;")
                    .await
                    .map_err(|err| read_failed(err, "Read transaction could not be committed"))?;

                info!(
                    table = %table_name,
                    rows = dataset.rows.len(),
                    "read source table"
                );

                Ok(dataset)
            }
            Err(err) => {
                if let Err(rollback_err) = client.simple_query("rollback;").await {
                    warn!(error = %rollback_err, "failed to roll back read transaction");
                }

                Err(err)
            }
        }
    }
}

async fn read_table_in_transaction(client: &Client, table_name: &TableName) -> EltResult<Dataset> {
    let table_oid = get_table_oid(client, table_name).await?;
    let column_schemas = get_column_schemas(client, table_oid, table_name).await?;
    let rows = copy_table_rows(client, table_name, &column_schemas).await?;

    Ok(Dataset::new(column_schemas, rows))
}

/// Returns the oid of `table_name`, failing if no such relation can be read from.
async fn get_table_oid(client: &Client, table_name: &TableName) -> EltResult<Oid> {
    let query = format!(
        "select c.oid
        from pg_class c
        join pg_namespace n on c.relnamespace = n.oid
        where n.nspname = {}
        and c.relname = {}
        and c.relkind in ('r', 'p', 'v', 'm', 'f')",
        quote_literal(&table_name.schema),
        quote_literal(&table_name.name),
    );

    let messages = client
        .simple_query(&query)
        .await
        .map_err(|err| read_failed(err, "Source table lookup failed"))?;
    for message in messages {
        if let SimpleQueryMessage::Row(row) = message {
            return get_row_value::<Oid>(&row, "oid", "pg_class");
        }
    }

    bail!(
        ErrorKind::ReadFailed,
        "Source table not found",
        format!("table {table_name} does not exist")
    );
}

/// Returns the readable columns of the table in ordinal order.
///
/// Types that only exist in the source database are staged as text.
async fn get_column_schemas(
    client: &Client,
    table_oid: Oid,
    table_name: &TableName,
) -> EltResult<Vec<ColumnSchema>> {
    let query = format!(
        "select a.attname,
            a.atttypid,
            format_type(a.atttypid, a.atttypmod) as type_name
        from pg_attribute a
        where a.attrelid = {table_oid}
        and a.attnum > 0::int2
        and not a.attisdropped
        and a.attgenerated = ''
        order by a.attnum"
    );

    let messages = client
        .simple_query(&query)
        .await
        .map_err(|err| read_failed(err, "Source columns lookup failed"))?;

    let mut column_schemas = vec![];
    for message in messages {
        if let SimpleQueryMessage::Row(row) = message {
            let name = get_row_value::<String>(&row, "attname", "pg_attribute")?;
            let type_oid = get_row_value::<u32>(&row, "atttypid", "pg_attribute")?;
            let type_name = get_row_value::<String>(&row, "type_name", "pg_attribute")?;

            let typ = convert_type_oid_to_type(type_oid);
            let type_name = if is_builtin_type(&typ) {
                type_name
            } else {
                debug!(
                    table = %table_name,
                    column = %name,
                    %type_name,
                    "staging non builtin type as text"
                );
                TEXT_TYPE_NAME.to_string()
            };

            column_schemas.push(ColumnSchema::new(name, typ, type_name));
        }
    }

    Ok(column_schemas)
}

/// Copies every row of the table out in text format.
async fn copy_table_rows(
    client: &Client,
    table_name: &TableName,
    column_schemas: &[ColumnSchema],
) -> EltResult<Vec<TableRow>> {
    let copy_query = format!(
        "copy (select {} from {}) to stdout with (format text);",
        quoted_column_list(column_schemas),
        table_name.as_quoted_identifier()
    );

    let stream = client
        .copy_out(&copy_query)
        .await
        .map_err(|err| read_failed(err, "Source table copy failed"))?;
    let mut stream = std::pin::pin!(stream);

    let mut rows = Vec::new();
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| read_failed(err, "Source table copy failed"))?;
        buf.extend_from_slice(&chunk);

        while let Some(end) = buf.iter().position(|&b| b == b'\n') {
            let line = buf.split_to(end);
            buf.advance(1);

            rows.push(decode_copy_line(&line, column_schemas, table_name)?);
        }
    }

    if !buf.is_empty() {
        bail!(
            ErrorKind::ParseError,
            "Copy stream ended with an incomplete row",
            format!("table {table_name}")
        );
    }

    Ok(rows)
}

/// Decodes one line of the copy stream, without its newline.
fn decode_copy_line(
    line: &[u8],
    column_schemas: &[ColumnSchema],
    table_name: &TableName,
) -> EltResult<TableRow> {
    let line = std::str::from_utf8(line).map_err(|err| {
        elt_error!(
            ErrorKind::ParseError,
            "Copy row is not valid UTF-8",
            format!("table {table_name}: {err}")
        )
    })?;

    TableRowConverter::try_from(line, column_schemas)
}

/// Extracts and parses the value of `column_name` from a simple query row.
fn get_row_value<T: FromStr>(
    row: &SimpleQueryRow,
    column_name: &str,
    table_name: &str,
) -> EltResult<T>
where
    T::Err: fmt::Debug,
{
    let value = row
        .try_get(column_name)
        .map_err(|err| {
            elt_error!(
                ErrorKind::ReadFailed,
                "Catalog row could not be read",
                err
            )
        })?
        .ok_or(elt_error!(
            ErrorKind::ReadFailed,
            "Column not found",
            format!("Column '{column_name}' not found in table '{table_name}'")
        ))?;

    value.parse().map_err(|e: T::Err| {
        elt_error!(
            ErrorKind::ConversionError,
            "Column parsing failed",
            format!("Failed to parse value from column '{column_name}' in table '{table_name}': {e:?}")
        )
    })
}

fn read_failed(err: tokio_postgres::Error, description: &'static str) -> EltError {
    EltError::from_postgres(err, ErrorKind::ReadFailed, description)
}
