use bytes::{Bytes, BytesMut};
use elt_postgres::schema::TableName;
use futures::SinkExt;
use pg_escape::quote_identifier;
use tokio_postgres::Client;
use tracing::{debug, info, warn};

use crate::bail;
use crate::conversions::table_row::TableRowConverter;
use crate::error::{EltError, EltResult, ErrorKind};
use crate::store::TableDestination;
use crate::store::postgres::PgStore;
use crate::types::Dataset;

/// Number of rows encoded into one `CopyData` message.
const COPY_BATCH_SIZE: usize = 1000;

impl TableDestination for PgStore {
    /// Drops, recreates and fills `table_name` in a single transaction.
    ///
    /// Readers see either the previous table or the complete new one. The schema is created
    /// beforehand if needed and stays in place even if the replace fails.
    async fn replace_table(&self, table_name: &TableName, dataset: &Dataset) -> EltResult<u64> {
        let client = self.client().await?;

        client
            .batch_execute(&format!(
                "create schema if not exists {};",
                quote_identifier(&table_name.schema)
            ))
            .await
            .map_err(|err| write_failed(err, "Destination schema could not be created"))?;

        client
            .simple_query("begin;")
            .await
            .map_err(|err| write_failed(err, "Write transaction could not be started"))?;

        match replace_table_in_transaction(client, table_name, dataset).await {
            Ok(rows) => {
                client
                    .simple_query("commit;")
                    .await
                    .map_err(|err| write_failed(err, "Write transaction could not be committed"))?;

                info!(table = %table_name, rows, "replaced destination table");

                Ok(rows)
            }
            Err(err) => {
                if let Err(rollback_err) = client.simple_query("rollback;").await {
                    warn!(error = %rollback_err, "failed to roll back write transaction");
                }

                Err(err)
            }
        }
    }
}

async fn replace_table_in_transaction(
    client: &Client,
    table_name: &TableName,
    dataset: &Dataset,
) -> EltResult<u64> {
    let table = table_name.as_quoted_identifier();
    let column_definitions = dataset
        .column_schemas
        .iter()
        .map(|column| column.column_definition())
        .collect::<Vec<_>>()
        .join(", ");

    client
        .batch_execute(&format!(
            "drop table if exists {table}; create table {table} ({column_definitions});"
        ))
        .await
        .map_err(|err| write_failed(err, "Destination table could not be recreated"))?;

    let rows = copy_rows_in(client, &table, dataset).await?;
    if rows != dataset.row_count() {
        bail!(
            ErrorKind::WriteFailed,
            "Copied row count does not match the dataset",
            format!(
                "table {table_name}: copied {rows} rows, expected {}",
                dataset.row_count()
            )
        );
    }

    Ok(rows)
}

/// Streams the rows of `dataset` into the freshly created `table`.
async fn copy_rows_in(client: &Client, table: &str, dataset: &Dataset) -> EltResult<u64> {
    let sink = client
        .copy_in::<_, Bytes>(&format!("copy {table} from stdin with (format text);"))
        .await
        .map_err(|err| write_failed(err, "Destination table copy failed"))?;
    let mut sink = std::pin::pin!(sink);

    let mut buf = BytesMut::new();
    for batch in dataset.rows.chunks(COPY_BATCH_SIZE) {
        for row in batch {
            TableRowConverter::encode(row, &mut buf);
        }

        debug!(rows = batch.len(), bytes = buf.len(), "sending copy batch");
        sink.send(buf.split().freeze())
            .await
            .map_err(|err| write_failed(err, "Destination table copy failed"))?;
    }

    sink.as_mut()
        .finish()
        .await
        .map_err(|err| write_failed(err, "Destination table copy failed"))
}

fn write_failed(err: tokio_postgres::Error, description: &'static str) -> EltError {
    EltError::from_postgres(err, ErrorKind::WriteFailed, description)
}
