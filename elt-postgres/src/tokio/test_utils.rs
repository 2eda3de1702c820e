use elt_config::shared::{IntoConnectOptions, PgConnectionConfig};
use tokio::runtime::Handle;
use tokio_postgres::types::FromSql;
use tokio_postgres::{Client, NoTls};
use tracing::info;

use crate::schema::TableName;

/// A throwaway Postgres database for tests.
///
/// The database is created on construction and dropped, together with every connection to it,
/// when the value is dropped. Dropping requires a multi-threaded runtime.
pub struct PgDatabase {
    pub config: PgConnectionConfig,
    pub client: Client,
}

impl PgDatabase {
    /// Creates the database named in `config` and connects to it.
    pub async fn new(config: PgConnectionConfig) -> Self {
        let client = create_pg_database(&config).await;

        Self { config, client }
    }

    /// Executes `sql`, which may contain several statements.
    pub async fn run_sql(&self, sql: &str) -> Result<(), tokio_postgres::Error> {
        self.client.batch_execute(sql).await
    }

    /// Returns the values of `column` for every row of `table_name`, ordered by `order_by`.
    pub async fn query_table<T>(
        &self,
        table_name: &TableName,
        column: &str,
        order_by: &str,
    ) -> Result<Vec<T>, tokio_postgres::Error>
    where
        T: for<'a> FromSql<'a>,
    {
        let query = format!(
            "select {column} from {} order by {order_by}",
            table_name.as_quoted_identifier(),
        );

        let rows = self.client.query(&query, &[]).await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    /// Returns the number of rows in `table_name`.
    pub async fn count_rows(&self, table_name: &TableName) -> Result<i64, tokio_postgres::Error> {
        let query = format!(
            "select count(*) from {}",
            table_name.as_quoted_identifier()
        );

        let row = self.client.query_one(&query, &[]).await?;
        Ok(row.get(0))
    }

    /// Returns whether `table_name` exists.
    pub async fn table_exists(&self, table_name: &TableName) -> Result<bool, tokio_postgres::Error> {
        let row = self
            .client
            .query_one(
                "select exists(select 1 from pg_class c join pg_namespace n on n.oid = c.relnamespace \
                where n.nspname = $1 and c.relname = $2)",
                &[&table_name.schema, &table_name.name],
            )
            .await?;

        Ok(row.get(0))
    }

    /// Returns `(column name, formatted type)` pairs of `table_name` in column order.
    pub async fn column_types(
        &self,
        table_name: &TableName,
    ) -> Result<Vec<(String, String)>, tokio_postgres::Error> {
        let rows = self
            .client
            .query(
                "select a.attname::text, format_type(a.atttypid, a.atttypmod) \
                from pg_attribute a \
                join pg_class c on c.oid = a.attrelid \
                join pg_namespace n on n.oid = c.relnamespace \
                where n.nspname = $1 and c.relname = $2 and a.attnum > 0 and not a.attisdropped \
                order by a.attnum",
                &[&table_name.schema, &table_name.name],
            )
            .await?;

        Ok(rows.iter().map(|row| (row.get(0), row.get(1))).collect())
    }
}

impl Drop for PgDatabase {
    fn drop(&mut self) {
        let config = self.config.clone();
        // `block_in_place` hands the current worker's tasks to another worker, which is only
        // possible on the multi-threaded runtime.
        tokio::task::block_in_place(move || {
            Handle::current().block_on(async move { drop_pg_database(&config).await });
        });
    }
}

/// Creates the database named in `config` and returns a client connected to it.
///
/// # Panics
/// Panics if the server is unreachable or the database cannot be created.
pub async fn create_pg_database(config: &PgConnectionConfig) -> Client {
    let client = connect(config.without_db()).await;

    client
        .execute(&*format!(r#"create database "{}";"#, config.name), &[])
        .await
        .expect("Failed to create database");

    connect_to_pg_database(config).await
}

/// Connects to the existing database named in `config`.
pub async fn connect_to_pg_database(config: &PgConnectionConfig) -> Client {
    connect(config.with_db()).await
}

/// Terminates the connections to the database named in `config` and drops it.
///
/// # Panics
/// Panics if any statement fails.
pub async fn drop_pg_database(config: &PgConnectionConfig) {
    let client = connect(config.without_db()).await;

    client
        .execute(
            "select pg_terminate_backend(pid) from pg_stat_activity \
            where datname = $1 and pid <> pg_backend_pid()",
            &[&config.name],
        )
        .await
        .expect("Failed to terminate database connections");

    client
        .execute(
            &*format!(r#"drop database if exists "{}";"#, config.name),
            &[],
        )
        .await
        .expect("Failed to drop database");
}

async fn connect(config: tokio_postgres::Config) -> Client {
    let (client, connection) = config
        .connect(NoTls)
        .await
        .expect("Failed to connect to Postgres");

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            info!("connection error: {e}");
        }
    });

    client
}
