use elt_config::shared::{PgConnectionConfig, TlsConfig};
use elt_postgres::tokio::test_utils::PgDatabase;
use uuid::Uuid;

use crate::store::postgres::PgStore;

/// Returns the parameters of the local Postgres instance used by tests, with a fresh database
/// name.
///
/// If you fail to connect locally to the Postgres instance you can modify this connection struct
/// with your parameters.
pub fn local_pg_connection_config() -> PgConnectionConfig {
    PgConnectionConfig {
        host: "localhost".to_owned(),
        port: 5430,
        // A random name keeps concurrently running tests apart.
        name: Uuid::new_v4().to_string(),
        username: "postgres".to_owned(),
        password: Some("postgres".to_owned().into()),
        tls: TlsConfig {
            trusted_root_certs: String::new(),
            enabled: false,
        },
    }
}

/// Creates an empty database with a unique name, dropped again when the returned value is.
///
/// # Panics
///
/// Panics if the local Postgres instance cannot be reached.
pub async fn spawn_database() -> PgDatabase {
    PgDatabase::new(local_pg_connection_config()).await
}

/// Returns a store for `database` that has not connected yet.
pub fn store_for(database: &PgDatabase) -> PgStore {
    PgStore::new(&database.config)
}

/// Returns the parameters of a store nothing listens on.
pub fn unreachable_pg_connection_config() -> PgConnectionConfig {
    PgConnectionConfig {
        host: "127.0.0.1".to_owned(),
        port: 1,
        ..local_pg_connection_config()
    }
}
