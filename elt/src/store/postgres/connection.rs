use std::fmt;
use std::io::BufReader;
use std::sync::Arc;

use elt_config::shared::{CredentialsConfig, PgConnectionConfig, StoreRole, TlsConfig};
use rustls::ClientConfig;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::OnceCell;
use tokio_postgres::config::SslMode;
use tokio_postgres::tls::MakeTlsConnect;
use tokio_postgres::{Client, Config, Connection, NoTls, Socket};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{Instrument, debug, error, info};

use crate::elt_error;
use crate::error::{EltError, EltResult, ErrorKind};

/// Pins the session settings that affect the text representation of values.
const SESSION_SETTINGS: &str =
    "set timezone = 'UTC'; set datestyle = 'ISO, MDY'; set extra_float_digits = 3;";

/// Spawns a background task driving a Postgres connection until it terminates.
fn spawn_postgres_connection<T>(connection: Connection<Socket, T::Stream>)
where
    T: MakeTlsConnect<Socket>,
    T::Stream: Send + 'static,
{
    let span = tracing::Span::current();
    let task = async move {
        if let Err(e) = connection.await {
            error!("an error occurred during the Postgres connection: {}", e);
            return;
        }

        debug!("postgres connection terminated successfully")
    }
    .instrument(span);

    tokio::spawn(task);
}

/// A Postgres database the pipeline reads tables from or writes tables to.
///
/// Creating a store does no I/O. The connection is opened by the first operation and reused by
/// every later operation on the same store.
pub struct PgStore {
    connection_url: SecretString,
    tls: TlsConfig,
    client: OnceCell<Client>,
}

impl PgStore {
    pub fn new(config: &PgConnectionConfig) -> Self {
        Self {
            connection_url: config.connection_url(),
            tls: config.tls.clone(),
            client: OnceCell::new(),
        }
    }

    /// Builds the store for `role` from the credentials artifact.
    pub fn for_role(credentials: &CredentialsConfig, role: StoreRole) -> EltResult<Self> {
        let config = credentials.get(role)?;

        Ok(Self::new(config))
    }

    /// Returns `true` once a connection has been opened.
    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }

    pub(crate) async fn client(&self) -> EltResult<&Client> {
        self.client
            .get_or_try_init(|| connect(&self.connection_url, &self.tls))
            .await
    }
}

impl fmt::Debug for PgStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgStore")
            .field("connection_url", &self.connection_url)
            .field("tls", &self.tls.enabled)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Opens a connection to the database at `connection_url`.
///
/// The connection uses TLS when `tls` is enabled. Both an unparsable url and a refused
/// connection are reported as [`ErrorKind::ConnectionFailed`].
pub async fn connect(connection_url: &SecretString, tls: &TlsConfig) -> EltResult<Client> {
    let mut config = connection_url
        .expose_secret()
        .parse::<Config>()
        .map_err(|err| {
            elt_error!(
                ErrorKind::ConnectionFailed,
                "Invalid connection descriptor",
                err
            )
        })?;

    let client = if tls.enabled {
        config.ssl_mode(SslMode::Require);
        connect_tls(&config, tls).await?
    } else {
        connect_no_tls(&config).await?
    };

    client
        .batch_execute(SESSION_SETTINGS)
        .await
        .map_err(|err| {
            EltError::from_postgres(
                err,
                ErrorKind::ConnectionFailed,
                "Session could not be configured",
            )
        })?;

    Ok(client)
}

async fn connect_no_tls(config: &Config) -> EltResult<Client> {
    let (client, connection) = config
        .connect(NoTls)
        .await
        .map_err(connection_failed)?;
    spawn_postgres_connection::<NoTls>(connection);

    info!(host = ?config.get_hosts(), "connected to postgres without tls");

    Ok(client)
}

async fn connect_tls(config: &Config, tls: &TlsConfig) -> EltResult<Client> {
    let mut root_store = rustls::RootCertStore::empty();
    let mut root_certs_reader = BufReader::new(tls.trusted_root_certs.as_bytes());
    for cert in rustls_pemfile::certs(&mut root_certs_reader) {
        let cert = cert.map_err(|err| {
            elt_error!(
                ErrorKind::EncryptionError,
                "Invalid trusted root certificate",
                err
            )
        })?;
        root_store.add(cert)?;
    }

    let tls_config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::aws_lc_rs::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .with_root_certificates(root_store)
    .with_no_client_auth();

    let (client, connection) = config
        .connect(MakeRustlsConnect::new(tls_config))
        .await
        .map_err(connection_failed)?;
    spawn_postgres_connection::<MakeRustlsConnect>(connection);

    info!(host = ?config.get_hosts(), "connected to postgres with tls");

    Ok(client)
}

fn connection_failed(err: tokio_postgres::Error) -> EltError {
    EltError::from_postgres(
        err,
        ErrorKind::ConnectionFailed,
        "Postgres connection failed",
    )
}
