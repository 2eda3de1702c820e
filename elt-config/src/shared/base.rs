use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A stage has no tables to process.
    #[error("`{0}.tables` must contain at least one table")]
    EmptyTableInventory(&'static str),
    /// A table entry has an empty source or destination.
    #[error("`{0}.tables` contains an entry with an empty source or destination")]
    EmptyTableName(&'static str),
    /// Two entries of the same stage write to the same destination table.
    #[error("`{stage}.tables` writes to `{destination}` more than once")]
    DuplicateDestination {
        stage: &'static str,
        destination: String,
    },
    /// A schema name is empty.
    #[error("`{0}` cannot be empty")]
    EmptySchema(&'static str),
    /// The csv delimiter must be a single ASCII character.
    #[error("`load.csv.delimiter` must be a single ASCII character, got `{0}`")]
    InvalidDelimiter(char),
    /// The transform program is empty.
    #[error("`transform.program` cannot be empty")]
    EmptyTransformProgram,
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,
    /// The credentials artifact has no entry for a store role.
    #[error("no credentials found for `{0}`")]
    MissingCredentials(&'static str),
}
