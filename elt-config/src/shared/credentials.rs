use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::{PgConnectionConfig, ValidationError};

/// The stores the pipeline talks to, as named in the credentials artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreRole {
    /// Operational database the csv files are loaded into and replicated from.
    Source,
    /// Warehouse that receives the staging copies.
    Warehouse,
}

impl StoreRole {
    /// Key of this role in the credentials artifact.
    pub fn key(&self) -> &'static str {
        match self {
            StoreRole::Source => "postgres_oltp",
            StoreRole::Warehouse => "postgres_dwh",
        }
    }
}

impl fmt::Display for StoreRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Connection descriptors keyed by store role.
///
/// Entries are optional at parse time so that a stage only requires the roles it uses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default, alias = "source-oltp")]
    pub postgres_oltp: Option<PgConnectionConfig>,
    #[serde(default, alias = "warehouse-dwh")]
    pub postgres_dwh: Option<PgConnectionConfig>,
}

impl CredentialsConfig {
    /// Returns the validated descriptor for `role`.
    pub fn get(&self, role: StoreRole) -> Result<&PgConnectionConfig, ValidationError> {
        let config = match role {
            StoreRole::Source => self.postgres_oltp.as_ref(),
            StoreRole::Warehouse => self.postgres_dwh.as_ref(),
        }
        .ok_or(ValidationError::MissingCredentials(role.key()))?;

        config.validate()?;

        Ok(config)
    }
}
