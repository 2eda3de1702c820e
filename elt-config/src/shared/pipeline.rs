use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Config;
use crate::shared::{SentryConfig, TableSpec, ValidationError, validate_table_inventory};

const DEFAULT_SOURCE_SCHEMA: &str = "public";
const DEFAULT_STAGING_SCHEMA: &str = "staging";
const DEFAULT_CREDENTIALS_PATH: &str = "configuration/credentials.json";
const DEFAULT_TRANSFORM_PROGRAM: &str = "dbt";

/// Tokens read as SQL `NULL` from csv files unless configured otherwise.
pub const DEFAULT_CSV_NULL_VALUES: &[&str] = &[
    "", "NA", "N/A", "n/a", "NULL", "null", "NaN", "nan", "-NaN", "-nan", "#N/A", "#NA", "<NA>",
    "None",
];

/// Complete configuration of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory relative paths (csv files, credentials, transform project) are resolved against.
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,
    /// Location of the credentials artifact.
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    pub load: LoadConfig,
    pub replication: ReplicationConfig,
    pub transform: TransformConfig,
    #[serde(default)]
    pub sentry: Option<SentryConfig>,
}

/// Csv files loaded into the source store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Schema of the source store the tables are written to.
    #[serde(default = "default_source_schema")]
    pub schema: String,
    #[serde(default)]
    pub csv: CsvOptions,
    pub tables: Vec<TableSpec>,
}

/// Parsing options shared by every csv file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvOptions {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_null_values")]
    pub null_values: Vec<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            null_values: default_null_values(),
        }
    }
}

/// Tables copied from the source store into the warehouse staging schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationConfig {
    #[serde(default = "default_source_schema")]
    pub source_schema: String,
    #[serde(default = "default_staging_schema")]
    pub target_schema: String,
    pub tables: Vec<TableSpec>,
}

/// External transformation run once replication completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_transform_program")]
    pub program: String,
    #[serde(default = "default_transform_args")]
    pub args: Vec<String>,
    /// Directory the program runs in, usually the transformation project.
    pub working_dir: PathBuf,
}

impl PipelineConfig {
    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.load.schema.trim().is_empty() {
            return Err(ValidationError::EmptySchema("load.schema"));
        }
        if !self.load.csv.delimiter.is_ascii() {
            return Err(ValidationError::InvalidDelimiter(self.load.csv.delimiter));
        }
        validate_table_inventory("load", &self.load.tables)?;

        if self.replication.source_schema.trim().is_empty() {
            return Err(ValidationError::EmptySchema("replication.source_schema"));
        }
        if self.replication.target_schema.trim().is_empty() {
            return Err(ValidationError::EmptySchema("replication.target_schema"));
        }
        validate_table_inventory("replication", &self.replication.tables)?;

        if self.transform.enabled && self.transform.program.trim().is_empty() {
            return Err(ValidationError::EmptyTransformProgram);
        }

        Ok(())
    }

    /// Resolves `path` against the project root unless it is already absolute.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

impl Config for PipelineConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["transform.args"];
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from(DEFAULT_CREDENTIALS_PATH)
}

fn default_source_schema() -> String {
    DEFAULT_SOURCE_SCHEMA.to_string()
}

fn default_staging_schema() -> String {
    DEFAULT_STAGING_SCHEMA.to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_null_values() -> Vec<String> {
    DEFAULT_CSV_NULL_VALUES
        .iter()
        .map(|value| value.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_transform_program() -> String {
    DEFAULT_TRANSFORM_PROGRAM.to_string()
}

fn default_transform_args() -> Vec<String> {
    vec!["run".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_CONFIG: &str = r#"{
        "load": {
            "tables": [
                {"source": "asset/csv/employee.csv", "destination": "employee"},
                {"source": "asset/csv/performance_rating.csv", "destination": "performance_rating"}
            ]
        },
        "replication": {
            "tables": [
                {"source": "employee", "destination": "stg_dev_employee"},
                {"source": "performance_rating", "destination": "stg_dev_performance_rating"}
            ]
        },
        "transform": {"working_dir": "dbt/dbt_postgre"}
    }"#;

    fn minimal_config() -> PipelineConfig {
        serde_json::from_str(MINIMAL_CONFIG).unwrap()
    }

    #[test]
    fn applies_defaults() {
        let config = minimal_config();

        assert_eq!(config.project_root, PathBuf::from("."));
        assert_eq!(
            config.credentials_path,
            PathBuf::from("configuration/credentials.json")
        );
        assert_eq!(config.load.schema, "public");
        assert_eq!(config.load.csv.delimiter, ',');
        assert!(config.load.csv.null_values.contains(&"NA".to_string()));
        assert_eq!(config.replication.source_schema, "public");
        assert_eq!(config.replication.target_schema, "staging");
        assert!(config.transform.enabled);
        assert_eq!(config.transform.program, "dbt");
        assert_eq!(config.transform.args, vec!["run".to_string()]);
        assert!(config.sentry.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn inventory_order_is_preserved() {
        let config = minimal_config();

        let destinations: Vec<_> = config
            .replication
            .tables
            .iter()
            .map(|table| table.destination.as_str())
            .collect();
        assert_eq!(
            destinations,
            vec!["stg_dev_employee", "stg_dev_performance_rating"]
        );
    }

    #[test]
    fn rejects_empty_replication_inventory() {
        let mut config = minimal_config();
        config.replication.tables.clear();

        assert_eq!(
            config.validate(),
            Err(ValidationError::EmptyTableInventory("replication"))
        );
    }

    #[test]
    fn rejects_empty_target_schema() {
        let mut config = minimal_config();
        config.replication.target_schema = String::new();

        assert_eq!(
            config.validate(),
            Err(ValidationError::EmptySchema("replication.target_schema"))
        );
    }

    #[test]
    fn rejects_non_ascii_delimiter() {
        let mut config = minimal_config();
        config.load.csv.delimiter = '§';

        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidDelimiter('§'))
        );
    }

    #[test]
    fn disabled_transform_skips_program_check() {
        let mut config = minimal_config();
        config.transform.program = String::new();
        assert_eq!(
            config.validate(),
            Err(ValidationError::EmptyTransformProgram)
        );

        config.transform.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn resolves_relative_paths_against_project_root() {
        let mut config = minimal_config();
        config.project_root = PathBuf::from("/opt/pipeline");

        assert_eq!(
            config.resolve_path("asset/csv/employee.csv"),
            PathBuf::from("/opt/pipeline/asset/csv/employee.csv")
        );
        assert_eq!(
            config.resolve_path("/data/employee.csv"),
            PathBuf::from("/data/employee.csv")
        );
    }
}
