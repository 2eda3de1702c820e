use std::path::Path;

use config::{ConfigError, FileFormat};
use serde::de::DeserializeOwned;

use crate::environment::Environment;
use crate::shared::CredentialsConfig;

/// Directory containing configuration files relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

/// Base configuration file loaded for all environments.
const BASE_CONFIG_FILE: &str = "base.yaml";

/// Prefix for environment variable configuration overrides.
const ENV_PREFIX: &str = "APP";

/// Prefix for environment variable overrides of the credentials artifact.
///
/// Example: `APP_CREDENTIALS_POSTGRES_DWH__PASSWORD` sets `postgres_dwh.password`.
const CREDENTIALS_ENV_PREFIX: &str = "APP_CREDENTIALS";

/// Separator between environment variable prefix and key segments.
const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested configuration keys in environment variables.
///
/// Example: `APP_REPLICATION__TARGET_SCHEMA` sets the `replication.target_schema` field.
const ENV_SEPARATOR: &str = "__";

/// Separator for list elements in environment variables.
///
/// Example: `APP_TRANSFORM__ARGS=run,--select,staging` sets the `transform.args` list.
const LIST_SEPARATOR: &str = ",";

/// Keys of a [`Config`] implementation that are parsed as lists when read from the environment.
pub trait Config {
    const LIST_PARSE_KEYS: &'static [&'static str];
}

/// Loads hierarchical configuration relative to the current working directory.
///
/// Sources are layered in this order, later ones winning:
/// 1. `configuration/base.yaml`
/// 2. `configuration/{environment}.yaml`, where the environment comes from `APP_ENVIRONMENT`
/// 3. environment variables prefixed with `APP`, nested with `__`
pub fn load_config<T>() -> Result<T, ConfigError>
where
    T: Config + DeserializeOwned,
{
    let base_path = std::env::current_dir().map_err(|err| {
        ConfigError::Message(format!("failed to determine the current directory: {err}"))
    })?;
    let environment = Environment::load().map_err(|err| ConfigError::Message(err.to_string()))?;

    load_config_from(&base_path, environment)
}

/// Loads hierarchical configuration from the `configuration` directory under `base_path`.
///
/// The environment overlay is optional, the base file is not.
pub fn load_config_from<T>(base_path: &Path, environment: Environment) -> Result<T, ConfigError>
where
    T: Config + DeserializeOwned,
{
    let configuration_directory = base_path.join(CONFIGURATION_DIR);
    let environment_filename = format!("{environment}.yaml");

    let mut environment_source = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR);

    if !<T as Config>::LIST_PARSE_KEYS.is_empty() {
        environment_source = environment_source
            .try_parsing(true)
            .list_separator(LIST_SEPARATOR);

        for key in <T as Config>::LIST_PARSE_KEYS {
            environment_source = environment_source.with_list_parse_key(key);
        }
    }

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join(BASE_CONFIG_FILE),
        ))
        .add_source(
            config::File::from(configuration_directory.join(environment_filename))
                .required(false),
        )
        .add_source(environment_source)
        .build()?;

    settings.try_deserialize::<T>()
}

/// Reads the credentials artifact at `path`.
///
/// The file is JSON keyed by store role. Any field can be overridden through variables
/// prefixed with `APP_CREDENTIALS_`. Nothing is cached, so every call observes the current
/// contents of the file.
pub fn load_credentials(path: &Path) -> Result<CredentialsConfig, ConfigError> {
    let environment_source = config::Environment::with_prefix(CREDENTIALS_ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR);

    let settings = config::Config::builder()
        .add_source(config::File::from(path).format(FileFormat::Json))
        .add_source(environment_source)
        .build()?;

    settings.try_deserialize::<CredentialsConfig>()
}
