use elt_config::shared::{CredentialsConfig, PipelineConfig};
use elt_config::{load_config, load_credentials};

/// Loads the [`PipelineConfig`] and validates it.
pub fn load_pipeline_config() -> anyhow::Result<PipelineConfig> {
    let config = load_config::<PipelineConfig>()?;
    config.validate()?;

    Ok(config)
}

/// Reads the credentials artifact the configuration points to.
///
/// The file is read again on every call so that rotated credentials are picked up by the next
/// run.
pub fn load_pipeline_credentials(config: &PipelineConfig) -> anyhow::Result<CredentialsConfig> {
    let path = config.resolve_path(&config.credentials_path);
    let credentials = load_credentials(&path)?;

    Ok(credentials)
}
