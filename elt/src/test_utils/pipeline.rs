use std::fs;
use std::path::{Path, PathBuf};

use elt_config::shared::{
    CsvOptions, LoadConfig, PipelineConfig, ReplicationConfig, TableSpec, TransformConfig,
};

/// Returns a configuration rooted at `project_root` with the sample table inventories.
///
/// The transform runs `true` in the project root, so it always succeeds.
pub fn pipeline_config(project_root: &Path) -> PipelineConfig {
    PipelineConfig {
        project_root: project_root.to_path_buf(),
        credentials_path: PathBuf::from("credentials.json"),
        load: LoadConfig {
            schema: "public".to_owned(),
            csv: CsvOptions::default(),
            tables: vec![
                TableSpec::new("employee.csv", "employee"),
                TableSpec::new("performance_rating.csv", "performance_rating"),
            ],
        },
        replication: ReplicationConfig {
            source_schema: "public".to_owned(),
            target_schema: "staging".to_owned(),
            tables: vec![
                TableSpec::new("employee", "stg_dev_employee"),
                TableSpec::new("performance_rating", "stg_dev_performance_rating"),
            ],
        },
        transform: TransformConfig {
            enabled: true,
            program: "true".to_owned(),
            args: vec![],
            working_dir: PathBuf::from("."),
        },
        sentry: None,
    }
}

/// Writes a csv file named `name` with `content` into `dir` and returns its path.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write csv fixture");

    path
}

/// Returns the directory holding the sample csv files shipped with the repository.
pub fn sample_csv_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("asset")
        .join("csv")
}

/// Copies the sample csv files into `dir` under the names used by [`pipeline_config`].
///
/// # Panics
///
/// Panics if a sample file cannot be copied.
pub fn copy_sample_csv_files(dir: &Path) {
    for name in ["employee.csv", "performance_rating.csv"] {
        fs::copy(sample_csv_dir().join(name), dir.join(name)).expect("Failed to copy sample csv");
    }
}
