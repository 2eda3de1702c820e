use elt::error::ErrorKind;
use elt::pipeline::Pipeline;
use elt::stages::{CsvLoadStage, ReplicationStage};
use elt::test_utils::database::{spawn_database, store_for};
use elt::test_utils::pipeline::{copy_sample_csv_files, pipeline_config};
use elt::transform::TransformTrigger;
use elt::types::TableName;
use elt_telemetry::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn test_pipeline_runs_transform_after_replication() {
    init_test_tracing();

    let source = spawn_database().await;
    let warehouse = spawn_database().await;
    let dir = tempfile::tempdir().unwrap();
    copy_sample_csv_files(dir.path());
    let mut config = pipeline_config(dir.path());
    config.transform.program = "sh".to_string();
    config.transform.args = vec!["-c".to_string(), "touch transformed".to_string()];

    let pipeline = Pipeline::new(
        CsvLoadStage::new(&config, store_for(&source)),
        ReplicationStage::new(&config, store_for(&source), store_for(&warehouse)),
        TransformTrigger::new(&config),
    );
    let report = pipeline.run().await.unwrap();

    assert_eq!(report.load.total_rows(), 22);
    assert_eq!(report.replication.total_rows(), 22);
    assert_eq!(
        warehouse
            .count_rows(&TableName::new("staging", "stg_dev_employee"))
            .await
            .unwrap(),
        10
    );
    assert!(dir.path().join("transformed").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_load_skips_replication_and_transform() {
    init_test_tracing();

    let source = spawn_database().await;
    let warehouse = spawn_database().await;
    // No csv files are copied, so the load fails on the first one.
    let dir = tempfile::tempdir().unwrap();
    let mut config = pipeline_config(dir.path());
    config.transform.program = "sh".to_string();
    config.transform.args = vec!["-c".to_string(), "touch transformed".to_string()];

    let pipeline = Pipeline::new(
        CsvLoadStage::new(&config, store_for(&source)),
        ReplicationStage::new(&config, store_for(&source), store_for(&warehouse)),
        TransformTrigger::new(&config),
    );
    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingInput);
    assert!(
        !warehouse
            .table_exists(&TableName::new("staging", "stg_dev_employee"))
            .await
            .unwrap()
    );
    assert!(!dir.path().join("transformed").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_transform_keeps_staging_tables() {
    init_test_tracing();

    let source = spawn_database().await;
    let warehouse = spawn_database().await;
    let dir = tempfile::tempdir().unwrap();
    copy_sample_csv_files(dir.path());
    let mut config = pipeline_config(dir.path());
    config.transform.program = "sh".to_string();
    config.transform.args = vec!["-c".to_string(), "exit 2".to_string()];

    let pipeline = Pipeline::new(
        CsvLoadStage::new(&config, store_for(&source)),
        ReplicationStage::new(&config, store_for(&source), store_for(&warehouse)),
        TransformTrigger::new(&config),
    );
    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransformFailed);
    assert_eq!(
        warehouse
            .count_rows(&TableName::new("staging", "stg_dev_performance_rating"))
            .await
            .unwrap(),
        12
    );
}
