use elt::error::ErrorKind;
use elt::stages::{CsvLoadStage, Stage};
use elt::test_utils::database::{spawn_database, store_for};
use elt::test_utils::pipeline::{copy_sample_csv_files, pipeline_config, write_csv};
use elt::types::TableName;
use elt_config::shared::TableSpec;
use elt_telemetry::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn test_sample_files_are_loaded() {
    init_test_tracing();

    let database = spawn_database().await;
    let dir = tempfile::tempdir().unwrap();
    copy_sample_csv_files(dir.path());
    let config = pipeline_config(dir.path());

    let report = CsvLoadStage::new(&config, store_for(&database))
        .run()
        .await
        .unwrap();

    let employee = TableName::new("public", "employee");
    let rating = TableName::new("public", "performance_rating");
    assert_eq!(report.tables[0].rows, 10);
    assert_eq!(report.tables[1].rows, 12);
    assert_eq!(database.count_rows(&employee).await.unwrap(), 10);
    assert_eq!(database.count_rows(&rating).await.unwrap(), 12);

    assert_eq!(
        database.column_types(&employee).await.unwrap(),
        vec![
            ("employee_id".to_string(), "bigint".to_string()),
            ("first_name".to_string(), "text".to_string()),
            ("last_name".to_string(), "text".to_string()),
            ("department".to_string(), "text".to_string()),
            ("hire_date".to_string(), "text".to_string()),
            ("salary".to_string(), "double precision".to_string()),
            ("is_active".to_string(), "boolean".to_string()),
        ]
    );

    let departments: Vec<String> = database
        .query_table(&employee, "department", "employee_id")
        .await
        .unwrap();
    assert_eq!(departments[8], "Research, Development");

    let salaries: Vec<Option<f64>> = database
        .query_table(&employee, "salary", "employee_id")
        .await
        .unwrap();
    assert_eq!(salaries[0], Some(8200.5));
    assert_eq!(salaries[9], None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reloading_replaces_the_table() {
    init_test_tracing();

    let database = spawn_database().await;
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "employee.csv", "id,name\n1,a\n2,b\n3,c\n");
    let mut config = pipeline_config(dir.path());
    config.load.tables = vec![TableSpec::new("employee.csv", "employee")];
    let employee = TableName::new("public", "employee");

    let stage = CsvLoadStage::new(&config, store_for(&database));
    stage.run().await.unwrap();
    stage.run().await.unwrap();
    assert_eq!(database.count_rows(&employee).await.unwrap(), 3);

    // A changed file replaces the columns too.
    write_csv(dir.path(), "employee.csv", "id,score\n1,0.5\n");
    CsvLoadStage::new(&config, store_for(&database))
        .run()
        .await
        .unwrap();

    assert_eq!(database.count_rows(&employee).await.unwrap(), 1);
    assert_eq!(
        database.column_types(&employee).await.unwrap(),
        vec![
            ("id".to_string(), "bigint".to_string()),
            ("score".to_string(), "double precision".to_string()),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_file_keeps_earlier_tables() {
    init_test_tracing();

    let database = spawn_database().await;
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "first.csv", "id\n1\n2\n");
    let mut config = pipeline_config(dir.path());
    config.load.tables = vec![
        TableSpec::new("first.csv", "first"),
        TableSpec::new("missing.csv", "missing"),
    ];

    let err = CsvLoadStage::new(&config, store_for(&database))
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingInput);
    assert_eq!(
        database
            .count_rows(&TableName::new("public", "first"))
            .await
            .unwrap(),
        2
    );
    assert!(
        !database
            .table_exists(&TableName::new("public", "missing"))
            .await
            .unwrap()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_text_values_survive_the_copy() {
    init_test_tracing();

    let database = spawn_database().await;
    let dir = tempfile::tempdir().unwrap();
    write_csv(
        dir.path(),
        "notes.csv",
        "id,note\n1,\"tab\there\"\n2,\"back\\slash\"\n3,\"two\nlines\"\n4,\\N\n",
    );
    let mut config = pipeline_config(dir.path());
    config.load.tables = vec![TableSpec::new("notes.csv", "notes")];

    CsvLoadStage::new(&config, store_for(&database))
        .run()
        .await
        .unwrap();

    let notes: Vec<Option<String>> = database
        .query_table(&TableName::new("public", "notes"), "note", "id")
        .await
        .unwrap();
    assert_eq!(
        notes,
        vec![
            Some("tab\there".to_string()),
            Some("back\\slash".to_string()),
            Some("two\nlines".to_string()),
            Some("\\N".to_string()),
        ]
    );
}
