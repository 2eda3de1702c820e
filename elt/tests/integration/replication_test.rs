use elt::error::ErrorKind;
use elt::stages::{CsvLoadStage, ReplicationStage, Stage};
use elt::store::postgres::PgStore;
use elt::test_utils::database::{spawn_database, store_for, unreachable_pg_connection_config};
use elt::test_utils::pipeline::{copy_sample_csv_files, pipeline_config};
use elt::types::TableName;
use elt_config::shared::TableSpec;
use elt_telemetry::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn test_sample_tables_are_replicated_to_staging() {
    init_test_tracing();

    let source = spawn_database().await;
    let warehouse = spawn_database().await;
    let dir = tempfile::tempdir().unwrap();
    copy_sample_csv_files(dir.path());
    let config = pipeline_config(dir.path());

    CsvLoadStage::new(&config, store_for(&source))
        .run()
        .await
        .unwrap();
    let report = ReplicationStage::new(&config, store_for(&source), store_for(&warehouse))
        .run()
        .await
        .unwrap();

    for (source_table, staging_table) in [
        ("employee", "stg_dev_employee"),
        ("performance_rating", "stg_dev_performance_rating"),
    ] {
        let source_table = TableName::new("public", source_table);
        let staging_table = TableName::new("staging", staging_table);

        assert_eq!(
            source.count_rows(&source_table).await.unwrap(),
            warehouse.count_rows(&staging_table).await.unwrap()
        );
        assert_eq!(
            source.column_types(&source_table).await.unwrap(),
            warehouse.column_types(&staging_table).await.unwrap()
        );
    }
    assert_eq!(report.total_rows(), 22);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_column_types_and_values_are_preserved() {
    init_test_tracing();

    let source = spawn_database().await;
    let warehouse = spawn_database().await;
    source
        .run_sql(
            "create type mood as enum ('happy', 'sad');
            create table public.typed (
                id integer primary key,
                name character varying(50) not null,
                amount numeric(10,2),
                ratio real,
                score double precision,
                born date,
                seen_at timestamp,
                seen_tz timestamptz,
                token uuid,
                payload jsonb,
                tags text[],
                feeling mood,
                doubled integer generated always as (id * 2) stored
            );
            insert into public.typed
                (id, name, amount, ratio, score, born, seen_at, seen_tz, token, payload, tags, feeling)
            values
                (1, 'tab\there', 1234.50, 0.1, 1e-7, '2024-02-29', '2024-02-29 13:45:01.123456',
                 '2024-02-29 13:45:01+02', '67e55044-10b1-426f-9247-bb680e5fe0c8',
                 '{\"a\": [1, 2]}', '{x,\"y z\"}', 'happy'),
                (2, E'line\\nbreak', 'NaN', 'Infinity', '-Infinity', 'infinity', null, null, null,
                 null, '{}', null),
                (3, E'back\\\\slash \\\\N', null, null, null, null, null, null, null, null, null, 'sad');
            alter table public.typed drop column ratio;",
        )
        .await
        .unwrap();

    let mut config = pipeline_config(std::path::Path::new("."));
    config.replication.tables = vec![TableSpec::new("typed", "stg_typed")];

    ReplicationStage::new(&config, store_for(&source), store_for(&warehouse))
        .run()
        .await
        .unwrap();

    let staged = TableName::new("staging", "stg_typed");
    assert_eq!(
        warehouse.column_types(&staged).await.unwrap(),
        vec![
            ("id".to_string(), "integer".to_string()),
            ("name".to_string(), "character varying(50)".to_string()),
            ("amount".to_string(), "numeric(10,2)".to_string()),
            ("score".to_string(), "double precision".to_string()),
            ("born".to_string(), "date".to_string()),
            ("seen_at".to_string(), "timestamp without time zone".to_string()),
            ("seen_tz".to_string(), "timestamp with time zone".to_string()),
            ("token".to_string(), "uuid".to_string()),
            ("payload".to_string(), "jsonb".to_string()),
            ("tags".to_string(), "text[]".to_string()),
            ("feeling".to_string(), "text".to_string()),
        ]
    );

    // Comparing text renderings checks every value, including the special ones.
    let select = "select id, name, amount::text, score::text, born::text, seen_at::text, \
        seen_tz::text, token::text, payload::text, tags::text, feeling::text";
    let rows_of = |schema: &str, table: &str| format!("{select} from {schema}.{table} order by id");

    let source_rows = source
        .client
        .query(&rows_of("public", "typed"), &[])
        .await
        .unwrap();
    let staged_rows = warehouse
        .client
        .query(&rows_of("staging", "stg_typed"), &[])
        .await
        .unwrap();

    assert_eq!(source_rows.len(), 3);
    assert_eq!(staged_rows.len(), 3);
    for (source_row, staged_row) in source_rows.iter().zip(&staged_rows) {
        assert_eq!(source_row.get::<_, i32>(0), staged_row.get::<_, i32>(0));
        for i in 1..source_row.len() {
            assert_eq!(
                source_row.get::<_, Option<String>>(i),
                staged_row.get::<_, Option<String>>(i),
                "column {i} of row {}",
                source_row.get::<_, i32>(0)
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dates_past_year_9999_are_replicated() {
    init_test_tracing();

    let source = spawn_database().await;
    let warehouse = spawn_database().await;
    source
        .run_sql(
            "create table public.far_future (id integer, d date, ts timestamp, tz timestamptz);
            insert into public.far_future values
                (1, '10000-01-01', '12345-06-07 08:09:10', '10000-01-01 00:00:00+00'),
                (2, '9999-12-31', '9999-12-31 23:59:59', '9999-12-31 23:59:59+00');",
        )
        .await
        .unwrap();
    let mut config = pipeline_config(std::path::Path::new("."));
    config.replication.tables = vec![TableSpec::new("far_future", "stg_far_future")];

    ReplicationStage::new(&config, store_for(&source), store_for(&warehouse))
        .run()
        .await
        .unwrap();

    let columns = "d::text || ' ' || ts::text || ' ' || tz::text";
    let source_values: Vec<String> = source
        .query_table(&TableName::new("public", "far_future"), columns, "id")
        .await
        .unwrap();
    let staged_values: Vec<String> = warehouse
        .query_table(&TableName::new("staging", "stg_far_future"), columns, "id")
        .await
        .unwrap();

    assert_eq!(source_values, staged_values);
    assert!(staged_values[0].starts_with("10000-01-01 12345-06-07 08:09:10"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_replicating_twice_yields_identical_tables() {
    init_test_tracing();

    let source = spawn_database().await;
    let warehouse = spawn_database().await;
    source
        .run_sql(
            "create table public.employee (id bigint, name text);
            insert into public.employee select i, 'e' || i from generate_series(1, 2500) i;",
        )
        .await
        .unwrap();
    let mut config = pipeline_config(std::path::Path::new("."));
    config.replication.tables = vec![TableSpec::new("employee", "stg_dev_employee")];
    let staged = TableName::new("staging", "stg_dev_employee");

    for _ in 0..2 {
        ReplicationStage::new(&config, store_for(&source), store_for(&warehouse))
            .run()
            .await
            .unwrap();

        assert_eq!(warehouse.count_rows(&staged).await.unwrap(), 2500);
    }

    let names: Vec<String> = warehouse
        .query_table(&staged, "name", "id")
        .await
        .unwrap();
    assert_eq!(names.first().map(String::as_str), Some("e1"));
    assert_eq!(names.last().map(String::as_str), Some("e2500"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_source_table_is_a_read_error() {
    init_test_tracing();

    let source = spawn_database().await;
    let warehouse = spawn_database().await;
    let mut config = pipeline_config(std::path::Path::new("."));
    config.replication.tables = vec![TableSpec::new("absent", "stg_absent")];

    let err = ReplicationStage::new(&config, store_for(&source), store_for(&warehouse))
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ReadFailed);
    assert!(err.detail().unwrap().contains("public.absent"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_warehouse_creates_no_staging_table() {
    init_test_tracing();

    let source = spawn_database().await;
    source
        .run_sql("create table public.employee (id bigint); insert into public.employee values (1);")
        .await
        .unwrap();
    let mut config = pipeline_config(std::path::Path::new("."));
    config.replication.tables = vec![TableSpec::new("employee", "stg_dev_employee")];

    let stage = ReplicationStage::new(
        &config,
        store_for(&source),
        PgStore::new(&unreachable_pg_connection_config()),
    );
    let err = stage.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConnectionFailed);
    assert!(stage.source().is_connected());
    assert!(!stage.destination().is_connected());
}
