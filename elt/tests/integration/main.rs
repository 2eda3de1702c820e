mod load_test;
mod pipeline_test;
mod replication_test;
