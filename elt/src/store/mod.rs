//! Stores tables are read from and written to.
//!
//! Stages are generic over [`TableSource`] and [`TableDestination`] so that they can run against
//! Postgres in production and against [`memory::MemoryStore`] in tests.

use std::future::Future;

use elt_postgres::schema::TableName;

use crate::error::EltResult;
use crate::types::Dataset;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod postgres;

/// A store whole tables can be read from.
pub trait TableSource {
    /// Reads every row of `table_name`, without any predicate.
    fn read_table(&self, table_name: &TableName)
    -> impl Future<Output = EltResult<Dataset>> + Send;
}

/// A store whole tables can be written to.
pub trait TableDestination {
    /// Replaces `table_name` with `dataset`, creating the table from the dataset's columns.
    ///
    /// Returns the number of rows written.
    fn replace_table(
        &self,
        table_name: &TableName,
        dataset: &Dataset,
    ) -> impl Future<Output = EltResult<u64>> + Send;
}
