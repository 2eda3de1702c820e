//! Moves tabular data through a small ELT pipeline.
//!
//! Csv files are loaded into a source Postgres store, the resulting tables are replicated in
//! full into the staging schema of a warehouse, and an external transformation is triggered once
//! replication completes. Every table is written with replace semantics, so re-running any stage
//! is safe.

pub mod conversions;
pub mod error;
pub mod flatfile;
mod macros;
pub mod pipeline;
pub mod stages;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transform;
pub mod types;
