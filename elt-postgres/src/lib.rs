//! Postgres naming, type and time helpers shared by the pipeline crates.
//!
//! The `test-utils` feature adds [`tokio::test_utils`] for creating throwaway databases in tests.

pub mod schema;
pub mod time;
#[cfg(feature = "test-utils")]
pub mod tokio;
pub mod types;
