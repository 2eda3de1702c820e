//! Helpers shared by unit and integration tests.
//!
//! Covers throwaway databases on the local Postgres instance, ready-made pipeline configurations
//! and csv fixtures.
pub mod database;
pub mod pipeline;

pub use crate::store::memory::MemoryStore;
