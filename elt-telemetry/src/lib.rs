//! Logging setup for the pipeline binaries and tests.

pub mod tracing;

pub use crate::tracing::{
    LogFlusher, TracingError, init_test_tracing, init_tracing, init_tracing_with_pipeline,
};
