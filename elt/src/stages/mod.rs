//! The data movement stages of the pipeline.
//!
//! Each stage walks its table inventory strictly in order and stops at the first failure. Tables
//! written before the failure stay written.

use std::future::Future;

use crate::error::EltResult;
use crate::types::{StageKind, StageReport};

mod load;
mod replication;

pub use load::CsvLoadStage;
pub use replication::ReplicationStage;

/// A unit of work the pipeline runs.
pub trait Stage {
    fn kind(&self) -> StageKind;

    /// Runs the stage to completion and reports what was written.
    fn run(&self) -> impl Future<Output = EltResult<StageReport>> + Send;
}
