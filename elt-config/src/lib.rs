//! Configuration for the ELT pipeline.
//!
//! Covers environment detection, hierarchical YAML loading with `APP_` environment overrides,
//! the credentials artifact for the source and warehouse stores, and the declarative table
//! inventories that drive each stage.

mod environment;
mod load;
mod secret;
pub mod shared;

pub use environment::*;
pub use load::*;
pub use secret::*;
