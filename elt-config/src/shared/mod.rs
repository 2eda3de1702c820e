mod base;
mod connection;
mod credentials;
mod pipeline;
mod sentry;
mod tables;

pub use base::*;
pub use connection::*;
pub use credentials::*;
pub use pipeline::*;
pub use sentry::*;
pub use tables::*;
