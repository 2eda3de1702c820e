mod connection;
mod read;
mod write;

pub use connection::{PgStore, connect};
