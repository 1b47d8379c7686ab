//! Batch loader for the Sparkify song and activity datasets.
//!
//! Song files populate the `songs` and `artists` dimensions; activity logs
//! populate `time`, `users` and the `songplays` fact table. See
//! [`pipeline::run`] for the order of operations.

pub mod calendar;
pub mod config;
pub mod db;
pub mod discovery;
pub mod error;
pub mod loader;
pub mod logging;
pub mod pipeline;
pub mod records;
pub mod stats;

pub use config::Config;
pub use db::Database;
pub use error::{DbError, EtlError};
