//! Error types for the loader.
//!
//! [`EtlError`] covers everything that stops a file, a batch or the whole run.
//! [`DbError`] covers a single statement and is never fatal on its own: the
//! loaders record it in [`crate::stats::OperationStats`] and move on.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("could not connect to the database: {0}")]
    Connect(#[source] DbError),

    #[error("could not prepare the database schema: {0}")]
    Schema(#[source] DbError),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} contains no records", .path.display())]
    EmptyFile { path: PathBuf },

    #[error("failed to walk {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl EtlError {
    /// True for errors that only concern the file being loaded.
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            EtlError::Io { .. } | EtlError::Parse { .. } | EtlError::EmptyFile { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error("postgres: {0}")]
    Postgres(#[from] postgres::Error),

    #[cfg(feature = "postgres")]
    #[error("connection pool: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("{0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_level_errors() {
        let empty = EtlError::EmptyFile {
            path: PathBuf::from("/data/a.json"),
        };
        assert!(empty.is_file_level());
        assert_eq!(empty.to_string(), "/data/a.json contains no records");

        let connect = EtlError::Connect(DbError::Config("no url".to_string()));
        assert!(!connect.is_file_level());
    }
}
