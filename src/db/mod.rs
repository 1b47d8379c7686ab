mod schema;
pub mod sqlite;
pub mod statements;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "postgres")]
pub mod postgres_schema;

use std::fmt;
use std::path::Path;
use tracing::info;

pub use statements::{Statements, TABLES};

use crate::calendar::TimeRow;
use crate::config::{DatabaseConfig, DatabaseType};
use crate::error::{DbError, EtlError};
use crate::records::{Artist, Song, Songplay, User};
use crate::stats::Outcome;

/// Row count of every table after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub songs: i64,
    pub artists: i64,
    pub time: i64,
    pub users: i64,
    pub songplays: i64,
}

impl TableCounts {
    fn set(&mut self, table: &str, count: i64) {
        match table {
            "songs" => self.songs = count,
            "artists" => self.artists = count,
            "time" => self.time = count,
            "users" => self.users = count,
            "songplays" => self.songplays = count,
            _ => {}
        }
    }
}

impl fmt::Display for TableCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "songs={} artists={} time={} users={} songplays={}",
            self.songs, self.artists, self.time, self.users, self.songplays
        )
    }
}

/// Macro to dispatch a method call to the active backend variant.
macro_rules! dispatch {
    // No arguments beyond self
    ($self:expr, $method:ident()) => {
        match &$self.inner {
            DatabaseInner::Sqlite(db) => db.$method(),
            #[cfg(feature = "postgres")]
            DatabaseInner::Postgres(db) => db.$method(),
        }
    };
    // With arguments
    ($self:expr, $method:ident($($arg:expr),+ $(,)?)) => {
        match &$self.inner {
            DatabaseInner::Sqlite(db) => db.$method($($arg),+),
            #[cfg(feature = "postgres")]
            DatabaseInner::Postgres(db) => db.$method($($arg),+),
        }
    };
}

enum DatabaseInner {
    Sqlite(sqlite::SqliteDb),
    #[cfg(feature = "postgres")]
    Postgres(postgres::PgDb),
}

/// The single database handle shared by every loader.
///
/// Statements run in auto-commit mode: nothing here opens a transaction, so
/// each write is durable as soon as it returns.
pub struct Database {
    inner: DatabaseInner,
}

impl Database {
    /// Open a database connection based on the provided configuration.
    ///
    /// Failing to connect is fatal for the caller; there is no half-open handle.
    pub fn open(config: &DatabaseConfig) -> Result<Self, EtlError> {
        match config.backend {
            DatabaseType::Sqlite => Self::open_sqlite(&config.sqlite_path),
            DatabaseType::Postgresql => Self::open_postgres(config),
        }
    }

    pub fn open_sqlite(path: &Path) -> Result<Self, EtlError> {
        let db = sqlite::SqliteDb::open(path).map_err(EtlError::Connect)?;
        info!("Opened SQLite database at {}", path.display());
        Ok(Self {
            inner: DatabaseInner::Sqlite(db),
        })
    }

    #[cfg(feature = "postgres")]
    fn open_postgres(config: &DatabaseConfig) -> Result<Self, EtlError> {
        let pg = postgres::PgDb::open(&config.postgresql_url, config.pool_size)
            .map_err(EtlError::Connect)?;
        info!("Connected to PostgreSQL");
        Ok(Self {
            inner: DatabaseInner::Postgres(pg),
        })
    }

    #[cfg(not(feature = "postgres"))]
    fn open_postgres(_config: &DatabaseConfig) -> Result<Self, EtlError> {
        Err(EtlError::Connect(DbError::Config(
            "PostgreSQL support not compiled in (enable the `postgres` feature)".to_string(),
        )))
    }

    /// Create any missing tables.
    pub fn initialize(&self) -> Result<(), EtlError> {
        dispatch!(self, initialize()).map_err(EtlError::Schema)
    }

    /// Drop every table and create them again, empty.
    pub fn reset(&self) -> Result<(), EtlError> {
        dispatch!(self, reset()).map_err(EtlError::Schema)
    }

    pub fn insert_song(&self, song: &Song) -> Result<Outcome, DbError> {
        dispatch!(self, insert_song(song))
    }

    pub fn insert_artist(&self, artist: &Artist) -> Result<Outcome, DbError> {
        dispatch!(self, insert_artist(artist))
    }

    pub fn insert_time(&self, time: &TimeRow) -> Result<Outcome, DbError> {
        dispatch!(self, insert_time(time))
    }

    pub fn upsert_user(&self, user: &User) -> Result<Outcome, DbError> {
        dispatch!(self, upsert_user(user))
    }

    /// Resolve (song_id, artist_id) for a played track.
    pub fn find_song(
        &self,
        title: &str,
        artist: &str,
        duration: f64,
    ) -> Result<Option<(String, String)>, DbError> {
        dispatch!(self, find_song(title, artist, duration))
    }

    pub fn insert_songplay(&self, songplay: &Songplay) -> Result<Outcome, DbError> {
        dispatch!(self, insert_songplay(songplay))
    }

    pub fn table_counts(&self) -> Result<TableCounts, DbError> {
        dispatch!(self, table_counts())
    }

    #[cfg(test)]
    pub(crate) fn sqlite_conn(&self) -> &rusqlite::Connection {
        match &self.inner {
            DatabaseInner::Sqlite(db) => &db.conn,
            #[cfg(feature = "postgres")]
            DatabaseInner::Postgres(_) => panic!("not a SQLite database"),
        }
    }
}
