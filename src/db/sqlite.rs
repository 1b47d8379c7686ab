//! SQLite backend implementation.

use rusqlite::Connection;
use std::path::Path;

use super::schema::{DROP_TABLES, SCHEMA};
use super::statements::{Statements, SQLITE_STATEMENTS, TABLES};
use super::TableCounts;
use crate::calendar::TimeRow;
use crate::error::DbError;
use crate::records::{Artist, Song, Songplay, User};
use crate::stats::Outcome;

pub struct SqliteDb {
    pub(crate) conn: Connection,
    statements: Statements,
}

impl SqliteDb {
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DbError::Config(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn,
            statements: SQLITE_STATEMENTS,
        })
    }

    pub fn initialize(&self) -> Result<(), DbError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn reset(&self) -> Result<(), DbError> {
        self.conn.execute_batch(DROP_TABLES)?;
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ========================================================================
    // Song data
    // ========================================================================

    pub fn insert_song(&self, song: &Song) -> Result<Outcome, DbError> {
        let rows = self.conn.execute(
            self.statements.song_insert,
            rusqlite::params![
                song.song_id,
                song.title,
                song.artist_id,
                song.year,
                song.duration
            ],
        )?;
        Ok(Outcome::from_rows(rows as u64))
    }

    pub fn insert_artist(&self, artist: &Artist) -> Result<Outcome, DbError> {
        let rows = self.conn.execute(
            self.statements.artist_insert,
            rusqlite::params![
                artist.artist_id,
                artist.name,
                artist.location,
                artist.latitude,
                artist.longitude
            ],
        )?;
        Ok(Outcome::from_rows(rows as u64))
    }

    // ========================================================================
    // Log data
    // ========================================================================

    pub fn insert_time(&self, time: &TimeRow) -> Result<Outcome, DbError> {
        let rows = self.conn.execute(
            self.statements.time_insert,
            rusqlite::params![
                time.start_time,
                time.hour,
                time.day,
                time.week,
                time.month,
                time.year,
                time.weekday
            ],
        )?;
        Ok(Outcome::from_rows(rows as u64))
    }

    pub fn upsert_user(&self, user: &User) -> Result<Outcome, DbError> {
        let rows = self.conn.execute(
            self.statements.user_upsert,
            rusqlite::params![
                user.user_id,
                user.first_name,
                user.last_name,
                user.gender,
                user.level
            ],
        )?;
        Ok(Outcome::from_rows(rows as u64))
    }

    pub fn find_song(
        &self,
        title: &str,
        artist: &str,
        duration: f64,
    ) -> Result<Option<(String, String)>, DbError> {
        let result = self.conn.query_row(
            self.statements.song_select,
            rusqlite::params![title, artist, duration],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        );
        match result {
            Ok(ids) => Ok(Some(ids)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn insert_songplay(&self, songplay: &Songplay) -> Result<Outcome, DbError> {
        let rows = self.conn.execute(
            self.statements.songplay_insert,
            rusqlite::params![
                songplay.start_time,
                songplay.user_id,
                songplay.level,
                songplay.song_id,
                songplay.artist_id,
                songplay.session_id,
                songplay.location,
                songplay.user_agent
            ],
        )?;
        Ok(Outcome::from_rows(rows as u64))
    }

    pub fn table_counts(&self) -> Result<TableCounts, DbError> {
        let mut counts = TableCounts::default();
        for table in TABLES {
            let count: i64 =
                self.conn
                    .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                        row.get(0)
                    })?;
            counts.set(table, count);
        }
        Ok(counts)
    }
}
