//! PostgreSQL backend implementation.

use postgres::NoTls;
use r2d2::Pool;
use r2d2_postgres::PostgresConnectionManager;

use super::postgres_schema::{POSTGRES_DROP_TABLES, POSTGRES_SCHEMA, TERMINATE_SESSIONS};
use super::statements::{Statements, POSTGRES_STATEMENTS, TABLES};
use super::TableCounts;
use crate::calendar::TimeRow;
use crate::error::DbError;
use crate::records::{Artist, Song, Songplay, User};
use crate::stats::Outcome;

pub struct PgDb {
    pool: Pool<PostgresConnectionManager<NoTls>>,
    statements: Statements,
}

impl PgDb {
    /// Connects eagerly: the pool only builds once its first connection is up.
    pub fn open(url: &str, pool_size: u32) -> Result<Self, DbError> {
        let manager = PostgresConnectionManager::new(url.parse()?, NoTls);
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;
        Ok(Self {
            pool,
            statements: POSTGRES_STATEMENTS,
        })
    }

    pub fn initialize(&self) -> Result<(), DbError> {
        let mut client = self.pool.get()?;
        client.batch_execute(POSTGRES_SCHEMA)?;
        Ok(())
    }

    pub fn reset(&self) -> Result<(), DbError> {
        let mut client = self.pool.get()?;
        client.batch_execute(POSTGRES_DROP_TABLES)?;
        client.batch_execute(POSTGRES_SCHEMA)?;
        Ok(())
    }

    // ========================================================================
    // Song data
    // ========================================================================

    pub fn insert_song(&self, song: &Song) -> Result<Outcome, DbError> {
        let mut client = self.pool.get()?;
        let rows = client.execute(
            self.statements.song_insert,
            &[
                &song.song_id,
                &song.title,
                &song.artist_id,
                &song.year,
                &song.duration,
            ],
        )?;
        Ok(Outcome::from_rows(rows))
    }

    pub fn insert_artist(&self, artist: &Artist) -> Result<Outcome, DbError> {
        let mut client = self.pool.get()?;
        let rows = client.execute(
            self.statements.artist_insert,
            &[
                &artist.artist_id,
                &artist.name,
                &artist.location,
                &artist.latitude,
                &artist.longitude,
            ],
        )?;
        Ok(Outcome::from_rows(rows))
    }

    // ========================================================================
    // Log data
    // ========================================================================

    pub fn insert_time(&self, time: &TimeRow) -> Result<Outcome, DbError> {
        let mut client = self.pool.get()?;
        let rows = client.execute(
            self.statements.time_insert,
            &[
                &time.start_time,
                &time.hour,
                &time.day,
                &time.week,
                &time.month,
                &time.year,
                &time.weekday,
            ],
        )?;
        Ok(Outcome::from_rows(rows))
    }

    pub fn upsert_user(&self, user: &User) -> Result<Outcome, DbError> {
        let mut client = self.pool.get()?;
        let rows = client.execute(
            self.statements.user_upsert,
            &[
                &user.user_id,
                &user.first_name,
                &user.last_name,
                &user.gender,
                &user.level,
            ],
        )?;
        Ok(Outcome::from_rows(rows))
    }

    pub fn find_song(
        &self,
        title: &str,
        artist: &str,
        duration: f64,
    ) -> Result<Option<(String, String)>, DbError> {
        let mut client = self.pool.get()?;
        let row = client.query_opt(self.statements.song_select, &[&title, &artist, &duration])?;
        Ok(row.map(|row| (row.get(0), row.get(1))))
    }

    pub fn insert_songplay(&self, songplay: &Songplay) -> Result<Outcome, DbError> {
        let mut client = self.pool.get()?;
        let rows = client.execute(
            self.statements.songplay_insert,
            &[
                &songplay.start_time,
                &songplay.user_id,
                &songplay.level,
                &songplay.song_id,
                &songplay.artist_id,
                &songplay.session_id,
                &songplay.location,
                &songplay.user_agent,
            ],
        )?;
        Ok(Outcome::from_rows(rows))
    }

    pub fn table_counts(&self) -> Result<TableCounts, DbError> {
        let mut client = self.pool.get()?;
        let mut counts = TableCounts::default();
        for table in TABLES {
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            let row = client.query_one(sql.as_str(), &[])?;
            counts.set(table, row.get(0));
        }
        Ok(counts)
    }
}

/// Forcibly close every other session on `database`.
///
/// Connects through `admin_url`, which should name a different database so
/// the terminating session is not itself a target. Returns how many backends
/// were signalled.
pub fn terminate_other_sessions(admin_url: &str, database: &str) -> Result<u64, DbError> {
    let mut client = postgres::Client::connect(admin_url, NoTls)?;
    let rows = client.query(TERMINATE_SESSIONS, &[&database])?;
    let terminated = rows
        .iter()
        .filter(|row| row.get::<_, Option<bool>>(0).unwrap_or(false))
        .count();
    Ok(terminated as u64)
}
