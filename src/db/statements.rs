//! Parameterized statements issued by the loaders, one set per SQL dialect.

/// Named statement templates. Each backend holds the set matching its placeholder syntax.
#[derive(Debug, Clone, Copy)]
pub struct Statements {
    pub song_insert: &'static str,
    pub artist_insert: &'static str,
    pub time_insert: &'static str,
    /// Overwrites `level` when the user already exists.
    pub user_upsert: &'static str,
    /// Exact match on title, artist name and duration.
    pub song_select: &'static str,
    pub songplay_insert: &'static str,
}

pub const SQLITE_STATEMENTS: Statements = Statements {
    song_insert: "INSERT INTO songs (song_id, title, artist_id, year, duration)
                  VALUES (?1, ?2, ?3, ?4, ?5)
                  ON CONFLICT (song_id) DO NOTHING",
    artist_insert: "INSERT INTO artists (artist_id, name, location, latitude, longitude)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT (artist_id) DO NOTHING",
    time_insert: "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
                  VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                  ON CONFLICT (start_time) DO NOTHING",
    user_upsert: "INSERT INTO users (user_id, first_name, last_name, gender, level)
                  VALUES (?1, ?2, ?3, ?4, ?5)
                  ON CONFLICT (user_id) DO UPDATE SET level = excluded.level",
    song_select: "SELECT songs.song_id, artists.artist_id
                  FROM songs JOIN artists ON songs.artist_id = artists.artist_id
                  WHERE songs.title = ?1 AND artists.name = ?2 AND songs.duration = ?3
                  LIMIT 1",
    songplay_insert: "INSERT INTO songplays
                      (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
                      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
};

#[cfg(feature = "postgres")]
pub const POSTGRES_STATEMENTS: Statements = Statements {
    song_insert: "INSERT INTO songs (song_id, title, artist_id, year, duration)
                  VALUES ($1, $2, $3, $4, $5)
                  ON CONFLICT (song_id) DO NOTHING",
    artist_insert: "INSERT INTO artists (artist_id, name, location, latitude, longitude)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (artist_id) DO NOTHING",
    time_insert: "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
                  VALUES ($1, $2, $3, $4, $5, $6, $7)
                  ON CONFLICT (start_time) DO NOTHING",
    user_upsert: "INSERT INTO users (user_id, first_name, last_name, gender, level)
                  VALUES ($1, $2, $3, $4, $5)
                  ON CONFLICT (user_id) DO UPDATE SET level = EXCLUDED.level",
    song_select: "SELECT songs.song_id, artists.artist_id
                  FROM songs JOIN artists ON songs.artist_id = artists.artist_id
                  WHERE songs.title = $1 AND artists.name = $2 AND songs.duration = $3
                  LIMIT 1",
    songplay_insert: "INSERT INTO songplays
                      (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
                      VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
};

/// Tables in load order, used for row counts.
pub const TABLES: [&str; 5] = ["songs", "artists", "time", "users", "songplays"];
