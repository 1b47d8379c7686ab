pub const SCHEMA: &str = r#"
-- Dimension: one row per song, written by the song loader
CREATE TABLE IF NOT EXISTS songs (
    song_id TEXT NOT NULL PRIMARY KEY,
    title TEXT NOT NULL,
    artist_id TEXT NOT NULL,  -- no FK: the song row is written before its artist
    year INTEGER,
    duration REAL NOT NULL
);

-- Dimension: one row per artist
CREATE TABLE IF NOT EXISTS artists (
    artist_id TEXT NOT NULL PRIMARY KEY,
    name TEXT NOT NULL,
    location TEXT,
    latitude REAL,
    longitude REAL
);

-- Dimension: calendar breakdown of each distinct play timestamp
CREATE TABLE IF NOT EXISTS time (
    start_time TEXT NOT NULL PRIMARY KEY,
    hour INTEGER NOT NULL,
    day INTEGER NOT NULL,
    week INTEGER NOT NULL,
    month INTEGER NOT NULL,
    year INTEGER NOT NULL,
    weekday INTEGER NOT NULL
);

-- Dimension: listeners; level is overwritten on every load
CREATE TABLE IF NOT EXISTS users (
    user_id BIGINT NOT NULL PRIMARY KEY,  -- not a rowid alias, so a NULL id is rejected
    first_name TEXT,
    last_name TEXT,
    gender TEXT,
    level TEXT NOT NULL
);

-- Fact: one row per playback event
CREATE TABLE IF NOT EXISTS songplays (
    songplay_id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_time TEXT NOT NULL,
    user_id INTEGER NOT NULL,
    level TEXT NOT NULL,
    song_id TEXT,
    artist_id TEXT,
    session_id INTEGER NOT NULL,
    location TEXT,
    user_agent TEXT,
    FOREIGN KEY (start_time) REFERENCES time(start_time),
    FOREIGN KEY (user_id) REFERENCES users(user_id),
    FOREIGN KEY (song_id) REFERENCES songs(song_id),
    FOREIGN KEY (artist_id) REFERENCES artists(artist_id)
);

CREATE INDEX IF NOT EXISTS idx_songs_title ON songs(title);
CREATE INDEX IF NOT EXISTS idx_artists_name ON artists(name);
CREATE INDEX IF NOT EXISTS idx_songplays_user ON songplays(user_id);
"#;

/// Fact table first so foreign keys never block the drop.
pub const DROP_TABLES: &str = r#"
DROP TABLE IF EXISTS songplays;
DROP TABLE IF EXISTS users;
DROP TABLE IF EXISTS songs;
DROP TABLE IF EXISTS artists;
DROP TABLE IF EXISTS time;
"#;
