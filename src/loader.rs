//! Per-file loaders.
//!
//! Both loaders share one contract: a file that cannot be read or parsed is
//! an `Err` and nothing from it reaches the database; once parsed, every
//! statement is attempted and its outcome lands in the returned
//! [`FileReport`], whether it succeeded or not.

use std::path::Path;
use tracing::debug;

use crate::calendar::TimeRow;
use crate::db::Database;
use crate::error::EtlError;
use crate::records::{read_song_file, EventReader, LogEvent, Songplay};
use crate::stats::{FileReport, Operation};

/// Signature shared by the loaders so the batch driver can take either.
pub type FileLoader = fn(&Database, &Path) -> Result<FileReport, EtlError>;

/// Load one song file into `songs` and `artists`.
pub fn load_song_file(db: &Database, path: &Path) -> Result<FileReport, EtlError> {
    let record = read_song_file(path)?;
    let mut report = FileReport::new(path);
    report.records = 1;

    let song = record.song();
    report
        .stats
        .record(Operation::InsertSong, path, db.insert_song(&song));

    let artist = record.artist();
    report
        .stats
        .record(Operation::InsertArtist, path, db.insert_artist(&artist));

    debug!(song_id = %song.song_id, artist_id = %artist.artist_id, "Loaded {}", path.display());
    Ok(report)
}

/// Load one activity log into `time`, `users` and `songplays`.
pub fn load_log_file(db: &Database, path: &Path) -> Result<FileReport, EtlError> {
    let mut report = FileReport::new(path);

    let mut plays: Vec<LogEvent> = Vec::new();
    for event in EventReader::open(path)? {
        let event = event?;
        report.records += 1;
        if event.is_play() {
            plays.push(event);
        } else {
            report.skipped += 1;
        }
    }

    let mut timed = Vec::with_capacity(plays.len());
    for event in &plays {
        match TimeRow::from_millis(event.ts) {
            Some(time) => timed.push((event, time)),
            None => report.stats.record_failure(
                Operation::ConvertTimestamp,
                path,
                &format!("ts {} is out of range", event.ts),
            ),
        }
    }

    for (_, time) in &timed {
        report
            .stats
            .record(Operation::InsertTime, path, db.insert_time(time));
    }

    for (event, _) in &timed {
        report
            .stats
            .record(Operation::UpsertUser, path, db.upsert_user(&event.user()));
    }

    for (event, time) in &timed {
        let ids = match (&event.song, &event.artist, event.length) {
            (Some(song), Some(artist), Some(length)) => report
                .stats
                .record_query(Operation::SelectSong, path, db.find_song(song, artist, length))
                .flatten(),
            _ => None,
        };
        if ids.is_none() {
            report.stats.unmatched += 1;
        }

        let songplay = Songplay::new(event, time.start_time, ids);
        report
            .stats
            .record(Operation::InsertSongplay, path, db.insert_songplay(&songplay));
    }

    debug!(
        records = report.records,
        plays = plays.len(),
        "Loaded {}",
        path.display()
    );
    Ok(report)
}
