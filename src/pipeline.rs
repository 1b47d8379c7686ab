//! Batch driver: run one loader over every file under a root directory.

use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::Database;
use crate::discovery::discover_files;
use crate::error::EtlError;
use crate::loader::{load_log_file, load_song_file, FileLoader};
use crate::stats::BatchReport;

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Return the first file-level error instead of recording it and moving on.
    pub fail_fast: bool,
}

/// Apply `loader` to every `*.<extension>` file under `root`, in order.
pub fn process_data(
    db: &Database,
    root: &Path,
    extension: &str,
    loader: FileLoader,
    options: BatchOptions,
) -> Result<BatchReport, EtlError> {
    let files = discover_files(root, extension)?;
    let total = files.len();
    println!("{} files found in {}", total, root.display());
    info!(total, root = %root.display(), "Starting batch");

    let mut report = BatchReport::new(root, total);

    for (index, path) in files.iter().enumerate() {
        match loader(db, path) {
            Ok(file_report) => report.add_file(&file_report),
            Err(e) if e.is_file_level() && !options.fail_fast => {
                warn!("Skipping {}: {}", path.display(), e);
                report.add_failed_file(path, &e);
            }
            Err(e) => return Err(e),
        }
        println!("{}/{} files processed.", index + 1, total);
    }

    info!(
        processed = report.files_processed,
        failed_files = report.failed_files.len(),
        failed_statements = report.stats.total_failed(),
        "Finished batch for {}",
        root.display()
    );
    Ok(report)
}

/// The full run: song data first so log events can resolve their song and artist ids.
pub fn run(db: &Database, config: &Config) -> Result<Vec<BatchReport>, EtlError> {
    let options = BatchOptions {
        fail_fast: config.load.fail_fast,
    };

    let songs = process_data(
        db,
        &config.data.song_data,
        &config.data.extension,
        load_song_file,
        options,
    )?;
    let logs = process_data(
        db,
        &config.data.log_data,
        &config.data.extension,
        load_log_file,
        options,
    )?;

    Ok(vec![songs, logs])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TableCounts;
    use crate::stats::Operation;
    use std::fs;
    use tempfile::tempdir;

    const SONG: &str = r#"{"num_songs": 1, "artist_id": "ARJIE2Y1187B994AB7", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Line Renaud", "song_id": "SOUPIRU12A6D4FA1E1", "title": "Der Kleine Dompfaff", "duration": 152.92036, "year": 0}"#;

    fn event(page: &str, ts: i64, song: &str, artist: &str, length: f64) -> String {
        format!(
            r#"{{"artist":"{artist}","auth":"Logged In","firstName":"Ryan","gender":"M","itemInSession":0,"lastName":"Smith","length":{length},"level":"free","location":"San Jose-Sunnyvale-Santa Clara, CA","method":"PUT","page":"{page}","registration":1541016707796.0,"sessionId":169,"song":"{song}","status":200,"ts":{ts},"userAgent":"Mozilla/5.0","userId":"26"}}"#
        )
    }

    fn layout(root: &Path) -> Config {
        let mut config = Config::default();
        config.data.song_data = root.join("song_data");
        config.data.log_data = root.join("log_data");
        config
    }

    #[test]
    fn test_end_to_end_run() {
        let dir = tempdir().unwrap();
        let config = layout(dir.path());

        fs::create_dir_all(config.data.song_data.join("A/R/J")).unwrap();
        fs::write(
            config.data.song_data.join("A/R/J/TRARJIE128F4260A7F.json"),
            SONG,
        )
        .unwrap();

        fs::create_dir_all(config.data.log_data.join("2018/11")).unwrap();
        let log = [
            event("NextSong", 1541121934796, "Der Kleine Dompfaff", "Line Renaud", 152.92036),
            event("NextSong", 1541122176796, "Unknown", "Nobody", 200.0),
            event("Login", 1541122200000, "", "", 0.0),
            event("NextSong", 1541125000000, "Der Kleine Dompfaff", "Line Renaud", 152.92036),
        ]
        .join("\n");
        fs::write(config.data.log_data.join("2018/11/2018-11-02-events.json"), log).unwrap();

        let db = Database::open_sqlite(&dir.path().join("sparkify.sqlite")).unwrap();
        db.initialize().unwrap();

        let reports = run(&db, &config).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.is_clean()));
        assert_eq!(reports[1].skipped, 1);
        assert_eq!(reports[1].stats.unmatched, 1);

        let counts = db.table_counts().unwrap();
        assert_eq!(counts.songs, 1);
        assert_eq!(counts.artists, 1);
        assert!(counts.time <= 3);
        assert_eq!(counts.users, 1);
        assert_eq!(counts.songplays, 3);

        let matched: i64 = db
            .sqlite_conn()
            .query_row(
                "SELECT COUNT(*) FROM songplays WHERE song_id = 'SOUPIRU12A6D4FA1E1' AND artist_id = 'ARJIE2Y1187B994AB7'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(matched, 2);
    }

    #[test]
    fn test_bad_file_is_reported_and_batch_continues() {
        let dir = tempdir().unwrap();
        let config = layout(dir.path());
        fs::create_dir_all(&config.data.song_data).unwrap();
        fs::write(config.data.song_data.join("a_broken.json"), "{ nope").unwrap();
        fs::write(config.data.song_data.join("b_good.json"), SONG).unwrap();

        let db = Database::open_sqlite(&dir.path().join("sparkify.sqlite")).unwrap();
        db.initialize().unwrap();

        let report = process_data(
            &db,
            &config.data.song_data,
            "json",
            load_song_file,
            BatchOptions::default(),
        )
        .unwrap();

        assert_eq!(report.files_found, 2);
        assert_eq!(report.files_processed, 1);
        assert_eq!(report.failed_files.len(), 1);
        assert!(report.failed_files[0].0.ends_with("a_broken.json"));
        assert_eq!(report.stats.get(Operation::InsertSong).succeeded, 1);
    }

    #[test]
    fn test_fail_fast_aborts_on_bad_file() {
        let dir = tempdir().unwrap();
        let config = layout(dir.path());
        fs::create_dir_all(&config.data.song_data).unwrap();
        fs::write(config.data.song_data.join("a_broken.json"), "{ nope").unwrap();
        fs::write(config.data.song_data.join("b_good.json"), SONG).unwrap();

        let db = Database::open_sqlite(&dir.path().join("sparkify.sqlite")).unwrap();
        db.initialize().unwrap();

        let result = process_data(
            &db,
            &config.data.song_data,
            "json",
            load_song_file,
            BatchOptions { fail_fast: true },
        );

        assert!(matches!(result, Err(EtlError::Parse { .. })));
        assert_eq!(db.table_counts().unwrap().songs, 0);
    }

    #[test]
    fn test_missing_directories_load_nothing() {
        let dir = tempdir().unwrap();
        let config = layout(dir.path());
        let db = Database::open_sqlite(&dir.path().join("sparkify.sqlite")).unwrap();
        db.initialize().unwrap();

        let reports = run(&db, &config).unwrap();

        assert!(reports.iter().all(|r| r.files_found == 0));
        assert_eq!(db.table_counts().unwrap(), TableCounts::default());
    }
}
