//! Per-statement accounting.
//!
//! Every statement a loader issues ends up here as applied, ignored or failed,
//! keyed by the [`Operation`] it belongs to. File reports are merged into a
//! batch report, which the entry point prints at the end of the run.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    InsertSong,
    InsertArtist,
    ConvertTimestamp,
    InsertTime,
    UpsertUser,
    SelectSong,
    InsertSongplay,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::InsertSong => "inserting song data",
            Operation::InsertArtist => "inserting artist data",
            Operation::ConvertTimestamp => "converting timestamp",
            Operation::InsertTime => "inserting time data",
            Operation::UpsertUser => "inserting user data",
            Operation::SelectSong => "selecting song and artist ids",
            Operation::InsertSongplay => "inserting songplay data",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Operation::InsertSong => "songs",
            Operation::InsertArtist => "artists",
            Operation::ConvertTimestamp | Operation::InsertTime => "time",
            Operation::UpsertUser => "users",
            Operation::SelectSong => "songs/artists",
            Operation::InsertSongplay => "songplays",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a successful write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The row already existed and the statement's conflict clause skipped it.
    Ignored,
}

impl Outcome {
    pub fn from_rows(rows: u64) -> Self {
        if rows == 0 {
            Outcome::Ignored
        } else {
            Outcome::Applied
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCount {
    pub succeeded: u64,
    pub ignored: u64,
    pub failed: u64,
}

impl OperationCount {
    fn merge(&mut self, other: &OperationCount) {
        self.succeeded += other.succeeded;
        self.ignored += other.ignored;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationStats {
    counts: BTreeMap<Operation, OperationCount>,
    /// Songplays written without a song/artist match.
    pub unmatched: u64,
}

impl OperationStats {
    pub fn get(&self, operation: Operation) -> OperationCount {
        self.counts.get(&operation).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Operation, OperationCount)> + '_ {
        self.counts.iter().map(|(op, count)| (*op, *count))
    }

    pub fn total_failed(&self) -> u64 {
        self.counts.values().map(|c| c.failed).sum()
    }

    /// Count a write, logging it when it failed.
    pub fn record(&mut self, operation: Operation, path: &Path, result: Result<Outcome, DbError>) {
        match result {
            Ok(outcome) => self.record_success(operation, outcome),
            Err(e) => self.record_failure(operation, path, &e),
        }
    }

    /// Count a query, logging it when it failed. Returns the value on success.
    pub fn record_query<T>(
        &mut self,
        operation: Operation,
        path: &Path,
        result: Result<T, DbError>,
    ) -> Option<T> {
        match result {
            Ok(value) => {
                self.record_success(operation, Outcome::Applied);
                Some(value)
            }
            Err(e) => {
                self.record_failure(operation, path, &e);
                None
            }
        }
    }

    pub fn record_success(&mut self, operation: Operation, outcome: Outcome) {
        let count = self.counts.entry(operation).or_default();
        match outcome {
            Outcome::Applied => count.succeeded += 1,
            Outcome::Ignored => count.ignored += 1,
        }
    }

    pub fn record_failure(&mut self, operation: Operation, path: &Path, error: &dyn fmt::Display) {
        warn!(file = %path.display(), "Error {}: {}", operation, error);
        self.counts.entry(operation).or_default().failed += 1;
    }

    pub fn merge(&mut self, other: &OperationStats) {
        for (operation, count) in &other.counts {
            self.counts.entry(*operation).or_default().merge(count);
        }
        self.unmatched += other.unmatched;
    }
}

/// Result of loading one file.
#[derive(Debug, Clone, Default)]
pub struct FileReport {
    pub path: PathBuf,
    /// Records read from the file.
    pub records: usize,
    /// Records read but not loaded (non-playback events).
    pub skipped: usize,
    pub stats: OperationStats,
}

impl FileReport {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Default::default()
        }
    }
}

/// Result of one batch driver run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub root: PathBuf,
    pub files_found: usize,
    pub files_processed: usize,
    pub records: usize,
    pub skipped: usize,
    pub failed_files: Vec<(PathBuf, String)>,
    pub stats: OperationStats,
}

impl BatchReport {
    pub fn new(root: &Path, files_found: usize) -> Self {
        Self {
            root: root.to_path_buf(),
            files_found,
            ..Default::default()
        }
    }

    pub fn add_file(&mut self, report: &FileReport) {
        self.files_processed += 1;
        self.records += report.records;
        self.skipped += report.skipped;
        self.stats.merge(&report.stats);
    }

    pub fn add_failed_file(&mut self, path: &Path, error: &dyn fmt::Display) {
        self.failed_files.push((path.to_path_buf(), error.to_string()));
    }

    /// True when every file loaded and every statement succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed_files.is_empty() && self.stats.total_failed() == 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary for {}", self.root.display())?;
        writeln!(
            f,
            "  files: {} found, {} processed, {} failed",
            self.files_found,
            self.files_processed,
            self.failed_files.len()
        )?;
        writeln!(
            f,
            "  records: {} read, {} skipped",
            self.records, self.skipped
        )?;
        for (operation, count) in self.stats.iter() {
            writeln!(
                f,
                "  {:<10} {:<32} {} ok, {} ignored, {} failed",
                operation.table(),
                operation.label(),
                count.succeeded,
                count.ignored,
                count.failed
            )?;
        }
        if self.stats.unmatched > 0 {
            writeln!(
                f,
                "  {} songplays without a matching song",
                self.stats.unmatched
            )?;
        }
        for (path, error) in &self.failed_files {
            writeln!(f, "  failed: {}: {}", path.display(), error)?;
        }
        Ok(())
    }
}
