//! The operation log: an append-only CSV record of every relocation attempt.
//!
//! One log file per sort run, shared across all file type categories. Each
//! row is flushed as it is appended, so a run killed partway through still
//! leaves a valid, readable log. Reconstruction must only ever read a
//! finished log; `OpLogWriter::finish` consumes the writer and hands back
//! the path, so a log path obtained that way cannot still be open for
//! writing.

use chrono::{DateTime, Local};
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{MoveAction, MoveStatus, OpLogRow};

/// CSV column order, written as the header row at open
const COLUMNS: [&str; 8] = [
    "timestamp",
    "username",
    "action",
    "result",
    "details",
    "filetype",
    "source",
    "destination",
];

/// Exclusive write handle for one run's operation log
pub struct OpLogWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
    username: String,
}

impl OpLogWriter {
    /// Create the log file and write the header row.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        // Header is written once here; automatic headers would repeat it
        // on the first serialized row
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        writer.write_record(COLUMNS)?;
        writer.flush()?;

        Ok(Self {
            writer,
            path,
            username: current_username(),
        })
    }

    /// Append one outcome row, stamped with the current time and the
    /// invoking user. Flushes immediately.
    pub fn append(
        &mut self,
        action: MoveAction,
        result: MoveStatus,
        details: Option<&str>,
        filetype: &str,
        source: &Path,
        destination: &Path,
    ) -> Result<OpLogRow> {
        let row = OpLogRow {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            username: self.username.clone(),
            action,
            result,
            details: details.map(str::to_string),
            filetype: filetype.to_string(),
            source: source.display().to_string(),
            destination: destination.display().to_string(),
        };
        self.writer.serialize(&row)?;
        self.writer.flush()?;
        Ok(row)
    }

    /// Path the log is being written to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the log, returning its path. Consuming the writer
    /// guarantees nothing can append after the path is handed onward.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        Ok(self.path)
    }
}

/// Read every row of a finished operation log.
pub fn read_oplog<P: AsRef<Path>>(path: P) -> Result<Vec<OpLogRow>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Build the log filename for a run:
/// `{collection_prefix}_{input root stem}_{timestamp}[_DRY-RUN].csv`.
/// The timestamp keeps repeated runs against the same input from colliding;
/// the suffix keeps simulated runs distinguishable from real ones.
pub fn log_file_name(
    collection_prefix: &str,
    input_path: &Path,
    now: DateTime<Local>,
    dry_run: bool,
) -> String {
    let input_stem = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!(
        "{}_{}_{}",
        collection_prefix,
        input_stem,
        now.format("%Y-%m-%dT%H%M%S")
    );
    if dry_run {
        name.push_str("_DRY-RUN");
    }
    name.push_str(".csv");
    name
}

fn current_username() -> String {
    env::var("USER")
        .or_else(|_| env::var("LOGNAME"))
        .unwrap_or_else(|_| {
            log::error!("Unable to retrieve username");
            String::new()
        })
}

// -- Tests --
