use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One file found by the matcher: the extracted catalog key plus the raw
/// named captures from the filename pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// Full path to the matched file
    pub source_path: PathBuf,

    /// File type tag the pattern was registered under (e.g. "web_jpg")
    pub file_type: String,

    /// Parsed value of the `numerical` capture group
    pub catalog_key: u64,

    /// All named capture groups that participated in the match
    pub raw_captures: BTreeMap<String, String>,
}

/// Kind of relocation that was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveAction {
    /// A real filesystem move
    #[serde(rename = "move")]
    Move,

    /// A simulated move, no filesystem mutation
    #[serde(rename = "dry_run_move")]
    DryRunMove,
}

/// Result of a relocation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveStatus {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "fail")]
    Fail,
}

/// One row of the operation log. Field order matches the CSV column order:
/// timestamp, username, action, result, details, filetype, source, destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpLogRow {
    pub timestamp: String,
    pub username: String,
    pub action: MoveAction,
    pub result: MoveStatus,
    pub details: Option<String>,
    pub filetype: String,
    pub source: String,
    pub destination: String,
}

impl OpLogRow {
    pub fn succeeded(&self) -> bool {
        self.result == MoveStatus::Success
    }
}

/// What the relocator reports back to its caller, in addition to the row it
/// has already appended to the operation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Whether the file was moved (or would have been, in a dry run)
    pub moved: bool,

    /// Short status string describing the branch taken
    pub status: String,
}

/// Aggregate counts for one sort run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortReport {
    /// Files successfully relocated (or simulated in a dry run)
    pub sorted: u64,

    /// Files that matched a pattern but were not moved
    pub unmoved: u64,

    /// Path of the operation log written for this run
    pub log_path: PathBuf,
}
