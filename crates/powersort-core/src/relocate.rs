//! Moving one matched file into its destination folder.
//!
//! Every code path through `relocate` appends exactly one row to the
//! operation log before returning, whatever the outcome. Per-file failures
//! (name collision without overwrite, permission denied mid-move) are
//! recorded and reported to the caller, never raised, so a single bad file
//! cannot abort the rest of a run.

use log::{info, warn};
use std::fs;
use std::io;
use std::path::Path;

use crate::error::Result;
use crate::oplog::OpLogWriter;
use crate::types::{MoveAction, MoveOutcome, MoveStatus};

/// Overwrite and simulation policy for one run
#[derive(Debug, Clone, Copy, Default)]
pub struct MovePolicy {
    /// Replace files that already exist at the destination
    pub overwrite: bool,

    /// Evaluate outcomes without touching the filesystem
    pub dry_run: bool,
}

/// Move `filename` from `source` into `destination_dir`, creating the
/// destination directory (and parents) as needed, under the given policy.
pub fn relocate(
    source: &Path,
    destination_dir: &Path,
    filename: &str,
    filetype: &str,
    policy: MovePolicy,
    log: &mut OpLogWriter,
) -> Result<MoveOutcome> {
    let destination = destination_dir.join(filename);

    if policy.dry_run {
        return if destination.exists() {
            log.append(
                MoveAction::DryRunMove,
                MoveStatus::Fail,
                Some("would overwrite"),
                filetype,
                source,
                &destination,
            )?;
            Ok(MoveOutcome {
                moved: false,
                status: "DRY-RUN - simulated move".to_string(),
            })
        } else {
            info!("DRY-RUN: Moved: {}", destination.display());
            log.append(
                MoveAction::DryRunMove,
                MoveStatus::Success,
                None,
                filetype,
                source,
                &destination,
            )?;
            Ok(MoveOutcome {
                moved: true,
                status: "DRY-RUN - simulated move".to_string(),
            })
        };
    }

    // Idempotent; no error when the directory already exists. A failure
    // here (e.g. the bucket path is occupied by a regular file) is a
    // per-file outcome like any other move error, not a run abort.
    if let Err(e) = fs::create_dir_all(destination_dir) {
        let details = error_details(&e);
        warn!(
            "Cannot create destination directory {}: {}",
            destination_dir.display(),
            details
        );
        log.append(
            MoveAction::Move,
            MoveStatus::Fail,
            Some(&details),
            filetype,
            source,
            &destination,
        )?;
        return Ok(MoveOutcome {
            moved: false,
            status: "fail".to_string(),
        });
    }

    if destination.exists() && !policy.overwrite {
        info!("Filename exists, cannot move: {}", destination.display());
        log.append(
            MoveAction::Move,
            MoveStatus::Fail,
            Some("filename exists"),
            filetype,
            source,
            &destination,
        )?;
        return Ok(MoveOutcome {
            moved: false,
            status: "fail".to_string(),
        });
    }

    let details = if destination.exists() {
        info!("Overwriting: {}", destination.display());
        Some("duplicate file name - overwritten")
    } else {
        None
    };

    match move_file(source, &destination) {
        Ok(()) => {
            info!("Move: {} success", destination.display());
            log.append(
                MoveAction::Move,
                MoveStatus::Success,
                details,
                filetype,
                source,
                &destination,
            )?;
            Ok(MoveOutcome {
                moved: true,
                status: "success".to_string(),
            })
        }
        Err(e) => {
            let details = error_details(&e);
            warn!("Move failed for {}: {}", source.display(), details);
            log.append(
                MoveAction::Move,
                MoveStatus::Fail,
                Some(&details),
                filetype,
                source,
                &destination,
            )?;
            Ok(MoveOutcome {
                moved: false,
                status: "fail".to_string(),
            })
        }
    }
}

/// Detail string recorded for a failed filesystem operation.
fn error_details(e: &io::Error) -> String {
    if e.kind() == io::ErrorKind::PermissionDenied {
        "PermissionError".to_string()
    } else {
        e.to_string()
    }
}

/// Rename where possible, copy-and-remove across filesystem boundaries.
fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if rename_err.kind() == io::ErrorKind::PermissionDenied {
                return Err(rename_err);
            }
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
    }
}

// -- Tests --
