//! End-to-end driver: optional archive unpacking and derivative
//! generation, then sort, then URL export next to the operation log.
//! Mirrors running the sorter and the URL reconstructor by hand, either
//! once over the input root or once per first-level subfolder in subset
//! mode.

use log::{info, warn};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::derivatives::{generate_missing, is_original_jpeg, DerivativeSpec};
use crate::error::Result;
use crate::relocate::MovePolicy;
use crate::sorter::Sorter;
use crate::types::SortReport;
use crate::unpack::{scan_for_archives, unpack_archives};
use crate::urlgen::{reconstruct, urls_csv_path, write_urls_csv, UrlConfig};

/// Switches for one pipeline invocation
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Simulate the sort without moving files or creating directories
    pub dry_run: bool,

    /// Overwrite identically named destination files (already confirmed
    /// by the caller)
    pub overwrite: bool,

    /// Run once per first-level input subfolder containing jpegs
    pub subset: bool,

    /// Unpack archives found at the top of the input root first
    pub unpack: bool,

    /// Create missing _med/_thumb derivatives before sorting
    pub generate_derivatives: bool,

    /// Input root override; defaults to the configured input path
    pub input_path: Option<PathBuf>,
}

/// One sort run plus the URL export derived from its log
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub sort: SortReport,
    pub urls_path: PathBuf,
}

/// Run the whole pipeline and return one report per sort run (one in
/// normal mode, one per subfolder in subset mode).
pub fn run_pipeline(config: &Config, options: &RunOptions) -> Result<Vec<PipelineReport>> {
    let input_path = options
        .input_path
        .clone()
        .unwrap_or_else(|| config.files.input_path.clone());

    if options.unpack {
        if options.dry_run {
            info!("DRY-RUN: skipping archive unpacking");
        } else {
            let archives = scan_for_archives(&input_path)?;
            if !archives.is_empty() {
                let unpacked = unpack_archives(&archives, true)?;
                info!("Unpacked archives into {} directories", unpacked.len());
            }
        }
    }

    if options.generate_derivatives {
        if options.dry_run {
            info!("DRY-RUN: skipping derivative generation");
        } else {
            let spec = DerivativeSpec::default();
            let originals = find_originals(&input_path, &spec);
            let created = generate_missing(&originals, &spec);
            info!(
                "Created {} derivatives for {} originals",
                created.len(),
                originals.len()
            );
        }
    }

    let policy = MovePolicy {
        overwrite: options.overwrite,
        dry_run: options.dry_run,
    };
    let sorter = Sorter::new(config, policy);

    let mut reports = Vec::new();
    if options.subset {
        let parents = subset_parents(&input_path)?;
        info!("Subsetting on {} subfolders", parents.len());
        for parent in parents {
            reports.push(sort_and_export(&sorter, config, &parent)?);
        }
    } else {
        reports.push(sort_and_export(&sorter, config, &input_path)?);
    }
    Ok(reports)
}

fn sort_and_export(sorter: &Sorter, config: &Config, input_path: &Path) -> Result<PipelineReport> {
    let sort = sorter.run(input_path)?;
    let url_config = UrlConfig::from_config(config)?;
    let url_set = reconstruct(&sort.log_path, &url_config)?;
    for warning in &url_set.warnings {
        warn!("URL data quality: {warning}");
    }
    let urls_path = urls_csv_path(&sort.log_path);
    write_urls_csv(&url_set, &urls_path)?;
    info!("Wrote {} URL records to {}", url_set.records.len(), urls_path.display());
    Ok(PipelineReport { sort, urls_path })
}

/// Original jpegs anywhere under the input root.
fn find_originals(input_path: &Path, spec: &DerivativeSpec) -> Vec<PathBuf> {
    WalkDir::new(input_path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| is_original_jpeg(p, spec))
        .collect()
}

/// First-level subdirectories of the input root that directly contain
/// jpeg files.
fn subset_parents(input_path: &Path) -> Result<Vec<PathBuf>> {
    let mut parents = BTreeSet::new();
    for entry in fs::read_dir(input_path)? {
        let dir = entry?.path();
        if !dir.is_dir() {
            continue;
        }
        let has_jpegs = fs::read_dir(&dir)?.filter_map(|e| e.ok()).any(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg"))
                .unwrap_or(false)
        });
        if has_jpegs {
            parents.insert(dir);
        }
    }
    Ok(parents.into_iter().collect())
}

// -- Tests --
