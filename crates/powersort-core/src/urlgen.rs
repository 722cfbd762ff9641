//! URL reconstruction from a finished operation log.
//!
//! Replays the log of a completed run, regroups the successfully relocated
//! web images by catalog number, classifies each row as large, medium or
//! thumbnail by its filename suffix, and derives one public URL per slot by
//! rebasing the destination path from the web root onto the base URL. The
//! result feeds a CSV export suitable for URL-mapping imports.

use log::warn;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{Config, DEFAULT_MEDIUM_SUFFIX, DEFAULT_THUMB_SUFFIX};
use crate::error::Result;
use crate::oplog::read_oplog;

/// File type tags whose rows get URLs, covering current and older log
/// formats
pub const WEB_FILE_TYPES: [&str; 5] =
    ["web", "web_derivs", "web_jpg_med", "web_jpg_thumb", "web_jpg"];

/// Parameters for one reconstruction pass
#[derive(Debug, Clone)]
pub struct UrlConfig {
    /// File type tags eligible for URL generation
    pub web_file_types: Vec<String>,

    /// Stem suffix marking a thumbnail
    pub thumb_suffix: String,

    /// Stem suffix marking a medium (web-sized) image
    pub medium_suffix: String,

    /// Pattern the destination stem must start with; match group 0 is the
    /// catalog number
    pub catalog_number_pattern: Regex,

    /// Filesystem path of the directory served over HTTP/S
    pub web_base: PathBuf,

    /// URL of the directory served over HTTP/S
    pub url_base: String,
}

impl UrlConfig {
    /// Build reconstruction parameters from a loaded config, with the
    /// default `_med`/`_thumb` variant suffixes.
    pub fn from_config(config: &Config) -> Result<Self> {
        let pattern = Regex::new(&format!(r"({}\d+)", regex::escape(&config.collection.prefix)))?;
        Ok(Self {
            web_file_types: WEB_FILE_TYPES.iter().map(|s| s.to_string()).collect(),
            thumb_suffix: DEFAULT_THUMB_SUFFIX.to_string(),
            medium_suffix: DEFAULT_MEDIUM_SUFFIX.to_string(),
            catalog_number_pattern: pattern,
            web_base: config.collection.web_base.clone(),
            url_base: config.collection.url_base.clone(),
        })
    }
}

/// URLs recovered for one catalog number. Slots are filled independently as
/// their rows are replayed; any slot may stay empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogUrlRecord {
    pub catalog_number: String,
    pub large: Option<String>,
    pub web: Option<String>,
    pub thumbnail: Option<String>,
}

impl CatalogUrlRecord {
    fn new(catalog_number: &str) -> Self {
        Self {
            catalog_number: catalog_number.to_string(),
            large: None,
            web: None,
            thumbnail: None,
        }
    }
}

/// All records recovered from one log, in first-seen order, plus any
/// data-quality warnings raised while filling them.
#[derive(Debug, Clone, Default)]
pub struct UrlSet {
    pub records: Vec<CatalogUrlRecord>,

    /// One entry per slot that was filled more than once (duplicate rows
    /// for the same size variant; last write wins)
    pub warnings: Vec<String>,
}

impl UrlSet {
    fn record_mut(
        &mut self,
        index: &mut HashMap<String, usize>,
        catalog_number: &str,
    ) -> &mut CatalogUrlRecord {
        let i = *index.entry(catalog_number.to_string()).or_insert_with(|| {
            self.records.push(CatalogUrlRecord::new(catalog_number));
            self.records.len() - 1
        });
        &mut self.records[i]
    }
}

/// Replay a finished operation log and rebuild the URL record set.
///
/// Only rows with `result == success` and an eligible file type are
/// considered. Rows whose destination stem does not match the catalog
/// number pattern are warn-logged and skipped; they never abort the pass.
pub fn reconstruct<P: AsRef<Path>>(log_path: P, url_config: &UrlConfig) -> Result<UrlSet> {
    let rows = read_oplog(log_path)?;
    let mut set = UrlSet::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        if !row.succeeded() || !url_config.web_file_types.contains(&row.filetype) {
            continue;
        }

        let destination = PathBuf::from(&row.destination);
        let stem = match destination.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => {
                warn!("Destination has no usable file name: {}", row.destination);
                continue;
            }
        };

        let catalog_number = match url_config
            .catalog_number_pattern
            .captures(&stem)
            .filter(|c| c.get(0).map(|m| m.start()) == Some(0))
        {
            Some(captures) => captures.get(0).map(|m| m.as_str().to_string()).unwrap_or_default(),
            None => {
                warn!(
                    "No match for file name {} with pattern {}",
                    stem,
                    url_config.catalog_number_pattern.as_str()
                );
                continue;
            }
        };

        let url = match generate_url(&url_config.web_base, &destination, &url_config.url_base) {
            Some(url) => url,
            None => {
                warn!(
                    "Destination {} is outside the web base {}",
                    row.destination,
                    url_config.web_base.display()
                );
                continue;
            }
        };

        let record = set.record_mut(&mut index, &catalog_number);
        let (slot_name, slot) = if stem.ends_with(&url_config.thumb_suffix) {
            ("thumbnail", &mut record.thumbnail)
        } else if stem.ends_with(&url_config.medium_suffix) {
            ("web", &mut record.web)
        } else {
            ("large", &mut record.large)
        };

        if let Some(previous) = slot.replace(url) {
            set.warnings.push(format!(
                "{catalog_number}: {slot_name} slot filled twice (was {previous}, now {})",
                row.destination
            ));
        }
    }

    for warning in &set.warnings {
        warn!("{warning}");
    }
    Ok(set)
}

/// Join the destination path, relative to the web base, onto the base URL.
/// Returns None when the destination does not live under the web base.
fn generate_url(web_base: &Path, file_path: &Path, url_base: &str) -> Option<String> {
    let relative = file_path.strip_prefix(web_base).ok()?;
    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Some(format!("{}/{}", url_base.trim_end_matches('/'), relative))
}

/// Write the URL export CSV: one row per catalog number, columns
/// `catalog_number, large, web, thumbnail`.
pub fn write_urls_csv<P: AsRef<Path>>(set: &UrlSet, path: P) -> Result<()> {
    // Explicit header so an empty record set still writes a valid export;
    // automatic headers are off so it is never repeated before the rows
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;
    writer.write_record(["catalog_number", "large", "web", "thumbnail"])?;
    for record in &set.records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Conventional name for the export written next to its source log:
/// `{log stem}_urls.csv`.
pub fn urls_csv_path(log_path: &Path) -> PathBuf {
    let stem = log_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    log_path.with_file_name(format!("{stem}_urls.csv"))
}

// -- Tests --
