use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Config file format version this build understands
pub const CONFIG_FORMAT_REQUIRED: &str = "3.0";

/// Default number of catalog numbers grouped into one destination folder
pub const DEFAULT_FOLDER_INCREMENT: u64 = 1000;

/// Default zero-pad width for destination folder numbers
pub const DEFAULT_NUMBER_PAD: usize = 7;

/// Default filename suffix marking a thumbnail derivative
pub const DEFAULT_THUMB_SUFFIX: &str = "_thumb";

/// Default filename suffix marking a medium (web) derivative
pub const DEFAULT_MEDIUM_SUFFIX: &str = "_med";

/// Top-level configuration document, loaded from versioned JSON
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub versions: Versions,
    pub collection: Collection,
    pub files: FilesConfig,

    /// File type tags mapped to their pattern suffix and output subpath.
    /// BTreeMap keeps category processing order deterministic.
    pub file_types: BTreeMap<String, FileTypeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Versions {
    pub config_format: String,
}

/// Collection-level identity and web publishing roots
#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    /// Collection prefix, e.g. "CAT" or "TEX"
    pub prefix: String,

    /// Regex matching the catalog number at the start of a filename.
    /// Must define a named capture group `numerical`.
    pub catalog_number_regex: String,

    /// Filesystem path of the directory served over HTTP/S
    pub web_base: PathBuf,

    /// URL of the directory served over HTTP/S
    pub url_base: String,
}

/// Paths and numeric layout parameters for one sort run
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Directory scanned for files to sort
    pub input_path: PathBuf,

    /// Base directory destination subpaths are joined onto
    pub output_base_path: PathBuf,

    /// Directory the operation log is written into
    pub log_directory_path: PathBuf,

    /// How many catalog numbers share one destination folder
    #[serde(default = "default_folder_increment")]
    pub folder_increment: u64,

    /// Zero-pad width for folder numbers
    #[serde(default = "default_number_pad")]
    pub number_pad: usize,
}

/// One registered file type: its discriminating pattern suffix and where
/// matching files land relative to the output base.
#[derive(Debug, Clone, Deserialize)]
pub struct FileTypeConfig {
    pub file_regex: String,
    pub output_sub_path: PathBuf,
}

fn default_folder_increment() -> u64 {
    DEFAULT_FOLDER_INCREMENT
}

fn default_number_pad() -> usize {
    DEFAULT_NUMBER_PAD
}

impl Config {
    /// Load configuration from a JSON file, rejecting unsupported format
    /// versions before anything touches the filesystem.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        config.check_version()?;
        Ok(config)
    }

    fn check_version(&self) -> Result<()> {
        if self.versions.config_format != CONFIG_FORMAT_REQUIRED {
            return Err(Error::ConfigVersion {
                found: self.versions.config_format.clone(),
                required: CONFIG_FORMAT_REQUIRED.to_string(),
            });
        }
        Ok(())
    }
}

// -- Tests --
