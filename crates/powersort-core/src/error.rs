use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the powersort library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation log read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration file parse error
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid catalog number or file type pattern
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Derivative generation error
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Archive extraction error
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Config file declares an unsupported format version
    #[error("Wrong config format version: {found} (required: {required})")]
    ConfigVersion { found: String, required: String },

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Folder increment must be a positive integer
    #[error("Folder increment must be greater than zero")]
    InvalidIncrement,

    /// A file matched the catalog pattern but the pattern has no usable
    /// `numerical` capture group. This indicates a misconfigured regex,
    /// not a skippable file.
    #[error("No 'numerical' capture group matched for file: {}", .0.display())]
    MissingNumericCapture(PathBuf),

    /// The `numerical` capture matched but did not parse as an integer
    #[error("Catalog number {value:?} in {} is not a valid integer", path.display())]
    InvalidCatalogNumber { path: PathBuf, value: String },
}
