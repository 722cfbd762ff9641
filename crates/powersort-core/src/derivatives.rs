//! Derivative generation: resized web copies of original images.
//!
//! For each original JPEG a medium and a thumbnail sibling are produced
//! when missing, named by appending the variant suffix to the stem
//! (`CAT00042.jpg` -> `CAT00042_med.jpg`). Thin wrapper over the image
//! crate; per-file errors are logged and skipped so one unreadable image
//! does not stop a batch.

use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::config::{DEFAULT_MEDIUM_SUFFIX, DEFAULT_THUMB_SUFFIX};
use crate::error::Result;

/// Maximum edge length of a medium derivative, pixels
pub const MEDIUM_MAX_EDGE: u32 = 600;

/// Maximum edge length of a thumbnail derivative, pixels
pub const THUMB_MAX_EDGE: u32 = 200;

/// Sizing parameters for the two web variants
#[derive(Debug, Clone)]
pub struct DerivativeSpec {
    pub medium_suffix: String,
    pub thumb_suffix: String,
    pub medium_max_edge: u32,
    pub thumb_max_edge: u32,
}

impl Default for DerivativeSpec {
    fn default() -> Self {
        Self {
            medium_suffix: DEFAULT_MEDIUM_SUFFIX.to_string(),
            thumb_suffix: DEFAULT_THUMB_SUFFIX.to_string(),
            medium_max_edge: MEDIUM_MAX_EDGE,
            thumb_max_edge: THUMB_MAX_EDGE,
        }
    }
}

/// Whether a path looks like an original jpeg: a .jpg/.jpeg extension and a
/// stem not already carrying a variant suffix.
pub fn is_original_jpeg(path: &Path, spec: &DerivativeSpec) -> bool {
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_lowercase().as_str(), "jpg" | "jpeg"))
        .unwrap_or(false);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    is_jpeg && !stem.ends_with(&spec.medium_suffix) && !stem.ends_with(&spec.thumb_suffix)
}

/// Generate any missing derivatives for one original, returning the paths
/// that were created.
pub fn generate_derivatives(original: &Path, spec: &DerivativeSpec) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    let targets = [
        (variant_path(original, &spec.medium_suffix), spec.medium_max_edge),
        (variant_path(original, &spec.thumb_suffix), spec.thumb_max_edge),
    ];

    if targets.iter().all(|(path, _)| path.exists()) {
        return Ok(created);
    }

    let image = image::open(original)?;
    for (path, max_edge) in targets {
        if path.exists() {
            continue;
        }
        let resized = image.thumbnail(max_edge, max_edge);
        resized.save(&path)?;
        info!("Created derivative {}", path.display());
        created.push(path);
    }
    Ok(created)
}

/// Generate missing derivatives for every original jpeg in `originals`.
/// Unreadable images are skipped with a warning.
pub fn generate_missing(originals: &[PathBuf], spec: &DerivativeSpec) -> Vec<PathBuf> {
    let mut created = Vec::new();
    for original in originals {
        match generate_derivatives(original, spec) {
            Ok(paths) => created.extend(paths),
            Err(e) => warn!("Skipping derivatives for {}: {}", original.display(), e),
        }
    }
    created
}

fn variant_path(original: &Path, suffix: &str) -> PathBuf {
    let stem = original.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let ext = original.extension().and_then(|e| e.to_str()).unwrap_or("jpg");
    original.with_file_name(format!("{stem}{suffix}.{ext}"))
}

// -- Tests --
