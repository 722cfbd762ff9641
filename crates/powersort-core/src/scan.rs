//! Filename matching over a directory tree.
//!
//! The matcher walks the full tree under an input root and applies the
//! compiled catalog pattern to each bare filename (never the full path),
//! anchored at the start of the name like `re.match`. Traversal order is
//! sorted by file name at every level so operation logs are reproducible
//! across platforms.

use log::debug;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::MatchRecord;

/// Name of the capture group holding the catalog number
const NUMERICAL_GROUP: &str = "numerical";

/// Scan the tree under `root` for files matching `pattern`.
///
/// A file matches when the pattern matches a prefix of its filename. Named
/// capture groups are kept as raw strings; the `numerical` group is required
/// and parsed as the catalog key. A matching file without a usable
/// `numerical` capture means the pattern itself is misconfigured, which is
/// an error rather than a skip.
pub fn scan_files<P: AsRef<Path>>(
    root: P,
    pattern: &Regex,
    file_type: &str,
) -> Result<Vec<MatchRecord>> {
    let mut matches = Vec::new();

    for entry in WalkDir::new(root.as_ref())
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let file_name = match entry.file_name().to_str() {
            Some(name) => name,
            // Non-UTF-8 names can never match a text pattern
            None => continue,
        };

        let captures = match pattern.captures(file_name) {
            // Leftmost match not at the start of the name means no match
            // can be anchored there either
            Some(c) if c.get(0).map(|m| m.start()) == Some(0) => c,
            _ => continue,
        };

        let mut raw_captures = BTreeMap::new();
        for name in pattern.capture_names().flatten() {
            if let Some(value) = captures.name(name) {
                raw_captures.insert(name.to_string(), value.as_str().to_string());
            }
        }

        let numerical = raw_captures
            .get(NUMERICAL_GROUP)
            .ok_or_else(|| Error::MissingNumericCapture(entry.path().to_path_buf()))?;
        let catalog_key: u64 =
            numerical
                .parse()
                .map_err(|_| Error::InvalidCatalogNumber {
                    path: entry.path().to_path_buf(),
                    value: numerical.clone(),
                })?;

        debug!("Matched {} as {} #{}", entry.path().display(), file_type, catalog_key);
        matches.push(MatchRecord {
            source_path: entry.path().to_path_buf(),
            file_type: file_type.to_string(),
            catalog_key,
            raw_captures,
        });
    }

    Ok(matches)
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    fn create_file(dir: &Path, name: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(b"DUMMY DATA").unwrap();
    }

    fn catalog_pattern() -> Regex {
        Regex::new(r"CAT(?P<numerical>\d+)\.jpg").unwrap()
    }

    #[test]
    fn test_matching_files_are_found_recursively() {
        let dir = tempdir().unwrap();
        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        create_file(dir.path(), "CAT00042.jpg");
        create_file(&subdir, "CAT01999.jpg");
        create_file(dir.path(), "notes.txt");

        let matches = scan_files(dir.path(), &catalog_pattern(), "web_jpg").unwrap();

        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.file_type == "web_jpg"));
        let keys: Vec<u64> = matches.iter().map(|m| m.catalog_key).collect();
        assert!(keys.contains(&42));
        assert!(keys.contains(&1999));
    }

    #[test]
    fn test_match_is_anchored_to_the_filename_start() {
        let dir = tempdir().unwrap();
        create_file(dir.path(), "copy_of_CAT00042.jpg");
        create_file(dir.path(), "CAT00042.jpg");

        let matches = scan_files(dir.path(), &catalog_pattern(), "web_jpg").unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(
            matches[0].source_path.file_name().unwrap(),
            "CAT00042.jpg"
        );
    }

    #[test]
    fn test_prefix_match_does_not_require_full_consumption() {
        let dir = tempdir().unwrap();
        create_file(dir.path(), "CAT00042.jpg.bak");

        let matches = scan_files(dir.path(), &catalog_pattern(), "web_jpg").unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].catalog_key, 42);
    }

    #[test]
    fn test_named_captures_are_collected() {
        let dir = tempdir().unwrap();
        create_file(dir.path(), "CAT00042_med.jpg");

        let pattern = Regex::new(r"CAT(?P<numerical>\d+)(?P<variant>_med)?\.jpg").unwrap();
        let matches = scan_files(dir.path(), &pattern, "web_jpg_med").unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].raw_captures["numerical"], "00042");
        assert_eq!(matches[0].raw_captures["variant"], "_med");
    }

    #[test]
    fn test_missing_numerical_group_is_an_error() {
        let dir = tempdir().unwrap();
        create_file(dir.path(), "CAT00042.jpg");

        // Pattern matches but captures the number under the wrong name
        let pattern = Regex::new(r"CAT(?P<number>\d+)\.jpg").unwrap();
        let err = scan_files(dir.path(), &pattern, "web_jpg").unwrap_err();

        assert!(matches!(err, Error::MissingNumericCapture(_)));
    }

    #[test]
    fn test_traversal_order_is_deterministic() {
        let dir = tempdir().unwrap();
        for name in ["CAT00300.jpg", "CAT00100.jpg", "CAT00200.jpg"] {
            create_file(dir.path(), name);
        }

        let matches = scan_files(dir.path(), &catalog_pattern(), "web_jpg").unwrap();
        let keys: Vec<u64> = matches.iter().map(|m| m.catalog_key).collect();

        assert_eq!(keys, vec![100, 200, 300]);
    }
}
