//! Archive unpacking for input trees delivered as zip or tar files.
//!
//! Archives are found at the top level of the input root only, extracted
//! next to themselves, and deleted once extraction succeeds. Zip archives
//! are filtered to image payloads (.jpg/.jpeg/.dng); tar archives are
//! unpacked whole. Entries that would escape the extraction directory are
//! skipped with a warning.

use flate2::read::GzDecoder;
use log::{info, warn};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Extensions extracted from zip archives
const ZIP_IMAGE_EXTS: [&str; 3] = [".jpg", ".jpeg", ".dng"];

/// What kind of archive a path looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Zip,
    Tar,
    TarGz,
}

fn archive_kind(path: &Path) -> Option<ArchiveKind> {
    let name = path.file_name()?.to_str()?.to_lowercase();
    if name.ends_with(".zip") {
        Some(ArchiveKind::Zip)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(ArchiveKind::TarGz)
    } else if name.ends_with(".tar") {
        Some(ArchiveKind::Tar)
    } else {
        None
    }
}

/// Scan the top level of `dir` for recognized archive files.
pub fn scan_for_archives<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut archives = Vec::new();
    let mut total_entries = 0usize;
    for entry in fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        total_entries += 1;
        let path = entry.path();
        if path.is_file() && archive_kind(&path).is_some() {
            archives.push(path);
        }
    }
    archives.sort();
    info!(
        "Found {} archives to unpack out of {} entries",
        archives.len(),
        total_entries
    );
    Ok(archives)
}

/// Unpack each archive next to itself, returning the directories the
/// contents were extracted into. Archives are deleted after successful
/// extraction when `delete_archive` is set; an archive that fails to
/// extract is left in place and skipped.
pub fn unpack_archives(archive_paths: &[PathBuf], delete_archive: bool) -> Result<Vec<PathBuf>> {
    let mut unpacked = Vec::new();

    for archive in archive_paths {
        let parent = archive.parent().unwrap_or(Path::new("."));
        let kind = match archive_kind(archive) {
            Some(kind) => kind,
            None => {
                warn!("Not a recognized archive type: {}", archive.display());
                continue;
            }
        };

        let result = match kind {
            ArchiveKind::Zip => unpack_zip(archive, parent),
            ArchiveKind::Tar => unpack_tar(archive, parent, false),
            ArchiveKind::TarGz => unpack_tar(archive, parent, true),
        };

        match result {
            Ok(()) => {
                info!("Unpacked {}", archive.display());
                unpacked.push(parent.to_path_buf());
                if delete_archive {
                    fs::remove_file(archive)?;
                }
            }
            Err(e) => {
                warn!("Failed to unpack {}: {}", archive.display(), e);
            }
        }
    }

    Ok(unpacked)
}

/// Extract only the image payload entries from a zip archive.
fn unpack_zip(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_lowercase();
        if !ZIP_IMAGE_EXTS.iter().any(|ext| name.ends_with(ext)) {
            continue;
        }

        // enclosed_name rejects entries that would escape dest
        let relative = match entry.enclosed_name() {
            Some(relative) => relative,
            None => {
                warn!("Skipping unsafe zip entry: {}", entry.name());
                continue;
            }
        };
        let out_path = dest.join(relative);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out_file = File::create(&out_path)?;
        io::copy(&mut entry, &mut out_file)?;
    }

    Ok(())
}

/// Unpack a tar (optionally gzipped) archive whole. `Archive::unpack`
/// already refuses entries that would land outside `dest`.
fn unpack_tar(archive_path: &Path, dest: &Path, gzipped: bool) -> Result<()> {
    let file = File::open(archive_path)?;
    if gzipped {
        tar::Archive::new(GzDecoder::new(file)).unpack(dest)?;
    } else {
        tar::Archive::new(file).unpack(dest)?;
    }
    Ok(())
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn create_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, data) in entries {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_scan_finds_only_archives_at_the_top_level() {
        let dir = tempdir().unwrap();
        create_zip(&dir.path().join("batch_1.zip"), &[("CAT00001.jpg", b"x")]);
        File::create(dir.path().join("notes.txt")).unwrap();
        let subdir = dir.path().join("nested");
        fs::create_dir(&subdir).unwrap();
        create_zip(&subdir.join("nested.zip"), &[("CAT00002.jpg", b"x")]);

        let archives = scan_for_archives(dir.path()).unwrap();

        assert_eq!(archives.len(), 1);
        assert_eq!(archives[0].file_name().unwrap(), "batch_1.zip");
    }

    #[test]
    fn test_zip_unpack_extracts_only_image_entries() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("batch.zip");
        create_zip(
            &archive,
            &[
                ("batch/CAT00001.jpg", b"jpeg data" as &[u8]),
                ("batch/CAT00001.dng", b"raw data"),
                ("batch/manifest.xml", b"<manifest/>"),
            ],
        );

        let unpacked = unpack_archives(&[archive.clone()], true).unwrap();

        assert_eq!(unpacked.len(), 1);
        assert!(dir.path().join("batch").join("CAT00001.jpg").exists());
        assert!(dir.path().join("batch").join("CAT00001.dng").exists());
        assert!(!dir.path().join("batch").join("manifest.xml").exists());
        // Archive removed after successful extraction
        assert!(!archive.exists());
    }

    #[test]
    fn test_archive_kept_when_deletion_not_requested() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("batch.zip");
        create_zip(&archive, &[("CAT00001.jpg", b"jpeg data")]);

        unpack_archives(&[archive.clone()], false).unwrap();

        assert!(archive.exists());
        assert!(dir.path().join("CAT00001.jpg").exists());
    }

    #[test]
    fn test_corrupt_archive_is_skipped_and_kept() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        fs::write(&archive, b"this is not a zip file").unwrap();

        let unpacked = unpack_archives(&[archive.clone()], true).unwrap();

        assert!(unpacked.is_empty());
        assert!(archive.exists());
    }
}
