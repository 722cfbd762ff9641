//! The sort orchestrator: matcher, bucket assigner and relocator driven
//! across every registered file type, producing one operation log per run.

use chrono::Local;
use log::{info, warn};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bucket::bucket_folder_name;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::oplog::{log_file_name, OpLogWriter};
use crate::relocate::{relocate, MovePolicy};
use crate::scan::scan_files;
use crate::types::SortReport;

/// One sort run over an input root.
///
/// For each registered file type the full filename pattern is the shared
/// catalog number regex concatenated with that type's `file_regex` suffix.
/// Categories whose destination subdirectory is not writable are skipped
/// whole, before any file in them is scanned.
pub struct Sorter<'a> {
    config: &'a Config,
    policy: MovePolicy,
}

impl<'a> Sorter<'a> {
    pub fn new(config: &'a Config, policy: MovePolicy) -> Self {
        Self { config, policy }
    }

    /// Sort all matching files under `input_path`, writing one shared
    /// operation log for the whole run.
    pub fn run(&self, input_path: &Path) -> Result<SortReport> {
        let log_path = self.open_log_path(input_path)?;
        let mut log = OpLogWriter::create(&log_path)?;

        let mut sorted = 0u64;
        let mut unmoved = 0u64;

        for (file_type, type_config) in &self.config.file_types {
            let pattern = Regex::new(&format!(
                "{}{}",
                self.config.collection.catalog_number_regex, type_config.file_regex
            ))?;
            let output_path = self
                .config
                .files
                .output_base_path
                .join(&type_config.output_sub_path);

            // Pre-flight, once per category rather than per file
            if !dir_is_writable(&output_path) {
                warn!(
                    "Unable to write to directory, skipping {}: {}",
                    file_type,
                    output_path.display()
                );
                continue;
            }

            let matches = scan_files(input_path, &pattern, file_type)?;
            info!("{}: {} matching files", file_type, matches.len());

            for record in matches {
                let folder_name = bucket_folder_name(
                    record.catalog_key,
                    self.config.files.folder_increment,
                    self.config.files.number_pad,
                    &self.config.collection.prefix,
                )?;
                let destination_dir = output_path.join(folder_name);
                let filename = record
                    .source_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| {
                        Error::Configuration(format!(
                            "matched file has no usable name: {}",
                            record.source_path.display()
                        ))
                    })?;

                let outcome = relocate(
                    &record.source_path,
                    &destination_dir,
                    filename,
                    &record.file_type,
                    self.policy,
                    &mut log,
                )?;
                if outcome.moved {
                    sorted += 1;
                } else {
                    unmoved += 1;
                }
            }
        }

        let log_path = log.finish()?;
        Ok(SortReport {
            sorted,
            unmoved,
            log_path,
        })
    }

    fn open_log_path(&self, input_path: &Path) -> Result<PathBuf> {
        let log_dir = &self.config.files.log_directory_path;
        fs::create_dir_all(log_dir)?;
        let name = log_file_name(
            &self.config.collection.prefix,
            input_path,
            Local::now(),
            self.policy.dry_run,
        );
        Ok(log_dir.join(name))
    }
}

/// Best-effort writability probe for the pre-flight check. A missing
/// directory counts as unwritable; the orchestrator never creates category
/// roots, only bucket folders beneath them.
fn dir_is_writable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_dir() && !metadata.permissions().readonly(),
        Err(_) => false,
    }
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Collection, FileTypeConfig, FilesConfig, Versions};
    use crate::oplog::read_oplog;
    use crate::types::MoveStatus;
    use std::collections::BTreeMap;
    use std::fs::File;
    use std::io::Write;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        dir: TempDir,
        config: Config,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let input = dir.path().join("incoming");
        let output = dir.path().join("sorted");
        fs::create_dir_all(&input).unwrap();
        fs::create_dir_all(output.join("web")).unwrap();
        fs::create_dir_all(output.join("archive")).unwrap();

        let mut file_types = BTreeMap::new();
        file_types.insert(
            "tiff".to_string(),
            FileTypeConfig {
                file_regex: r"\.tif$".to_string(),
                output_sub_path: PathBuf::from("archive"),
            },
        );
        file_types.insert(
            "web_jpg".to_string(),
            FileTypeConfig {
                file_regex: r"\.jpg$".to_string(),
                output_sub_path: PathBuf::from("web"),
            },
        );

        let config = Config {
            versions: Versions {
                config_format: "3.0".to_string(),
            },
            collection: Collection {
                prefix: "CAT".to_string(),
                catalog_number_regex: r"CAT(?P<numerical>\d+)".to_string(),
                web_base: dir.path().join("sorted"),
                url_base: "https://img.example.org/collection/".to_string(),
            },
            files: FilesConfig {
                input_path: input,
                output_base_path: output,
                log_directory_path: dir.path().join("logs"),
                folder_increment: 1000,
                number_pad: 7,
            },
            file_types,
        };
        Fixture { dir, config }
    }

    fn create_input(fx: &Fixture, name: &str) {
        let path = fx.config.files.input_path.join(name);
        let mut file = File::create(path).unwrap();
        file.write_all(b"DUMMY DATA").unwrap();
    }

    #[test]
    fn test_files_land_in_their_bucket_folders() {
        let fx = fixture();
        create_input(&fx, "CAT00042.jpg");
        create_input(&fx, "CAT01999.jpg");
        create_input(&fx, "CAT02000.jpg");
        create_input(&fx, "CAT00042.tif");

        let report = Sorter::new(&fx.config, MovePolicy::default())
            .run(&fx.config.files.input_path)
            .unwrap();

        assert_eq!(report.sorted, 4);
        assert_eq!(report.unmoved, 0);

        let web = fx.config.files.output_base_path.join("web");
        assert!(web.join("CAT0000000").join("CAT00042.jpg").exists());
        assert!(web.join("CAT0001000").join("CAT01999.jpg").exists());
        assert!(web.join("CAT0002000").join("CAT02000.jpg").exists());
        let archive = fx.config.files.output_base_path.join("archive");
        assert!(archive.join("CAT0000000").join("CAT00042.tif").exists());
    }

    #[test]
    fn test_counts_partition_the_matched_files() {
        let fx = fixture();
        create_input(&fx, "CAT00001.jpg");
        create_input(&fx, "CAT00002.jpg");
        // Collision for CAT00002
        let bucket = fx
            .config
            .files
            .output_base_path
            .join("web")
            .join("CAT0000000");
        fs::create_dir_all(&bucket).unwrap();
        File::create(bucket.join("CAT00002.jpg")).unwrap();

        let report = Sorter::new(&fx.config, MovePolicy::default())
            .run(&fx.config.files.input_path)
            .unwrap();

        assert_eq!(report.sorted, 1);
        assert_eq!(report.unmoved, 1);

        let rows = read_oplog(&report.log_path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows.iter().filter(|r| r.result == MoveStatus::Fail).count(),
            1
        );
    }

    #[test]
    fn test_one_log_row_per_matched_file() {
        let fx = fixture();
        for i in 0..5 {
            create_input(&fx, &format!("CAT0000{i}.jpg"));
        }
        create_input(&fx, "unrelated.txt");

        let report = Sorter::new(&fx.config, MovePolicy::default())
            .run(&fx.config.files.input_path)
            .unwrap();
        let rows = read_oplog(&report.log_path).unwrap();

        assert_eq!(rows.len(), 5);
        assert_eq!(report.sorted + report.unmoved, 5);
    }

    #[test]
    fn test_missing_category_destination_is_skipped_whole() {
        let fx = fixture();
        create_input(&fx, "CAT00042.jpg");
        create_input(&fx, "CAT00042.tif");
        fs::remove_dir(fx.config.files.output_base_path.join("archive")).unwrap();

        let report = Sorter::new(&fx.config, MovePolicy::default())
            .run(&fx.config.files.input_path)
            .unwrap();

        // The tiff category contributes to neither counter
        assert_eq!(report.sorted, 1);
        assert_eq!(report.unmoved, 0);
        assert!(fx.config.files.input_path.join("CAT00042.tif").exists());
    }

    #[test]
    fn test_dry_run_produces_a_suffixed_log_and_moves_nothing() {
        let fx = fixture();
        create_input(&fx, "CAT00042.jpg");

        let policy = MovePolicy {
            overwrite: false,
            dry_run: true,
        };
        let report = Sorter::new(&fx.config, policy)
            .run(&fx.config.files.input_path)
            .unwrap();

        assert_eq!(report.sorted, 1);
        assert!(fx.config.files.input_path.join("CAT00042.jpg").exists());
        assert!(report
            .log_path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .ends_with("_DRY-RUN.csv"));

        drop(fx.dir);
    }
}
