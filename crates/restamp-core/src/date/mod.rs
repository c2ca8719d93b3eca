pub mod exif;
pub mod filename;
pub mod fs_attr;
pub mod sidecar;

use std::path::Path;

use chrono::NaiveDateTime;

use crate::errors::{ErrorCategory, ErrorLog, Severity};

/// Trust ordering of timestamp sources; lower rank wins on merge ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DateAccuracy {
    Sidecar = 0,
    Exif = 1,
    FilenamePattern = 2,
    SidecarRelaxed = 3,
    FileSystem = 4,
}

impl DateAccuracy {
    pub fn rank(self) -> u8 {
        self as u8
    }
}

/// A resolved capture time paired with the trust rank of its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub taken: NaiveDateTime,
    pub accuracy: DateAccuracy,
}

/// Outcome of one extractor over one file. `NotFound` is the expected miss;
/// `Failed` means evidence existed but could not be used, and is logged
/// before the cascade moves on.
#[derive(Debug, Clone)]
pub enum Extraction {
    Found(NaiveDateTime),
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Files modified within this many days of now never get a filesystem
    /// date; the export itself touched them.
    pub recent_window_days: i64,
}

/// Run the extraction cascade for one file, stopping at the first source
/// that yields a timestamp. Extractor failures are logged and treated as
/// misses; only total exhaustion leaves the item undated.
pub fn resolve_timestamp(
    path: &Path,
    size: u64,
    opts: &ResolveOptions,
    log: &ErrorLog,
) -> Option<ResolvedDate> {
    if let Some(taken) = settle(log, path, sidecar::extract(path, sidecar::Mode::Standard)) {
        return Some(ResolvedDate {
            taken,
            accuracy: DateAccuracy::Sidecar,
        });
    }
    if let Some(taken) = settle(log, path, exif::extract(path, size)) {
        return Some(ResolvedDate {
            taken,
            accuracy: DateAccuracy::Exif,
        });
    }
    if let Some(taken) = filename::guess_from_path(path) {
        return Some(ResolvedDate {
            taken,
            accuracy: DateAccuracy::FilenamePattern,
        });
    }
    if let Some(taken) = settle(log, path, sidecar::extract(path, sidecar::Mode::Relaxed)) {
        return Some(ResolvedDate {
            taken,
            accuracy: DateAccuracy::SidecarRelaxed,
        });
    }
    if let Some(taken) = settle(log, path, fs_attr::extract(path, opts.recent_window_days)) {
        return Some(ResolvedDate {
            taken,
            accuracy: DateAccuracy::FileSystem,
        });
    }
    None
}

fn settle(log: &ErrorLog, path: &Path, extraction: Extraction) -> Option<NaiveDateTime> {
    match extraction {
        Extraction::Found(taken) => Some(taken),
        Extraction::NotFound => None,
        Extraction::Failed(reason) => {
            log.record(
                Severity::Warning,
                ErrorCategory::MetadataExtraction,
                Some(path),
                reason,
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn opts() -> ResolveOptions {
        ResolveOptions {
            recent_window_days: 30,
        }
    }

    fn local_naive(epoch: i64) -> NaiveDateTime {
        chrono::DateTime::from_timestamp(epoch, 0)
            .unwrap()
            .with_timezone(&chrono::Local)
            .naive_local()
    }

    #[test]
    fn test_filename_pattern_when_nothing_else_matches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IMG_20230615_143022.jpg");
        fs::write(&path, b"not a real jpeg").unwrap();

        let log = ErrorLog::new();
        let resolved = resolve_timestamp(&path, 15, &opts(), &log).unwrap();
        assert_eq!(resolved.accuracy, DateAccuracy::FilenamePattern);
        assert_eq!(
            resolved.taken,
            chrono::NaiveDate::from_ymd_opt(2023, 6, 15)
                .unwrap()
                .and_hms_opt(14, 30, 22)
                .unwrap()
        );
    }

    #[test]
    fn test_sidecar_short_circuits_filename_pattern() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IMG_20230615_143022.jpg");
        fs::write(&path, b"not a real jpeg").unwrap();
        fs::write(
            dir.path().join("IMG_20230615_143022.jpg.json"),
            br#"{"photoTakenTime": {"timestamp": "1623750000"}}"#,
        )
        .unwrap();

        let log = ErrorLog::new();
        let resolved = resolve_timestamp(&path, 15, &opts(), &log).unwrap();
        assert_eq!(resolved.accuracy, DateAccuracy::Sidecar);
        assert_eq!(resolved.taken, local_naive(1623750000));
    }

    #[test]
    fn test_fresh_file_with_no_evidence_stays_unresolved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("holiday.jpg");
        fs::write(&path, b"opaque").unwrap();

        let log = ErrorLog::new();
        // The temp file was modified just now, so the filesystem extractor
        // must refuse to date it.
        assert!(resolve_timestamp(&path, 6, &opts(), &log).is_none());
    }

    #[test]
    fn test_filesystem_date_when_window_disabled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("holiday.jpg");
        fs::write(&path, b"opaque").unwrap();

        let log = ErrorLog::new();
        let zero_window = ResolveOptions {
            recent_window_days: 0,
        };
        let resolved = resolve_timestamp(&path, 6, &zero_window, &log).unwrap();
        assert_eq!(resolved.accuracy, DateAccuracy::FileSystem);
    }

    #[test]
    fn test_unreadable_sidecar_is_logged_not_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IMG_20230615_143022.jpg");
        fs::write(&path, b"x").unwrap();
        fs::write(dir.path().join("IMG_20230615_143022.jpg.json"), b"{ not json").unwrap();

        let log = ErrorLog::new();
        let resolved = resolve_timestamp(&path, 1, &opts(), &log).unwrap();
        // Cascade falls through to the filename pattern.
        assert_eq!(resolved.accuracy, DateAccuracy::FilenamePattern);
        assert!(!log.is_empty());
    }

    #[test]
    fn test_rank_ordering() {
        assert!(DateAccuracy::Sidecar < DateAccuracy::Exif);
        assert!(DateAccuracy::FilenamePattern < DateAccuracy::SidecarRelaxed);
        assert_eq!(DateAccuracy::FileSystem.rank(), 4);
    }
}
