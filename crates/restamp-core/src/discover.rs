use std::path::Path;

use walkdir::WalkDir;

use crate::errors::{ErrorCategory, ErrorLog, Severity};
use crate::extras;
use crate::folder_classify;
use crate::media::DiscoveredFile;

/// Only recognized image/video types become candidates. Sidecar `.json`
/// files and everything else in the tree are skipped here.
fn is_media(path: &Path) -> bool {
    mime_guess::from_path(path).first().map_or(false, |mime| {
        mime.type_() == mime_guess::mime::IMAGE || mime.type_() == mime_guess::mime::VIDEO
    })
}

/// Walk the input tree and collect candidate media files, each classified
/// into its album grouping. Sorted traversal keeps discovery order (and
/// therefore merge and collision outcomes) stable across runs.
pub fn collect_candidates(
    input_dir: &Path,
    skip_edited_variants: bool,
    errors: &ErrorLog,
) -> Vec<DiscoveredFile> {
    let mut found = Vec::new();

    for entry in WalkDir::new(input_dir).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf);
                errors.record(
                    Severity::Warning,
                    ErrorCategory::FileAccess,
                    path.as_deref(),
                    format!("failed to read directory entry: {}", e),
                );
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_media(path) {
            continue;
        }
        if skip_edited_variants {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            if extras::is_edited_variant(stem) {
                continue;
            }
        }
        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                errors.record(
                    Severity::Warning,
                    ErrorCategory::FileAccess,
                    Some(path),
                    format!("failed to read file metadata: {}", e),
                );
                continue;
            }
        };
        let album = path
            .parent()
            .and_then(|dir| dir.strip_prefix(input_dir).ok())
            .and_then(folder_classify::classify_album);

        found.push(DiscoveredFile {
            path: path.to_path_buf(),
            album,
            size,
        });
    }

    found
}
