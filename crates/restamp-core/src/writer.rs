use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::cancel::{CancellationToken, CancelledError};
use crate::errors::{ErrorCategory, ErrorLog, Severity};
use crate::media::{MediaItem, OrganizedFile};
use crate::organize::PlannedMove;
use crate::{ThrottledProgress, ORGANIZE_SPAN};

/// Result of the placement phase.
pub struct MoveOutcome {
    pub organized: Vec<OrganizedFile>,
    /// Target path per item, aligned with the input slice; `None` = failed
    pub placed: Vec<Option<PathBuf>>,
    pub failed: u64,
}

/// Physically relocate every planned item.
///
/// Each placement is independent: a failed rename/copy is recorded against
/// that item and the batch continues. Cancellation is checked between items,
/// never mid-copy.
pub fn execute_moves(
    items: &[MediaItem],
    plans: &[PlannedMove],
    progress: &ThrottledProgress,
    errors: &ErrorLog,
    cancel_token: Option<&CancellationToken>,
) -> Result<MoveOutcome, CancelledError> {
    let total = plans.len() as u64;
    let mut organized = Vec::with_capacity(plans.len());
    let mut placed: Vec<Option<PathBuf>> = Vec::with_capacity(plans.len());
    let mut failed = 0u64;
    let mut created_dirs: HashSet<PathBuf> = HashSet::new();

    for (i, (item, plan)) in items.iter().zip(plans.iter()).enumerate() {
        if let Some(token) = cancel_token {
            token.check()?;
        }

        if let Some(parent) = plan.target.parent() {
            if !created_dirs.contains(parent) {
                if let Err(e) = fs::create_dir_all(parent) {
                    errors.record_io(Severity::Error, parent, &e, "failed to create directory");
                    placed.push(None);
                    failed += 1;
                    continue;
                }
                created_dirs.insert(parent.to_path_buf());
            }
        }

        if let Err(e) = place_file(&plan.source, &plan.target) {
            errors.record_io(Severity::Error, &plan.source, &e, "failed to place file");
            placed.push(None);
            failed += 1;
        } else {
            write_back_mtime(item, &plan.target, errors);
            organized.push(OrganizedFile {
                source_file: plan.source.clone(),
                target_file: plan.target.clone(),
                date: item.date,
            });
            placed.push(Some(plan.target.clone()));
        }

        progress.report_span(ORGANIZE_SPAN, i as u64, total, "Placing files");
    }

    Ok(MoveOutcome {
        organized,
        placed,
        failed,
    })
}

/// Atomic rename when source and target share a volume; plain copy
/// otherwise. The copy fallback leaves the source in place.
fn place_file(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(source, target)?;
            Ok(())
        }
    }
}

/// Best effort only; a file that landed but kept a wrong mtime is not worth
/// rolling back.
fn write_back_mtime(item: &MediaItem, target: &Path, errors: &ErrorLog) {
    let Some(rd) = &item.date else { return };
    if let Some(local) = rd.taken.and_local_timezone(chrono::Local).single() {
        let ft = filetime::FileTime::from_unix_time(local.timestamp(), 0);
        if let Err(e) = filetime::set_file_mtime(target, ft) {
            errors.record(
                Severity::Info,
                ErrorCategory::Processing,
                Some(target),
                format!("failed to set modification time: {}", e),
            );
        }
    }
}

/// Materialize album folders under `<output>/albums/<album_name>/`, one
/// entry per (item, album) pair, pointing at the organized targets.
pub fn write_album_folders(
    items: &[MediaItem],
    placed: &[Option<PathBuf>],
    output_dir: &Path,
    use_symlinks: bool,
    errors: &ErrorLog,
) {
    let albums_dir = output_dir.join("albums");
    // Collision tracking is per album folder.
    let mut used_by_album: HashMap<String, HashSet<PathBuf>> = HashMap::new();

    for (item, dest) in items.iter().zip(placed.iter()) {
        let Some(dest) = dest else { continue };
        let Some(filename) = dest.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        for album_name in item.album_names() {
            let album_dir = albums_dir.join(album_name);
            if let Err(e) = fs::create_dir_all(&album_dir) {
                errors.record_io(Severity::Warning, &album_dir, &e, "failed to create album folder");
                continue;
            }

            let used = used_by_album.entry(album_name.to_string()).or_default();

            let mut album_file = album_dir.join(filename);
            if used.contains(&album_file) || album_file.exists() {
                let stem = Path::new(filename)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("file");
                let ext = Path::new(filename)
                    .extension()
                    .and_then(|s| s.to_str())
                    .unwrap_or("");
                let mut counter = 1u32;
                loop {
                    let new_name = if ext.is_empty() {
                        format!("{}({})", stem, counter)
                    } else {
                        format!("{}({}).{}", stem, counter, ext)
                    };
                    album_file = album_dir.join(&new_name);
                    if !used.contains(&album_file) && !album_file.exists() {
                        break;
                    }
                    counter += 1;
                }
            }
            used.insert(album_file.clone());

            let linked = if use_symlinks {
                link_into_album(dest, &album_dir, &album_file)
            } else {
                fs::copy(dest, &album_file).map(|_| ())
            };
            if let Err(e) = linked {
                errors.record_io(Severity::Warning, &album_file, &e, "failed to write album entry");
            }
        }
    }
}

fn link_into_album(dest: &Path, album_dir: &Path, album_file: &Path) -> io::Result<()> {
    let rel = pathdiff::diff_paths(dest, album_dir).unwrap_or_else(|| dest.to_path_buf());
    #[cfg(unix)]
    return std::os::unix::fs::symlink(rel, album_file);
    #[cfg(windows)]
    return std::os::windows::fs::symlink_file(rel, album_file);
    #[cfg(not(any(unix, windows)))]
    {
        let _ = rel;
        fs::copy(dest, album_file).map(|_| ())
    }
}
