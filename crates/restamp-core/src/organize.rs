use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::media::MediaItem;
use crate::{OrganizationMode, ProcessingConfig};

/// Items the resolver could not date land here, in every layout mode.
pub const DATE_UNKNOWN_DIR: &str = "date-unknown";

#[derive(Debug, Clone)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub target: PathBuf,
}

/// Compute a collision-free target path for every canonical item.
///
/// Strictly sequential: the check-then-pick disambiguation assumes a single
/// writer to the output tree. Existing files are scanned once up front, and
/// a planned path is never reused, so re-running over an already-organized
/// output disambiguates instead of overwriting.
pub fn plan_moves(items: &[MediaItem], config: &ProcessingConfig) -> Vec<PlannedMove> {
    let existing = scan_existing_files(&config.output_directory);

    // Counters per base path avoid re-probing already-taken numbers.
    let mut name_counters: HashMap<PathBuf, u32> = HashMap::new();
    let mut used_paths: HashSet<PathBuf> = HashSet::new();
    let mut plans = Vec::with_capacity(items.len());

    for item in items {
        let dir = target_directory(item, config);
        let base_name = target_filename(item, config);
        let base_dest = dir.join(&base_name);

        let counter = name_counters.entry(base_dest.clone()).or_insert(0);
        let dest = if *counter == 0
            && !used_paths.contains(&base_dest)
            && !existing.contains(&base_dest)
        {
            base_dest
        } else {
            let stem = Path::new(&base_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("file");
            let ext = Path::new(&base_name)
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("");

            loop {
                *counter += 1;
                let new_name = if ext.is_empty() {
                    format!("{}({})", stem, counter)
                } else {
                    format!("{}({}).{}", stem, counter, ext)
                };
                let candidate = dir.join(&new_name);
                if !used_paths.contains(&candidate) && !existing.contains(&candidate) {
                    break candidate;
                }
            }
        };

        used_paths.insert(dest.clone());
        plans.push(PlannedMove {
            source: item.primary_file.clone(),
            target: dest,
        });
    }

    plans
}

fn target_directory(item: &MediaItem, config: &ProcessingConfig) -> PathBuf {
    let out = &config.output_directory;
    match &item.date {
        None => out.join(DATE_UNKNOWN_DIR),
        Some(rd) => match config.organization_mode {
            OrganizationMode::YearMonth => out
                .join(rd.taken.format("%Y").to_string())
                .join(format!("{}-{}", rd.taken.format("%m"), rd.taken.format("%B"))),
            OrganizationMode::SingleFolder => out.to_path_buf(),
        },
    }
}

fn target_filename(item: &MediaItem, config: &ProcessingConfig) -> String {
    let original = item
        .primary_file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string();
    if config.preserve_original_filename {
        return original;
    }

    let stem = Path::new(&original)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let ext = Path::new(&original)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    match &item.date {
        Some(rd) => {
            let base = rd.taken.format("%Y%m%d_%H%M%S").to_string();
            if ext.is_empty() {
                base
            } else {
                format!("{}.{}", base, ext)
            }
        }
        None => {
            if ext.is_empty() {
                format!("{}_no_date", stem)
            } else {
                format!("{}_no_date.{}", stem, ext)
            }
        }
    }
}

/// One recursive scan up front; collision checks afterwards are O(1) with
/// no further I/O.
fn scan_existing_files(dir: &Path) -> HashSet<PathBuf> {
    if !dir.exists() {
        return HashSet::new();
    }
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}
