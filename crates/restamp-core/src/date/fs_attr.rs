use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime};

use super::Extraction;

/// Last-resort extractor: the file's status-change time.
///
/// Export and copy operations rewrite filesystem times, so a file whose
/// modification time falls within `recent_window_days` of now is assumed to
/// have been touched by the export itself and yields no timestamp at all;
/// a recent date here would be confidently wrong.
pub fn extract(path: &Path, recent_window_days: i64) -> Extraction {
    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => return Extraction::Failed(format!("failed to read file attributes: {}", e)),
    };
    let modified = match meta.modified() {
        Ok(t) => t,
        Err(e) => return Extraction::Failed(format!("failed to read modification time: {}", e)),
    };

    let modified_dt: DateTime<Local> = modified.into();
    let age = Local::now().signed_duration_since(modified_dt);
    if age < chrono::Duration::days(recent_window_days) {
        return Extraction::NotFound;
    }

    match status_changed_time(&meta) {
        Some(taken) => Extraction::Found(taken),
        None => Extraction::NotFound,
    }
}

#[cfg(unix)]
fn status_changed_time(meta: &fs::Metadata) -> Option<NaiveDateTime> {
    use std::os::unix::fs::MetadataExt;
    let utc = DateTime::from_timestamp(meta.ctime(), 0)?;
    Some(utc.with_timezone(&Local).naive_local())
}

#[cfg(not(unix))]
fn status_changed_time(meta: &fs::Metadata) -> Option<NaiveDateTime> {
    let t = meta.created().or_else(|_| meta.modified()).ok()?;
    let dt: DateTime<Local> = t.into();
    Some(dt.naive_local())
}
