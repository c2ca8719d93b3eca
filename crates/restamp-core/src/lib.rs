pub mod album_json;
pub mod cancel;
pub mod date;
pub mod dedup;
pub mod discover;
pub mod errors;
pub mod extras;
pub mod folder_classify;
pub mod hash;
pub mod media;
pub mod organize;
pub mod writer;

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::date::ResolveOptions;
use crate::errors::{ErrorCategory, ErrorLog, Severity};
use crate::media::MediaItem;

pub use cancel::{CancellationToken, CancelledError};

/// Output layout selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OrganizationMode {
    /// `<output>/<year>/<MM>-<MonthName>/`
    YearMonth,
    /// Everything directly under `<output>/`
    SingleFolder,
}

fn default_recent_window_days() -> i64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub input_directory: PathBuf,
    pub output_directory: PathBuf,
    pub organization_mode: OrganizationMode,
    /// Keep original filenames instead of synthesizing `YYYYMMDD_HHMMSS`
    pub preserve_original_filename: bool,
    /// Skip -edited, -effects and similar derivative images
    #[serde(default)]
    pub skip_edited_variants: bool,
    /// Files modified within this many days are assumed touched by the
    /// export itself and never dated from filesystem attributes
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: i64,
    /// Materialize `albums/<name>/` folders and an albums.json manifest
    #[serde(default)]
    pub album_folders: bool,
    /// Album entries as relative symlinks instead of copies
    #[serde(default)]
    pub album_symlinks: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub success: bool,
    pub total_files: u64,
    pub processed_files: u64,
    pub unique_files: u64,
    pub organized_files: u64,
    #[serde(default)]
    pub duplicates_merged: u64,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Receives `(percentage 0-100, status message)` updates.
pub type ProgressCallback = dyn Fn(u8, &str) + Send + Sync;

/// Control options for process execution (cancellation).
#[derive(Debug, Clone, Default)]
pub struct ProcessControl {
    pub cancel_token: Option<CancellationToken>,
}

impl ProcessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }
}

/// Plain-text error report written to the output root when anything was
/// recorded during a run.
pub const RUN_LOG_FILENAME: &str = "restamp-errors.log";

/// Each phase reports into its own slice of the 0-100 progress scale.
pub const DISCOVERY_SPAN: (u8, u8) = (0, 10);
pub const RESOLVE_SPAN: (u8, u8) = (10, 55);
pub const DEDUP_SPAN: (u8, u8) = (55, 75);
pub const ORGANIZE_SPAN: (u8, u8) = (75, 100);

/// Throttled progress reporter: emits at most every 200ms, except for
/// terminal reports. Tolerates an absent sink.
pub struct ThrottledProgress<'a> {
    inner: Option<&'a ProgressCallback>,
    last_emit: Mutex<Instant>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: Option<&'a ProgressCallback>) -> Self {
        Self {
            inner,
            last_emit: Mutex::new(Instant::now() - std::time::Duration::from_secs(1)),
        }
    }

    /// Report a phase boundary; never throttled.
    pub fn phase(&self, percent: u8, message: &str) {
        if let Some(inner) = self.inner {
            (inner)(percent, message);
        }
    }

    /// Report item progress mapped into a phase's percentage span.
    pub fn report_span(&self, span: (u8, u8), current: u64, total: u64, message: &str) {
        let Some(inner) = self.inner else { return };
        let is_done = current + 1 >= total;
        if !is_done {
            let mut last = self.last_emit.lock().unwrap();
            if last.elapsed().as_millis() < 200 {
                return;
            }
            *last = Instant::now();
        }
        let (lo, hi) = span;
        let percent = if total == 0 {
            hi
        } else {
            lo + ((hi - lo) as u64 * (current + 1).min(total) / total) as u8
        };
        (inner)(percent, message);
    }
}

/// Run the full pipeline with optional progress reporting.
pub fn process(
    config: &ProcessingConfig,
    progress_callback: Option<&ProgressCallback>,
) -> anyhow::Result<ProcessingResult> {
    process_with_control(config, &ProcessControl::default(), progress_callback)
}

/// Run the full pipeline: Discovery -> Resolve -> Deduplicate -> Organize.
///
/// Per-item failures are recorded and skipped; the only early abort besides
/// cancellation is an unusable input directory, which produces a failure
/// result before any further phase starts.
pub fn process_with_control(
    config: &ProcessingConfig,
    control: &ProcessControl,
    progress_callback: Option<&ProgressCallback>,
) -> anyhow::Result<ProcessingResult> {
    let tp = ThrottledProgress::new(progress_callback);
    let log = ErrorLog::new();

    if let Some(token) = &control.cancel_token {
        token.check()?;
    }

    // Phase 1: Discovery
    tp.phase(DISCOVERY_SPAN.0, "Scanning input directory");
    if !config.input_directory.is_dir() {
        let msg = format!(
            "Input directory does not exist: {}",
            config.input_directory.display()
        );
        log.record(
            Severity::Error,
            ErrorCategory::FileAccess,
            Some(&config.input_directory),
            msg.clone(),
        );
        return Ok(failure_result(&log, msg));
    }
    let discovered =
        discover::collect_candidates(&config.input_directory, config.skip_edited_variants, &log);
    let total_files = discovered.len() as u64;
    tp.phase(DISCOVERY_SPAN.1, &format!("Found {} media files", total_files));

    if discovered.is_empty() {
        let msg = "No processable media files found in input directory".to_string();
        log.record(Severity::Error, ErrorCategory::Processing, None, msg.clone());
        return Ok(failure_result(&log, msg));
    }

    if let Some(token) = &control.cancel_token {
        token.check()?;
    }

    // Phase 2: Resolve timestamps, one independent item per worker
    let resolve_opts = ResolveOptions {
        recent_window_days: config.recent_window_days,
    };
    let counter = AtomicU64::new(0);
    let items: Vec<MediaItem> = discovered
        .into_par_iter()
        .map(|file| {
            let date = date::resolve_timestamp(&file.path, file.size, &resolve_opts, &log);
            let current = counter.fetch_add(1, Ordering::Relaxed);
            tp.report_span(RESOLVE_SPAN, current, total_files, "Resolving timestamps");
            MediaItem::new(file, date)
        })
        .collect();
    let processed_files = items.len() as u64;
    let dated = items.iter().filter(|m| m.date.is_some()).count();
    tp.phase(
        RESOLVE_SPAN.1,
        &format!("Dates resolved for {}/{} files", dated, processed_files),
    );

    if let Some(token) = &control.cancel_token {
        token.check()?;
    }

    // Phase 3: Deduplicate
    tp.phase(DEDUP_SPAN.0, "Scanning for duplicates");
    let dedup_outcome = dedup::consolidate(items, &tp, &log);
    let unique_files = dedup_outcome.items.len() as u64;
    let duplicates_merged = dedup_outcome.duplicates_merged;
    tp.phase(
        DEDUP_SPAN.1,
        &format!("{} unique files, {} duplicates merged", unique_files, duplicates_merged),
    );

    if let Some(token) = &control.cancel_token {
        token.check()?;
    }

    // Phase 4: Organize
    tp.phase(ORGANIZE_SPAN.0, "Organizing files");
    fs::create_dir_all(&config.output_directory)?;
    let plans = organize::plan_moves(&dedup_outcome.items, config);
    let move_outcome = match writer::execute_moves(
        &dedup_outcome.items,
        &plans,
        &tp,
        &log,
        control.cancel_token.as_ref(),
    ) {
        Ok(outcome) => outcome,
        Err(cancelled) => {
            let _ = log.write_run_log(&config.output_directory, RUN_LOG_FILENAME);
            return Err(cancelled.into());
        }
    };

    if config.album_folders {
        writer::write_album_folders(
            &dedup_outcome.items,
            &move_outcome.placed,
            &config.output_directory,
            config.album_symlinks,
            &log,
        );
        let has_albums = dedup_outcome.items.iter().any(|m| m.album_names().next().is_some());
        if has_albums {
            let manifest = config.output_directory.join("albums.json");
            if let Err(e) = album_json::write_albums_json(
                &dedup_outcome.items,
                &move_outcome.placed,
                &config.output_directory,
                &manifest,
            ) {
                log.record(
                    Severity::Warning,
                    ErrorCategory::Processing,
                    Some(&manifest),
                    format!("failed to write album manifest: {}", e),
                );
            }
        }
    }

    tp.phase(ORGANIZE_SPAN.1, "Done");

    if !log.is_empty() {
        if let Err(e) = log.write_run_log(&config.output_directory, RUN_LOG_FILENAME) {
            log.record(
                Severity::Warning,
                ErrorCategory::FileAccess,
                Some(&config.output_directory),
                format!("failed to write run log: {}", e),
            );
        }
    }

    Ok(ProcessingResult {
        success: true,
        total_files,
        processed_files,
        unique_files,
        organized_files: move_outcome.organized.len() as u64,
        duplicates_merged,
        warnings: log.warning_summaries(),
        errors: log.error_summaries(),
        error_message: None,
    })
}

fn failure_result(log: &ErrorLog, message: String) -> ProcessingResult {
    ProcessingResult {
        success: false,
        warnings: log.warning_summaries(),
        errors: log.error_summaries(),
        error_message: Some(message),
        ..Default::default()
    }
}
