use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// How much a recorded entry matters. `Error` entries mark items counted as
/// failures or phase-level aborts; `Info`/`Warning` entries never stop a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// What kind of failure an entry describes. Orthogonal to [`Severity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    FileAccess,
    CorruptedFile,
    MetadataExtraction,
    DiskSpace,
    Processing,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::FileAccess => "file-access",
            ErrorCategory::CorruptedFile => "corrupted-file",
            ErrorCategory::MetadataExtraction => "metadata-extraction",
            ErrorCategory::DiskSpace => "disk-space",
            ErrorCategory::Processing => "processing",
            ErrorCategory::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Map an io error to the closest category.
pub fn categorize_io(err: &io::Error) -> ErrorCategory {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => ErrorCategory::FileAccess,
        io::ErrorKind::StorageFull | io::ErrorKind::QuotaExceeded => ErrorCategory::DiskSpace,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => ErrorCategory::CorruptedFile,
        _ => ErrorCategory::Unknown,
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone)]
pub struct RecordedError {
    pub severity: Severity,
    pub category: ErrorCategory,
    pub file: Option<PathBuf>,
    pub message: String,
}

impl RecordedError {
    fn summary(&self) -> String {
        match &self.file {
            Some(path) => format!("{}: {} ({})", path.display(), self.message, self.category),
            None => format!("{} ({})", self.message, self.category),
        }
    }
}

/// Thread-safe collector for per-item and phase-level diagnostics.
///
/// Workers in the parallel phases record concurrently; the orchestrator drains
/// it once into the final result and the run log.
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Mutex<Vec<RecordedError>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &self,
        severity: Severity,
        category: ErrorCategory,
        file: Option<&Path>,
        message: impl Into<String>,
    ) {
        self.entries.lock().unwrap().push(RecordedError {
            severity,
            category,
            file: file.map(Path::to_path_buf),
            message: message.into(),
        });
    }

    /// Record an io error against a file, categorized by its kind.
    pub fn record_io(&self, severity: Severity, file: &Path, err: &io::Error, context: &str) {
        self.record(
            severity,
            categorize_io(err),
            Some(file),
            format!("{}: {}", context, err),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    pub fn entries(&self) -> Vec<RecordedError> {
        self.entries.lock().unwrap().clone()
    }

    /// Warning-and-below summaries, for `ProcessingResult.warnings`.
    pub fn warning_summaries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.severity != Severity::Error)
            .map(RecordedError::summary)
            .collect()
    }

    /// Error summaries, for `ProcessingResult.errors`.
    pub fn error_summaries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .map(RecordedError::summary)
            .collect()
    }

    /// Write the plain-text run log to the output root. One block per entry:
    /// a `[severity] category path` header line, then the indented message.
    pub fn write_run_log(&self, output_dir: &Path, filename: &str) -> io::Result<()> {
        let entries = self.entries.lock().unwrap();
        if entries.is_empty() {
            return Ok(());
        }
        let file = File::create(output_dir.join(filename))?;
        let mut w = BufWriter::new(file);
        for e in entries.iter() {
            match &e.file {
                Some(path) => writeln!(w, "[{}] {} {}", e.severity, e.category, path.display())?,
                None => writeln!(w, "[{}] {}", e.severity, e.category)?,
            }
            writeln!(w, "    {}", e.message)?;
        }
        w.flush()
    }
}
