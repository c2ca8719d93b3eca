use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use restamp_core::{
    CancellationToken, OrganizationMode, ProcessControl, ProcessingConfig, ProgressCallback,
};

#[derive(Parser)]
#[command(
    name = "restamp",
    version,
    about = "Restore timestamps, deduplicate and organize exported photo archives"
)]
struct Cli {
    /// Directory containing the extracted photo archive
    input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Output layout
    #[arg(long, value_enum, default_value = "year-month")]
    mode: OrganizationMode,

    /// Keep original filenames instead of synthesizing timestamp names
    #[arg(long)]
    preserve_names: bool,

    /// Skip -edited, -effects and similar derivative images
    #[arg(long)]
    skip_extras: bool,

    /// Materialize albums/<name>/ folders for album groupings
    #[arg(long)]
    albums: bool,

    /// Use relative symlinks instead of copies for album output
    #[arg(long)]
    album_link: bool,

    /// Ignore filesystem dates on files modified within this many days
    #[arg(long, default_value_t = 30)]
    recent_window_days: i64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let t_total = std::time::Instant::now();

    let config = ProcessingConfig {
        input_directory: cli.input,
        output_directory: cli.output,
        organization_mode: cli.mode,
        preserve_original_filename: cli.preserve_names,
        skip_edited_variants: cli.skip_extras,
        recent_window_days: cli.recent_window_days,
        album_folders: cli.albums,
        album_symlinks: cli.album_link,
    };

    let token = CancellationToken::new();
    {
        let token = token.clone();
        ctrlc::set_handler(move || {
            eprintln!("\nCancelling after the current file...");
            token.cancel();
        })?;
    }
    let control = ProcessControl::new().with_cancel_token(token);

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("[{bar:40}] {pos:>3}% {msg}")?.progress_chars("=> "),
    );
    let bar_sink = bar.clone();
    let progress = move |percent: u8, message: &str| {
        bar_sink.set_position(percent as u64);
        bar_sink.set_message(message.to_string());
    };
    let progress: &ProgressCallback = &progress;

    let result = restamp_core::process_with_control(&config, &control, Some(progress))?;
    bar.finish_and_clear();

    if let Some(message) = &result.error_message {
        anyhow::bail!("{}", message);
    }

    eprintln!(
        "Done! {} files found, {} duplicates merged, {} unique, {} organized ({:.2}s)",
        result.total_files,
        result.duplicates_merged,
        result.unique_files,
        result.organized_files,
        t_total.elapsed().as_secs_f64()
    );
    if !result.warnings.is_empty() || !result.errors.is_empty() {
        eprintln!(
            "{} warning(s), {} error(s) recorded; see {} in the output directory",
            result.warnings.len(),
            result.errors.len(),
            restamp_core::RUN_LOG_FILENAME
        );
    }

    Ok(())
}
