//! Batch coordination: enumerate a source folder, sort every image, flush the ledger.

use crate::constants::DEFAULT_LEDGER_NAME;
use crate::ensemble::{EnsembleConfig, EnsembleEngine};
use crate::error::{Error, Result};
use crate::labels::CodeScheme;
use crate::output::{Ledger, create_image_progress, finish_progress, inc_progress};
use crate::pipeline::{FolderSet, ProcessResult, process_image};
use crate::stats::ClassCounts;
use indicatif::ProgressBar;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use tracing::{info, warn};

/// Options for one sorting run.
#[derive(Debug, Clone)]
pub struct SortOptions {
    /// Worker threads (1 = sequential).
    pub jobs: usize,
    /// Ledger file name inside the destination root.
    pub ledger_name: String,
    /// Numeric code scheme for ledger rows.
    pub code_scheme: CodeScheme,
    /// Cooperative cancellation flag, checked once per image.
    pub cancel: Option<Arc<AtomicBool>>,
    /// Show a progress bar.
    pub progress: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            ledger_name: DEFAULT_LEDGER_NAME.to_string(),
            code_scheme: CodeScheme::default(),
            cancel: None,
            progress: false,
        }
    }
}

impl SortOptions {
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Outcome of a sorting run that was able to start.
#[derive(Debug, Clone, Serialize)]
pub struct SortReport {
    /// Destination buckets, populated or not.
    pub folders: FolderSet,
    /// Written ledger, `None` when the run was cancelled.
    pub ledger_path: Option<PathBuf>,
    /// Images classified and copied.
    pub processed: usize,
    /// Images skipped after a per-image failure.
    pub skipped: usize,
    /// Whether the run stopped early on request.
    pub cancelled: bool,
    /// Images sorted into each bucket by this run.
    pub counts: ClassCounts,
}

/// List the regular files of a source folder in directory listing order.
///
/// Listing order is whatever the platform returns and is not guaranteed to
/// be stable.
pub fn collect_entries(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let read_error = |source: std::io::Error| Error::SourceDirRead {
        path: source_dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(source_dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let path = entry.path();
        if path.is_file() {
            entries.push(path);
        }
    }

    Ok(entries)
}

/// Sort every image of `source_dir` into class folders under `dest_root`.
pub fn sort_folder(
    source_dir: &Path,
    dest_root: &Path,
    engine: &EnsembleEngine,
    config: &EnsembleConfig,
    options: &SortOptions,
) -> Result<SortReport> {
    let entries = collect_entries(source_dir)?;
    info!(
        "Found {} file(s) in {}",
        entries.len(),
        source_dir.display()
    );
    sort_entries(&entries, dest_root, engine, config, options)
}

/// Sort an already enumerated list of images.
///
/// Destination folders are created before any image is touched. Per-image
/// failures are logged and skipped; anything else aborts the run. The ledger
/// is written once, after the last image, and only if the run was not
/// cancelled.
pub fn sort_entries(
    entries: &[PathBuf],
    dest_root: &Path,
    engine: &EnsembleEngine,
    config: &EnsembleConfig,
    options: &SortOptions,
) -> Result<SortReport> {
    let folders = FolderSet::create(dest_root)?;
    let pb = create_image_progress(entries.len(), options.progress);
    let mut tally = Tally::new(options.code_scheme);

    let cancelled = if options.jobs <= 1 {
        sort_sequential(entries, &folders, engine, config, options, &mut tally, pb.as_ref())?
    } else {
        sort_parallel(entries, &folders, engine, config, options, &mut tally, pb.as_ref())?
    };

    finish_progress(pb, if cancelled { "cancelled" } else { "done" });

    let ledger_path = if cancelled {
        warn!(
            "Cancelled after {} image(s); ledger not written",
            tally.processed + tally.skipped
        );
        None
    } else {
        let path = folders.root().join(&options.ledger_name);
        tally.ledger.flush(&path)?;
        Some(path)
    };

    info!(
        "Sorted {} image(s), skipped {}",
        tally.processed, tally.skipped
    );

    Ok(SortReport {
        folders,
        ledger_path,
        processed: tally.processed,
        skipped: tally.skipped,
        cancelled,
        counts: tally.counts,
    })
}

/// Single-writer aggregation of per-image outcomes.
struct Tally {
    ledger: Ledger,
    counts: ClassCounts,
    processed: usize,
    skipped: usize,
}

impl Tally {
    fn new(scheme: CodeScheme) -> Self {
        Self {
            ledger: Ledger::new(scheme),
            counts: ClassCounts::default(),
            processed: 0,
            skipped: 0,
        }
    }

    /// Record a success or contain a per-image failure. Other errors are returned.
    fn absorb(&mut self, path: &Path, outcome: Result<ProcessResult>) -> Result<()> {
        match outcome {
            Ok(result) => {
                self.counts.increment(result.label);
                self.ledger.record(result.image_name, result.label);
                self.processed += 1;
                Ok(())
            }
            Err(e) if e.is_per_image() => {
                warn!("Skipping {}: {e}", path.display());
                self.skipped += 1;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn progress_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn sort_sequential(
    entries: &[PathBuf],
    folders: &FolderSet,
    engine: &EnsembleEngine,
    config: &EnsembleConfig,
    options: &SortOptions,
    tally: &mut Tally,
    pb: Option<&ProgressBar>,
) -> Result<bool> {
    for path in entries {
        if options.is_cancelled() {
            return Ok(true);
        }
        let outcome = process_image(path, folders, engine, config);
        tally.absorb(path, outcome)?;
        inc_progress(pb, &progress_label(path));
    }
    Ok(false)
}

/// Sized rayon pool; outcomes funnel through a channel to this thread.
///
/// Ledger rows end up in completion order.
fn sort_parallel(
    entries: &[PathBuf],
    folders: &FolderSet,
    engine: &EnsembleEngine,
    config: &EnsembleConfig,
    options: &SortOptions,
    tally: &mut Tally,
    pb: Option<&ProgressBar>,
) -> Result<bool> {
    let threads = options.jobs.min(entries.len()).max(1);
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("cervid-sort-{i}"))
        .build()
        .map_err(|source| Error::WorkerPool { threads, source })?;

    let halt = AtomicBool::new(false);
    let cancelled = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<(&Path, Result<ProcessResult>)>();
    let mut fatal = None;

    pool.in_place_scope(|scope| {
        let (halt, cancelled) = (&halt, &cancelled);
        scope.spawn(move |_| {
            entries.par_iter().for_each_with(tx, |tx, path| {
                if halt.load(Ordering::Relaxed) {
                    return;
                }
                if options.is_cancelled() {
                    cancelled.store(true, Ordering::Relaxed);
                    return;
                }
                let outcome = process_image(path, folders, engine, config);
                if tx.send((path.as_path(), outcome)).is_err() {
                    halt.store(true, Ordering::Relaxed);
                }
            });
        });

        // Every sender is dropped once the parallel loop finishes
        for (path, outcome) in rx {
            if fatal.is_some() {
                continue;
            }
            if let Err(e) = tally.absorb(path, outcome) {
                halt.store(true, Ordering::Relaxed);
                fatal = Some(e);
                continue;
            }
            inc_progress(pb, &progress_label(path));
        }
    });

    match fatal {
        Some(e) => Err(e),
        None => Ok(cancelled.load(Ordering::Relaxed)),
    }
}
