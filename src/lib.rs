//! Cervid - camera-trap deer species sorting CLI tool.
//!
//! This crate classifies images of red deer, musk deer and roe deer with an
//! ensemble of ONNX detection and classification models and sorts them into
//! per-class folders.

#![warn(missing_docs)]
#![allow(clippy::print_stdout)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod ensemble;
pub mod error;
pub mod inference;
pub mod ingest;
pub mod labels;
pub mod output;
pub mod pipeline;
pub mod stats;

use clap::Parser;
use cli::{Cli, Command, SortArgs};
use config::{
    Config, InferenceDevice, config_file_path, default_upload_dir, load_default_config,
    save_default_config, validate_config, validate_model_config,
};
use ensemble::{EnsembleConfig, threshold_from_percent};
use inference::{SessionOptions, load_engine, read_labels};
use labels::ALL;
use output::{EventType, emit_json};
use pipeline::{FolderSet, SortOptions, SortReport, sort_folder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{info, warn};

pub use error::{Error, Result};

/// Main entry point for cervid CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    // First Ctrl+C stops the batch after the images in flight, second one exits
    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || {
        if handler_flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130); // 128 + SIGINT(2)
        }
        warn!("Interrupt received, stopping after current image(s); press Ctrl+C again to abort");
    }) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }

    let config = load_default_config()?;

    let Some(command) = cli.command else {
        cli::help::print_smart_help(&config);
        return Ok(());
    };

    handle_command(command, &config, cli.quiet, cancel)
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is suppressed by default because CUDA fallback is expected in auto mode.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_writer(std::io::stderr).with_env_filter(filter).init();
}

/// Merge CLI overrides over the loaded configuration.
fn apply_sort_overrides(args: &SortArgs, config: &Config) -> Config {
    let mut config = config.clone();
    let defaults = &mut config.defaults;

    if let Some(alpha) = args.alpha {
        defaults.alpha = alpha;
    }
    if let Some(confidence) = args.confidence {
        defaults.confidence = confidence;
    }
    if let Some(threshold) = args
        .threshold
        .or_else(|| args.threshold_percent.map(threshold_from_percent))
    {
        defaults.threshold = threshold;
    }
    if let Some(jobs) = args.jobs {
        defaults.jobs = jobs;
    }
    if let Some(ledger) = &args.ledger {
        config.ledger.file_name.clone_from(ledger);
    }
    if let Some(scheme) = args.code_scheme {
        config.ledger.code_scheme = scheme;
    }
    if args.gpu {
        config.inference.device = InferenceDevice::Gpu;
    } else if args.cpu {
        config.inference.device = InferenceDevice::Cpu;
    }

    config
}

/// JSON payload of a sort run.
#[derive(Debug, Serialize)]
struct SortSummary<'a> {
    source: &'a Path,
    ensemble: EnsembleConfig,
    code_scheme: labels::CodeScheme,
    duration_secs: f64,
    #[serde(flatten)]
    report: &'a SortReport,
}

fn handle_sort(
    args: &SortArgs,
    config: &Config,
    quiet: bool,
    cancel: Arc<AtomicBool>,
) -> Result<SortReport> {
    let config = apply_sort_overrides(args, config);
    validate_config(&config)?;
    let ensemble = EnsembleConfig::from_defaults(&config.defaults)?;

    let engine = load_engine(
        &config,
        SessionOptions {
            device: config.inference.device,
            intra_threads: config.inference.intra_threads,
        },
    )?;

    info!(
        "Sorting {} -> {} (alpha {}, confidence {}, threshold {}, jobs {})",
        args.source.display(),
        args.dest_root.display(),
        ensemble.alpha(),
        ensemble.confidence(),
        ensemble.threshold(),
        config.defaults.jobs
    );

    let options = SortOptions {
        jobs: config.defaults.jobs,
        ledger_name: config.ledger.file_name.clone(),
        code_scheme: config.ledger.code_scheme,
        cancel: Some(cancel),
        progress: !quiet && !args.no_progress && !args.json,
    };

    let start = Instant::now();
    let report = sort_folder(&args.source, &args.dest_root, &engine, &ensemble, &options)?;
    let elapsed = start.elapsed();

    for (label, path) in ALL.iter().zip(report.folders.paths()) {
        info!(
            "  {:<10} {:>5}  {}",
            label.name(),
            report.counts.get(*label),
            path.display()
        );
    }
    if let Some(ledger) = &report.ledger_path {
        info!("Ledger: {}", ledger.display());
    }
    info!(
        "Processed {} image(s), skipped {} in {:.1}s",
        report.processed,
        report.skipped,
        elapsed.as_secs_f64()
    );

    if args.json {
        let event = if report.cancelled {
            EventType::SortCancelled
        } else {
            EventType::SortCompleted
        };
        emit_json(
            event,
            SortSummary {
                source: &args.source,
                ensemble,
                code_scheme: config.ledger.code_scheme,
                duration_secs: elapsed.as_secs_f64(),
                report: &report,
            },
        )?;
    }

    Ok(report)
}

fn handle_command(
    command: Command,
    config: &Config,
    quiet: bool,
    cancel: Arc<AtomicBool>,
) -> Result<()> {
    match command {
        Command::Sort(args) => {
            let report = handle_sort(&args, config, quiet, cancel)?;
            if report.cancelled {
                std::process::exit(130);
            }
            Ok(())
        }
        Command::Ingest { files, into } => {
            let dir = resolve_upload_dir(into)?;
            let report = ingest::ingest_files(&files, &dir)?;
            let ready = ingest::list_uploads(&dir)?;
            println!(
                "Stored {} file(s) in {} ({} image(s) ready to sort)",
                report.total(),
                dir.display(),
                ready.len()
            );
            Ok(())
        }
        Command::Clear { dir } => {
            let dir = resolve_upload_dir(dir)?;
            let removed = ingest::clear_uploads(&dir)?;
            println!("Deleted {removed} file(s) from {}", dir.display());
            Ok(())
        }
        Command::Stats { dest_root, json } => {
            let folders = FolderSet::new(&dest_root);
            let counts = stats::count_folders(&folders)?;
            if json {
                return emit_json(EventType::Stats, counts);
            }
            for (label, path) in ALL.iter().zip(folders.paths()) {
                println!(
                    "{:<10} {:>5}  {}",
                    label.name(),
                    counts.get(*label),
                    path.display()
                );
            }
            println!("{:<10} {:>5}", "total", counts.total());
            Ok(())
        }
        Command::Relabel {
            dest_root,
            file,
            to,
            from,
        } => {
            let moved = stats::relabel(&dest_root, &file, from, to)?;
            println!("{file}: {from} -> {to} ({})", moved.display());
            Ok(())
        }
        Command::Config { action } => handle_config_command(action),
        Command::Models { action } => handle_models_command(action, config),
    }
}

fn resolve_upload_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    dir.map_or_else(default_upload_dir, Ok)
}

fn handle_config_command(action: cli::ConfigAction) -> Result<()> {
    use cli::ConfigAction;

    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let saved_path = save_default_config(&Config::default())?;
                println!("Created configuration file: {}", saved_path.display());
                println!("\nNext steps: add [[detection]] and [[classification]] models to it.");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn handle_models_command(action: cli::ModelsAction, config: &Config) -> Result<()> {
    use cli::ModelsAction;

    let kinds = [
        ("detection", &config.detection),
        ("classification", &config.classification),
    ];

    match action {
        ModelsAction::List => {
            if cli::help::needs_setup(config) {
                cli::help::print_first_time_help();
                return Ok(());
            }
            for (kind, models) in kinds {
                println!("{kind} models:");
                for model in models {
                    println!("  {} ({})", model.name, model.path.display());
                }
            }
            Ok(())
        }
        ModelsAction::Check => {
            for (kind, models) in kinds {
                if models.is_empty() {
                    return Err(Error::NoModels { kind });
                }
                for model in models {
                    validate_model_config(model)?;
                    let labels = read_labels(&model.labels)?;
                    inference::check_labels(kind, &model.name, &labels)?;
                    println!("  {kind}/{}: OK", model.name);
                }
            }
            Ok(())
        }
    }
}
