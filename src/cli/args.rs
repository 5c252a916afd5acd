//! CLI argument definitions.

use crate::cli::validators::{parse_jobs, parse_threshold, parse_unit};
use crate::labels::{ClassLabel, CodeScheme};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Sort camera-trap images of deer species with an ONNX model ensemble.
#[derive(Debug, Parser)]
#[command(name = "cervid")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: trace+ORT debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify every image of a folder and copy it into a class folder.
    Sort(SortArgs),
    /// Add images or ZIP archives to the upload folder.
    Ingest {
        /// Image (png, jpg, jpeg, gif) or ZIP files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Upload folder (default: platform data dir).
        #[arg(long, env = "CERVID_UPLOAD_DIR")]
        into: Option<PathBuf>,
    },
    /// Delete every file in the upload folder.
    Clear {
        /// Upload folder (default: platform data dir).
        #[arg(env = "CERVID_UPLOAD_DIR")]
        dir: Option<PathBuf>,
    },
    /// Count images in each class folder.
    Stats {
        /// Destination root of a previous sort.
        dest_root: PathBuf,
        /// Print counts as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Move a sorted image to another class folder.
    Relabel {
        /// Destination root of a previous sort.
        dest_root: PathBuf,
        /// File name of the image.
        file: String,
        /// Class the image belongs to.
        #[arg(long)]
        to: ClassLabel,
        /// Class folder the image is currently in.
        #[arg(long, default_value = "uncertain")]
        from: ClassLabel,
    },
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage models.
    Models {
        /// Models action to perform.
        #[command(subcommand)]
        action: ModelsAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Models subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ModelsAction {
    /// List configured models.
    List,
    /// Verify model and labels files exist and labels match the trained species.
    Check,
}

/// Arguments for the sort command.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct SortArgs {
    /// Folder of images to sort.
    pub source: PathBuf,

    /// Destination root for the class folders and the ledger.
    pub dest_root: PathBuf,

    /// Weight of detection-derived probabilities (0.0-1.0).
    #[arg(long, value_parser = parse_unit, env = "CERVID_ALPHA")]
    pub alpha: Option<f32>,

    /// Minimum per-detection confidence (0.0-1.0).
    #[arg(short = 'c', long, value_parser = parse_unit, env = "CERVID_CONFIDENCE")]
    pub confidence: Option<f32>,

    /// Minimum fused probability for a species decision (above 1.0 forces uncertain).
    #[arg(
        short = 't',
        long,
        value_parser = parse_threshold,
        env = "CERVID_THRESHOLD",
        conflicts_with = "threshold_percent"
    )]
    pub threshold: Option<f32>,

    /// Threshold as a percentage (0-100), as set by a slider.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub threshold_percent: Option<u8>,

    /// Number of worker threads.
    #[arg(short = 'j', long, value_parser = parse_jobs, env = "CERVID_JOBS")]
    pub jobs: Option<usize>,

    /// Ledger file name inside the destination root.
    #[arg(long, env = "CERVID_LEDGER")]
    pub ledger: Option<String>,

    /// Numeric class codes written to the ledger.
    #[arg(long, value_enum, env = "CERVID_CODE_SCHEME")]
    pub code_scheme: Option<CodeScheme>,

    /// Request CUDA GPU acceleration.
    #[arg(long, conflicts_with = "cpu")]
    pub gpu: bool,

    /// Force CPU inference.
    #[arg(long, conflicts_with = "gpu")]
    pub cpu: bool,

    /// Print a JSON run summary to stdout.
    #[arg(long)]
    pub json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    pub no_progress: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn sort_args(args: &[&str]) -> SortArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Some(Command::Sort(args)) => args,
            other => panic!("expected sort command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_sort_with_options() {
        let args = sort_args(&[
            "cervid", "sort", "in", "out", "--alpha", "0.3", "-c", "0.6", "-t", "0.8", "-j", "4",
            "--code-scheme", "index",
        ]);
        assert_eq!(args.source, PathBuf::from("in"));
        assert_eq!(args.alpha, Some(0.3));
        assert_eq!(args.confidence, Some(0.6));
        assert_eq!(args.threshold, Some(0.8));
        assert_eq!(args.jobs, Some(4));
        assert_eq!(args.code_scheme, Some(CodeScheme::Index));
    }

    #[test]
    fn test_cli_threshold_conflicts_with_percent() {
        let cli = Cli::try_parse_from([
            "cervid",
            "sort",
            "in",
            "out",
            "-t",
            "0.5",
            "--threshold-percent",
            "50",
        ]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_threshold_percent_range() {
        let args = sort_args(&["cervid", "sort", "in", "out", "--threshold-percent", "70"]);
        assert_eq!(args.threshold_percent, Some(70));

        assert!(
            Cli::try_parse_from(["cervid", "sort", "in", "out", "--threshold-percent", "101"])
                .is_err()
        );
    }

    #[test]
    fn test_cli_gpu_conflicts_with_cpu() {
        assert!(Cli::try_parse_from(["cervid", "sort", "in", "out", "--gpu", "--cpu"]).is_err());
    }

    #[test]
    fn test_cli_global_verbosity() {
        let cli = Cli::try_parse_from(["cervid", "stats", "out", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_relabel_parses_class_names() {
        let cli =
            Cli::try_parse_from(["cervid", "relabel", "out", "a.jpg", "--to", "roe"]).unwrap();
        match cli.command {
            Some(Command::Relabel { to, from, .. }) => {
                assert_eq!(to, ClassLabel::RoeDeer);
                assert_eq!(from, ClassLabel::Uncertain);
            }
            other => panic!("expected relabel command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_config_subcommand() {
        let cli = Cli::try_parse_from(["cervid", "config", "show"]);
        assert!(cli.is_ok());
    }
}
