use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use study_sync_core::{Config, LogLevel, StudySync};

#[derive(Parser)]
#[command(name = "study-sync")]
#[command(about = "Keep a DICOM study tree and its CSV registry in sync")]
#[command(version)]
struct Cli {
    /// Root of the DICOM tree
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to a rotating file in this directory instead of the console
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Show a progress bar
    #[arg(long, global = true)]
    progress: bool,

    /// Verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the DICOM tree and write one CSV row per study
    Scan {
        /// Subfolder of the root to scan (the CSV is still written to the root)
        #[arg(long)]
        subdir: Option<PathBuf>,

        /// Warn when files of one study disagree with the recorded values
        #[arg(long)]
        report_conflicts: bool,
    },

    /// Write edits made in the CSV back into the DICOM files
    Update {
        /// CSV file to apply (default: <root>/studies.csv)
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Move files into Patient-/Study-/Series- folders named from their tags
    Reorganize {
        /// Subfolders of the root to reorganize independently
        #[arg(long = "subdir")]
        subdirs: Vec<PathBuf>,

        /// Keep directories left empty by the moves
        #[arg(long)]
        keep_empty: bool,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "study-sync.json")]
        path: PathBuf,
    },
}

/// Exit status when a precondition (root folder, registry file, configuration)
/// stops the run before any file is touched
const FATAL_EXIT_CODE: i32 = 2;

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => Config::default(),
    };

    if let Some(root) = cli.root {
        config.root_dir = root;
    }
    config.show_progress = cli.progress;
    config.log_level = match cli.verbose {
        0 => config.log_level,
        1 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    match &cli.log_dir {
        Some(log_dir) => study_sync_core::logging::init_logger(log_dir, config.log_level.into())
            .map_err(|e| anyhow::anyhow!("{}", e))?,
        None => env_logger::Builder::new()
            .filter_level(config.log_level.into())
            .parse_default_env()
            .init(),
    }

    let result = match cli.command {
        Commands::Scan {
            subdir,
            report_conflicts,
        } => {
            if subdir.is_some() {
                config.scan_subdir = subdir;
            }
            config.report_duplicate_conflicts |= report_conflicts;

            StudySync::new(config)
                .and_then(|sync| sync.export_registry())
                .map(|path| {
                    println!("CSV file successfully created at: {}", path.display());
                })
        }

        Commands::Update { csv } => {
            StudySync::new(config)
                .and_then(|sync| sync.update_from_registry(csv.as_deref()))
                .map(|summary| {
                    println!("Total files updated: {}", summary.updated);
                    println!("{}", summary);
                })
        }

        Commands::Reorganize {
            subdirs,
            keep_empty,
        } => {
            if !subdirs.is_empty() {
                config.reorganize_subdirs = subdirs;
            }
            if keep_empty {
                config.delete_empty_dirs = false;
            }

            StudySync::new(config)
                .and_then(|sync| sync.reorganize())
                .map(|summary| {
                    println!("Reorganization complete: {}", summary);
                })
        }

        Commands::GenerateConfig { path } => config.save_to_file(&path).map(|()| {
            println!("Configuration file generated at: {}", path.display());
        }),
    };

    match result {
        Ok(()) => {
            info!("Done");
            Ok(())
        }
        Err(e) if e.is_fatal() => {
            error!("Aborted: {}", e);
            std::process::exit(FATAL_EXIT_CODE);
        }
        Err(e) => {
            error!("{}", e);
            Err(e.into())
        }
    }
}
