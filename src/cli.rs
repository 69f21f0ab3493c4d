use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command line interface configuration using `clap`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The scan mode to execute. Defaults to a directory scan of the
    /// current directory.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to a configuration file. When omitted, `.leaksweep.toml`
    /// is discovered by walking up from the scan root.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Baseline file (a previous run's JSON report); findings present
    /// in it are not reported again.
    #[arg(long, global = true)]
    pub baseline_path: Option<PathBuf>,

    /// Ignore file with one fingerprint per line. Defaults to
    /// `.gitleaksignore` in the scan root.
    #[arg(long, global = true)]
    pub ignore_path: Option<PathBuf>,

    /// Mask secrets in all output.
    #[arg(long, global = true)]
    pub redact: bool,

    /// Output the findings as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Write the report to a file instead of stdout.
    #[arg(long, global = true)]
    pub report_path: Option<PathBuf>,

    /// Maximum number of scanner threads.
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Hide the progress bar.
    #[arg(long, global = true)]
    pub no_progress: bool,
}

/// Available scan modes.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a directory tree
    Dir {
        /// Root to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Follow symbolic links
        #[arg(long)]
        follow_symlinks: bool,
    },
    /// Scan the full history of a git repository
    Git {
        /// Repository root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Extra options forwarded to `git log` (e.g. "--all foo...")
        #[arg(long, allow_hyphen_values = true)]
        log_opts: Option<String>,
    },
    /// Scan the staged (index vs. HEAD) diff
    Stage {
        /// Repository root
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

impl Commands {
    /// Root path of the scan, common to every mode.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Dir { path, .. } | Self::Git { path, .. } | Self::Stage { path } => path,
        }
    }
}
