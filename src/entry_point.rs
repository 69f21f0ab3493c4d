//! Shared entry point.
//!
//! `run_with_args` wires the CLI to the engine and returns the process
//! exit code: 0 when the scan is clean, 1 when findings are reported,
//! 2 on configuration or I/O errors.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::detect::Engine;
use crate::filter::{Baseline, IgnoreSet};
use crate::orchestrator::Orchestrator;
use crate::output::{print_json, print_report};
use crate::postprocess::PostProcessor;
use crate::sources::directory::DirectorySource;
use crate::sources::git::{GitLogSource, StagedSource};
use crate::sources::FragmentSource;

/// Exit code for a clean scan.
pub const EXIT_CLEAN: i32 = 0;
/// Exit code when findings are reported.
pub const EXIT_LEAKS: i32 = 1;
/// Exit code for configuration or I/O errors.
pub const EXIT_ERROR: i32 = 2;

/// Default ignore file discovered in the scan root.
pub const IGNORE_FILENAME: &str = ".gitleaksignore";

/// Runs the scanner with the given arguments using stdout as the writer.
///
/// # Errors
///
/// Returns an error only when writing the report fails; scan and
/// configuration problems are reported through the exit code.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Run the scanner, writing output to the specified writer.
///
/// This is the testable version of `run_with_args` that allows output
/// capture.
///
/// # Errors
///
/// Returns an error only when writing the report fails.
pub fn run_with_args_to<W: std::io::Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let mut program_args = vec!["leaksweep".to_owned()];
    program_args.extend(args);
    let cli = match Cli::try_parse_from(program_args) {
        Ok(c) => c,
        Err(e) => match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                write!(writer, "{e}")?;
                writer.flush()?;
                return Ok(EXIT_CLEAN);
            }
            _ => {
                eprint!("{e}");
                return Ok(EXIT_ERROR);
            }
        },
    };

    let command = cli
        .command
        .unwrap_or(Commands::Dir {
            path: PathBuf::from("."),
            follow_symlinks: false,
        });
    let root = command.path().clone();

    let config = match load_config(cli.config.as_deref(), &root) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("{}", format!("Configuration error: {err:#}").red());
            return Ok(EXIT_ERROR);
        }
    };
    let engine = match config.compile().and_then(Engine::new) {
        Ok(e) => e,
        Err(err) => {
            eprintln!("{}", format!("Configuration error: {err}").red());
            return Ok(EXIT_ERROR);
        }
    };

    if cli.verbose && !cli.json {
        eprintln!("[VERBOSE] leaksweep v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("[VERBOSE] {} rule(s) active", engine.rules().len());
        eprintln!("[VERBOSE] Scan root: {}", root.display());
    }

    let mut orchestrator = Orchestrator::new(&engine, cli.threads);
    if !cli.no_progress && !cli.json && matches!(command, Commands::Dir { .. }) {
        let pb = indicatif::ProgressBar::new(0);
        pb.set_style(
            indicatif::ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar()),
        );
        orchestrator.progress_bar = Some(Arc::new(pb));
    }
    if cli.verbose && !cli.json {
        eprintln!("[VERBOSE] Using {} threads", orchestrator.threads());
    }

    let source: Box<dyn FragmentSource> = match &command {
        Commands::Dir {
            path,
            follow_symlinks,
        } => Box::new(DirectorySource::new(
            path.clone(),
            *follow_symlinks,
            cli.verbose,
        )),
        Commands::Git { path, log_opts } => {
            let opts = log_opts
                .as_deref()
                .map(|s| s.split_whitespace().map(str::to_owned).collect())
                .unwrap_or_default();
            Box::new(GitLogSource::new(path.clone(), opts))
        }
        Commands::Stage { path } => Box::new(StagedSource::new(path.clone())),
    };

    let raw_findings = match orchestrator.run(source.as_ref()) {
        Ok(findings) => findings,
        Err(err) => {
            eprintln!("{}", format!("Scan failed: {err:#}").red());
            return Ok(EXIT_ERROR);
        }
    };
    if let Some(pb) = &orchestrator.progress_bar {
        pb.finish_and_clear();
    }

    let ignore_path = cli
        .ignore_path
        .clone()
        .unwrap_or_else(|| root.join(IGNORE_FILENAME));
    let ignore = IgnoreSet::load(&ignore_path);
    let baseline = cli
        .baseline_path
        .as_deref()
        .map(Baseline::load)
        .unwrap_or_default();

    let processor = PostProcessor::new(ignore, baseline);
    let mut findings = processor.process(raw_findings);
    if cli.redact {
        for finding in &mut findings {
            finding.redact();
        }
    }

    if let Some(report_path) = &cli.report_path {
        let mut file = fs::File::create(report_path)?;
        write_findings(&mut file, &findings, cli.json)?;
    } else {
        write_findings(writer, &findings, cli.json)?;
    }

    if findings.is_empty() {
        Ok(EXIT_CLEAN)
    } else {
        Ok(EXIT_LEAKS)
    }
}

fn write_findings<W: std::io::Write>(
    writer: &mut W,
    findings: &[crate::detect::Finding],
    json: bool,
) -> Result<()> {
    if json {
        print_json(writer, findings)?;
    } else {
        print_report(writer, findings)?;
    }
    Ok(())
}

fn load_config(explicit: Option<&Path>, root: &Path) -> Result<Config> {
    match explicit {
        Some(path) => Config::load_file(path),
        None => Config::load_from_path(root),
    }
}
