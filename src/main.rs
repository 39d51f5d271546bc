//! Playground Runner CLI
//!
//! Runs an exercise's tests against a solution from the command line.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use playground_runner::{
    assembler, DirectorySource, ExerciseSource, ResourceRegistry, RunOutcome, Runner, RunnerConfig,
    Track, VERSION,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "playground-runner")]
#[command(author, version, about = "Run exercise tests against a solution in an embedded interpreter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Runner configuration (JSON)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Keep running tests after the first failure
    #[arg(long, global = true)]
    no_fail_fast: bool,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a test file against a solution file
    Run {
        /// The test file
        #[arg(long, value_name = "FILE")]
        tests: PathBuf,
        /// The learner's solution
        #[arg(long, value_name = "FILE")]
        solution: PathBuf,
        /// Specifier slug the tests import (defaults to the solution's file stem)
        #[arg(short, long)]
        slug: Option<String>,
        /// Track (javascript or typescript); guessed from the test file otherwise
        #[arg(short, long)]
        track: Option<Track>,
    },

    /// Run an exercise from a local checkout
    Exercise {
        /// Root directory of the exercises
        root: PathBuf,
        /// Exercise slug
        slug: String,
        /// Solution to test; the exercise's stub when omitted
        #[arg(long)]
        solution: Option<PathBuf>,
        #[arg(short, long, default_value = "javascript")]
        track: Track,
    },

    /// Print the assembled test program without running it
    Assemble {
        /// The test file
        #[arg(long, value_name = "FILE")]
        tests: PathBuf,
        /// Specifier slug the tests import (defaults to the test file's stem)
        #[arg(short, long)]
        slug: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns whether every test passed.
fn run(cli: Cli) -> Result<bool> {
    tracing::debug!(version = VERSION, "playground-runner");
    let mut config = match &cli.config {
        Some(path) => RunnerConfig::from_file(path)?,
        None => RunnerConfig::default(),
    };
    if cli.no_fail_fast {
        config.fail_fast = false;
    }

    match cli.command {
        Commands::Run {
            tests,
            solution,
            slug,
            track,
        } => {
            let tests_source = read(&tests)?;
            let learner_code = read(&solution)?;
            let slug = match slug {
                Some(slug) => slug,
                None => file_slug(&solution)?,
            };
            let track = track.unwrap_or_else(|| Track::from_path(&tests));
            let runner = Runner::new(config);
            let outcome = timed(|| runner.run_exercise(track, &tests_source, &learner_code, &slug));
            Ok(print_outcome(&outcome, cli.json))
        }
        Commands::Exercise {
            root,
            slug,
            solution,
            track,
        } => {
            let exercise = DirectorySource::new(root).fetch(track, &slug)?;
            let learner_code = match solution {
                Some(path) => read(&path)?,
                None => exercise.stub.clone(),
            };
            let runner = Runner::new(config);
            let outcome =
                timed(|| runner.run_exercise(track, &exercise.tests, &learner_code, &exercise.slug));
            let solved = print_outcome(&outcome, cli.json);
            if solved && !cli.json {
                if let Some(after) = &exercise.after {
                    println!("\n{}", after);
                }
            }
            Ok(solved)
        }
        Commands::Assemble { tests, slug } => {
            let tests_source = read(&tests)?;
            let slug = match slug {
                Some(slug) => slug,
                None => file_slug(&tests)?,
            };
            let registry = ResourceRegistry::new();
            let program = assembler::assemble(
                &registry,
                &tests_source,
                "",
                &slug,
                &config.globals_packages,
            );
            println!("{}", program.text());
            Ok(true)
        }
    }
}

fn timed(f: impl FnOnce() -> RunOutcome) -> RunOutcome {
    let start = Instant::now();
    let outcome = f();
    tracing::info!(elapsed = ?start.elapsed(), "run took");
    outcome
}

fn print_outcome(outcome: &RunOutcome, json: bool) -> bool {
    if json {
        println!("{}", outcome.report.to_json());
    } else {
        for entry in &outcome.console {
            println!("[console.{}] {}", entry.level, entry.text);
        }
        print!("{}", outcome.report);
    }
    outcome.cleanup.release();
    outcome.is_solved()
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// `two-fer.js`, `two-fer.ts` and `two-fer.spec.js` all import as `./two-fer`.
fn file_slug(path: &Path) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Cannot derive a slug from {}", path.display()))?;
    let slug = stem
        .strip_suffix(".spec")
        .or_else(|| stem.strip_suffix(".test"))
        .unwrap_or(stem);
    Ok(slug.to_string())
}
