//! url-gate - classify fetch targets from the command line
//!
//! Wraps the library for scripts and CI: classify URLs, run a verification
//! case table, or print the effective blocklists.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use url_gate::harness::{self, CaseTable};
use url_gate::{ClassifierConfig, ConfigOverrides, UrlClassifier};

/// SSRF gate for outbound fetch targets.
#[derive(Parser, Debug)]
#[command(name = "url-gate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with extra blocked ranges and hostnames.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify one or more URLs. Exits 1 if any is blocked.
    Classify {
        /// URLs to classify.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Print one JSON object per line.
        #[arg(long)]
        json: bool,
    },

    /// Run a case table and report pass/fail counts. Exits 1 on any failure.
    Verify {
        /// TOML file with `[[case]]` entries.
        cases: PathBuf,

        /// Print passing cases too.
        #[arg(long)]
        all: bool,
    },

    /// List the effective blocked ranges and hostnames.
    Ranges,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // Verdicts go to stdout, logs to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let classifier = UrlClassifier::new(load_config(args.config.as_deref())?);
    let mut out = io::stdout().lock();

    let ok = match args.command {
        Command::Classify { urls, json } => classify_urls(&classifier, &urls, json, &mut out)?,
        Command::Verify { cases, all } => verify(&classifier, &cases, all, &mut out)?,
        Command::Ranges => {
            print_ranges(classifier.config(), &mut out)?;
            true
        }
    };
    out.flush()?;

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn load_config(path: Option<&Path>) -> Result<ClassifierConfig> {
    let Some(path) = path else {
        return Ok(ClassifierConfig::default());
    };
    let overrides = ConfigOverrides::load(path)
        .with_context(|| format!("loading overrides from {}", path.display()))?;
    overrides
        .into_config()
        .with_context(|| format!("applying overrides from {}", path.display()))
}

/// Returns false if any URL was blocked.
fn classify_urls(
    classifier: &UrlClassifier,
    urls: &[String],
    json: bool,
    out: &mut impl Write,
) -> Result<bool> {
    let mut any_blocked = false;
    for url in urls {
        let verdict = classifier.classify(url);
        any_blocked |= verdict.blocked;
        if json {
            let line = serde_json::json!({
                "url": url,
                "blocked": verdict.blocked,
                "reason": verdict.reason,
            });
            writeln!(out, "{}", serde_json::to_string(&line)?)?;
        } else {
            writeln!(out, "{}\t{}", verdict, url)?;
        }
    }
    Ok(!any_blocked)
}

/// Returns false if any case failed.
fn verify(
    classifier: &UrlClassifier,
    cases: &Path,
    all: bool,
    out: &mut impl Write,
) -> Result<bool> {
    let table = CaseTable::load(cases)
        .with_context(|| format!("loading case table {}", cases.display()))?;
    let report = harness::run(classifier, &table);

    for outcome in &report.outcomes {
        if all || !outcome.passed {
            writeln!(out, "{}", outcome)?;
        }
    }
    writeln!(out, "{}", report)?;

    Ok(report.all_passed())
}

fn print_ranges(config: &ClassifierConfig, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Blocked ranges:")?;
    for range in config.matcher().ranges() {
        writeln!(out, "  {:<24} {}", range.network().to_string(), range.label())?;
    }
    writeln!(out, "Blocked hostnames:")?;
    for host in config.hostnames().iter() {
        writeln!(out, "  {}", host)?;
    }
    Ok(())
}
