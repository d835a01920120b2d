use anyhow::{Context, Result};
use clap::Parser;
use report2docx::{build_report, ReportConfig, ReportObserver, SkipReason};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input HTML files in report order (overrides the configured list).
    files: Vec<PathBuf>,

    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output .docx path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Document title stored in the package properties.
    #[arg(long)]
    title: Option<String>,

    /// Base directory for relative input paths.
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Debug logging on stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn rule() -> String {
    "=".repeat(80)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

struct ConsoleObserver;

impl ReportObserver for ConsoleObserver {
    fn on_file_start(&self, index: usize, total: usize, path: &Path) {
        println!("[{index}/{total}] Processing {}...", display_name(path));
    }

    fn on_file_skipped(&self, _index: usize, _total: usize, path: &Path, reason: SkipReason) {
        match reason {
            SkipReason::MissingFile => {
                println!("    WARNING: File not found - {}", display_name(path))
            }
            SkipReason::MissingBody => {
                println!("    WARNING: No body content found in {}", display_name(path))
            }
        }
    }

    fn on_file_complete(&self, _index: usize, _total: usize, path: &Path, _blocks: usize) {
        println!("    ✓ Completed {}", display_name(path));
    }
}

fn load_config(args: &Args) -> Result<ReportConfig> {
    let mut cfg = match &args.config {
        Some(path) => ReportConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => ReportConfig::default(),
    };
    if !args.files.is_empty() {
        cfg.files = args.files.clone();
    }
    if let Some(out) = &args.out {
        cfg.output = out.clone();
    }
    if let Some(title) = &args.title {
        cfg.title = Some(title.clone());
    }
    if let Some(dir) = &args.input_dir {
        cfg.input_dir = dir.clone();
    }
    Ok(cfg)
}

fn run(args: &Args) -> Result<PathBuf> {
    let cfg = load_config(args)?;
    let summary = build_report(&cfg, &ConsoleObserver)
        .with_context(|| format!("build {}", cfg.output.display()))?;
    tracing::debug!(
        converted = summary.converted.len(),
        skipped = summary.skipped.len(),
        blocks = summary.blocks,
        "report finished"
    );
    Ok(summary.output)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    println!("{}", rule());
    println!("Report Converter - HTML to Word");
    println!("{}", rule());
    println!("\nConverting HTML files to Word document...\n");

    match run(&args) {
        Ok(output) => {
            println!("\n{}", rule());
            println!("✓ SUCCESS! Word document created: {}", display_name(&output));
            println!("{}", rule());
            println!("\nFile location: {}", output.display());
            println!("\nYou can now open this file in Microsoft Word!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("\n{}", rule());
            println!("ERROR: {e:#}");
            println!("{}", rule());
            ExitCode::FAILURE
        }
    }
}
