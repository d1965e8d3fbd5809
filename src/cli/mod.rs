//! Command-line interface
//!
//! `tune` runs the pipeline, `prepare` recomputes the derived total column,
//! `inspect` prints what a saved artifact contains.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::data::{records, summarize, DataLoader};
use crate::export::{load_model, SerializationFormat};
use crate::pipeline::{TuningPipeline, TuningReport};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(&format!("{:<14}", key)), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

/// Artifact encoding chosen on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Bin,
    Json,
}

impl From<FormatArg> for SerializationFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Bin => SerializationFormat::Binary,
            FormatArg::Json => SerializationFormat::Json,
        }
    }
}

#[derive(Parser)]
#[command(name = "spending-tuner")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Outlier filtering, chronological holdout and model selection for consumer-spending data")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Filter, split, train both candidates and save the best model
    Tune {
        /// JSON configuration file (missing keys take defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Input CSV (overrides the config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory for the model artifact (overrides the config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Rows withheld between train and test
        #[arg(long)]
        gap: Option<usize>,

        /// Trees in the random forest
        #[arg(long)]
        n_estimators: Option<usize>,

        /// Artifact encoding
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Recompute `total spending` and write the table back
    Prepare {
        /// Input CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV (defaults to rewriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the metadata of a saved model
    Inspect {
        /// Model artifact (`.bin` or `.json`)
        #[arg(short, long)]
        model: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Merge the config file (if any) with command-line overrides
pub fn resolve_config(
    config: Option<&Path>,
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    gap: Option<usize>,
    n_estimators: Option<usize>,
    format: Option<FormatArg>,
) -> anyhow::Result<PipelineConfig> {
    let mut resolved = match config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(input) = input {
        resolved.input_path = input;
    }
    if let Some(dir) = output_dir {
        resolved.output_dir = dir;
    }
    if let Some(gap) = gap {
        resolved.split_gap = gap;
    }
    if let Some(n) = n_estimators {
        resolved.n_estimators = n;
    }
    if let Some(format) = format {
        resolved.format = format.into();
    }
    Ok(resolved)
}

pub fn cmd_tune(config: PipelineConfig) -> anyhow::Result<()> {
    section("Tune");

    println!("  {}", kv("Input", &config.input_path.display().to_string()));
    println!("  {}", kv("Output dir", &config.output_dir.display().to_string()));
    println!(
        "  {}",
        kv("Outlier ν/γ", &format!("{} / {}", config.outlier_nu, config.outlier_gamma))
    );
    println!("  {}", kv("Gap", &config.split_gap.to_string()));
    println!(
        "  {}",
        kv("Forest", &format!("{} trees, {}", config.n_estimators, config.criterion))
    );
    println!();

    step_run("Running pipeline");
    let start = Instant::now();
    let report = TuningPipeline::new(config).run()?;
    step_done(&format!("{:.2?}", start.elapsed()));

    print_report(&report);
    Ok(())
}

fn print_report(report: &TuningReport) {
    println!();
    line_box_top();
    line_box(&kv("Rows loaded", &report.rows_loaded.to_string()));
    line_box(&kv(
        "Outliers",
        &format!("{} dropped, {} kept", report.rows_dropped, report.rows_kept),
    ));
    line_box(&kv(
        "Split",
        &format!("{} train | {} gap | {} test", report.train_rows, report.gap, report.test_rows),
    ));
    line_box_sep();
    for score in &report.scores {
        let mape = format!("{:>10.4}%", score.metrics.mape * 100.0);
        let line = if score.identifier == report.best_identifier {
            format!("{} {} {}", format!("{:<18}", score.identifier).white().bold(), mape.white().bold(), ok("best"))
        } else {
            format!("{} {}", muted(&format!("{:<18}", score.identifier)), mape)
        };
        line_box(&line);
    }
    line_box_sep();
    line_box(&kv("Saved", &report.artifact_path.display().to_string()));
    line_box_bottom();
    println!();
}

pub fn cmd_prepare(input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    section("Prepare");
    let loader = DataLoader::new();

    step_run("Loading data");
    let mut df = loader.load_csv(input)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    let summary = summarize(&records(&df)?);

    let output = output.unwrap_or(input);
    step_run(&format!("Saving → {}", output.display()));
    loader.write_csv(&mut df, output)?;
    step_done("total spending recomputed");

    println!();
    println!("  {}", kv("Rows", &summary.n_rows.to_string()));
    println!("  {}", kv("Dates", &summary.n_dates.to_string()));
    println!("  {}", kv("Regions", &summary.n_regions.to_string()));
    if let (Some(first), Some(last)) = (&summary.first_date, &summary.last_date) {
        println!("  {}", kv("Range", &format!("{} → {}", first, last)));
    }
    println!();
    Ok(())
}

pub fn cmd_inspect(model: &Path) -> anyhow::Result<()> {
    section("Inspect");
    let artifact = load_model(model)?;
    let meta = &artifact.metadata;

    println!("  {}", kv("Model", &meta.identifier.cyan().to_string()));
    println!("  {}", kv("Trained at", &meta.trained_at.to_rfc3339()));
    println!("  {}", kv("Version", &meta.version));
    println!("  {}", kv("Target", &meta.target_name));
    println!("  {}", kv("Features", &meta.feature_names.len().to_string()));
    for (key, value) in &meta.hyperparameters {
        println!("  {}", kv(key, value));
    }
    for (key, value) in &meta.metrics {
        println!("  {}", kv(key, &format!("{:.6}", value)));
    }
    println!();
    Ok(())
}
