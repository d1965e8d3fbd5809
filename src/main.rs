//! spending-tuner - Main Entry Point

use clap::Parser;
use colored::Colorize;
use spending_tuner::cli::{cmd_inspect, cmd_prepare, cmd_tune, resolve_config, Cli, Commands};

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Tune { config, input, output_dir, gap, n_estimators, format } => {
            let config = resolve_config(config.as_deref(), input, output_dir, gap, n_estimators, format)?;
            cmd_tune(config)?;
        }
        Commands::Prepare { input, output } => {
            cmd_prepare(&input, output.as_deref())?;
        }
        Commands::Inspect { model } => {
            cmd_inspect(&model)?;
        }
    }
    Ok(())
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spending_tuner=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        println!();
        eprintln!("  {} {}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}
