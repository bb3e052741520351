mod config;
mod error;
mod models;
mod pipeline;
mod quotes;
mod scraper;
mod storage;
mod utils;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;
use crate::pipeline::Pipeline;

#[derive(Parser)]
#[command(
    name = "index-export",
    about = "Export S&P 500 and S&P MidCap 400 constituents with prices and dividend yields to CSV",
    version
)]
struct Cli {
    /// Path to write the CSV file (default: index_constituents.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "index_export=info,warn",
        1 => "index_export=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load()?;
    let output = cli.output.unwrap_or_else(|| config.output.path.clone());

    let _t = utils::Timer::start("Index export");
    let stats = Pipeline::new(config).run(&output).await?;

    println!(
        "Wrote {} rows to {}",
        utils::fmt_count(stats.rows_written),
        output.display()
    );
    Ok(())
}
