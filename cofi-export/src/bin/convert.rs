//! pathfinder2 / snapshot → CoFi CSV converter

use clap::Parser;
use cofi_export::{
    config::{AmountSource, InputFormat, LogFormat},
    Config, Converter,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Convert a pathfinder2 edge CSV or a binary trust snapshot into CoFi rows.
#[derive(Parser, Debug)]
#[command(name = "cofi-convert", version, about)]
struct Args {
    /// Configuration file (TOML)
    #[arg(long, short = 'c', env = "COFI_CONFIG")]
    config: Option<PathBuf>,

    /// Input file
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Input format: pathfinder2_csv or snapshot
    #[arg(long, short = 'f')]
    format: Option<String>,

    /// Snapshot amounts: capacities or balances
    #[arg(long)]
    amounts: Option<String>,

    /// CoFi CSV output
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Account index CSV output
    #[arg(long)]
    index_output: Option<PathBuf>,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn into_config(self) -> cofi_export::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env()?;

        if let Some(input) = self.input {
            config.input.path = input;
        }
        if let Some(format) = self.format {
            config.input.format = format.parse::<InputFormat>()?;
        }
        if let Some(amounts) = self.amounts {
            config.input.amounts = amounts.parse::<AmountSource>()?;
        }
        if let Some(output) = self.output {
            config.output.cofi_path = output;
        }
        if let Some(index_output) = self.index_output {
            config.output.index_path = Some(index_output);
        }
        if self.json_logs {
            config.log_format = LogFormat::Json;
        }
        Ok(config)
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;
    init_tracing(config.log_format);

    tracing::info!("Starting CoFi conversion");

    let report = Converter::new(config)?.run()?;

    tracing::info!(
        accounts = report.accounts,
        rows = report.rows_written,
        self_loops = report.self_loops_skipped,
        dropped = report.dropped_below_unit,
        "Conversion complete"
    );
    Ok(())
}
