use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fieldwatch",
    version,
    about = "Simulated farm sensor monitoring with yield prediction"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the data directory (log file location)
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive dashboard (default)
    Dashboard,
    /// Run monitoring cycles headless and print a line per cycle
    Run {
        /// Number of cycles to run
        #[arg(short = 'n', long, default_value_t = 10)]
        cycles: u64,
        /// Seconds between cycles (defaults to 0 when headless)
        #[arg(short, long, default_value_t = 0)]
        interval: u64,
        /// Train the yield model from this CSV before the first cycle
        #[arg(short, long)]
        train: Option<PathBuf>,
        /// Hold a sensor at a fixed reading, e.g. --pin soil_moisture=25 (repeatable)
        #[arg(short, long = "pin", value_name = "SENSOR=VALUE", value_parser = parse_pin)]
        pins: Vec<(String, f64)>,
        /// How long pinned readings are held
        #[arg(long, default_value_t = 60)]
        pin_secs: u64,
    },
    /// Train the yield model and print the summary and current yields
    Train {
        /// Training CSV (falls back to predictor.dataset in config)
        path: Option<PathBuf>,
    },
    /// Run cycles and print the system report as JSON
    Report {
        #[arg(short = 'n', long, default_value_t = 1)]
        cycles: u64,
    },
    /// Write a config file interactively
    Init,
    /// Validate the config file
    Check,
}

/// Parse `SENSOR=VALUE` for `run --pin`.
fn parse_pin(s: &str) -> Result<(String, f64), String> {
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SENSOR=VALUE, got '{}'", s))?;
    let id = id.trim();
    if id.is_empty() {
        return Err("sensor id must not be empty".into());
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid reading '{}'", value))?;
    if !value.is_finite() {
        return Err(format!("reading must be finite, got '{}'", value));
    }
    Ok((id.to_string(), value))
}
