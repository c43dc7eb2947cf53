//! sailcheck - A go/no-go sailing check from tides and wind
//!
//! sailcheck provides:
//! - NOAA tide predictions with a disk-backed response cache
//! - NWS point forecasts
//! - A fixed tide + wind decision rule
//! - Unified output format (text/jsonl/json/md)

use anyhow::Result;
use clap::Parser;

mod backends;
mod cache;
mod cli;
mod core;
mod flows;
mod logging;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    logging::init(cli.verbose, cli.quiet, !cli.no_color);
    if cli.no_color {
        colored::control::set_override(false);
    }
    cli::run(cli)
}
