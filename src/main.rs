use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod fill;
mod hasher;
mod manifest;
mod staging;
mod util;

use cli::RootArgs;
use config::FillConfig;
use fill::FillOptions;
use hasher::CommandHasher;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_logging(args.verbose);

    let config = FillConfig::from_args(&args)?;
    let mut hasher = CommandHasher::new(config);
    let summary = fill::run(
        &args.manifest,
        &mut hasher,
        FillOptions {
            dry_run: args.dry_run,
        },
    )?;

    if args.dry_run {
        println!(
            "{} of {} records need a sha256",
            summary.pending, summary.records
        );
    } else if summary.written {
        println!(
            "Updated {} ({} of {} records filled)",
            args.manifest.display(),
            summary.filled,
            summary.records
        );
    } else {
        println!("All {} records already have a sha256", summary.records);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
