use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod kubectl;
mod manifest;
mod reconcile;
mod strategy;

use cli::{RootArgs, State};
use kubectl::Kubectl;

fn main() -> Result<()> {
    let args = RootArgs::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let kubectl = Kubectl::new(&args.kubectl_bin, &args.kubectl_opts)?;

    let report = match args.state {
        State::Present => reconcile::ensure_present(&kubectl, &args.file, args.strategy),
        State::Absent => reconcile::ensure_absent(&kubectl, &args.file),
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    if report.failed {
        std::process::exit(1);
    }
    Ok(())
}
