//! ztree CLI Binary
//!
//! Command-line interface for the ztree hierarchical node store.

use anyhow::Context;
use clap::Parser;
use std::process;
use ztree::config::ConfigLoader;
use ztree::logging::init_logging;
use ztree::tooling::cli::{Cli, CliContext};

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    // Logging needs the config before the store is opened.
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_with_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ConfigLoader::load().context("loading configuration")?,
    };
    config.logging.apply_overrides(
        cli.log_level.clone(),
        cli.log_format.clone(),
        cli.log_output.clone(),
        cli.log_file.clone(),
    );
    if let Err(e) = init_logging(Some(&config.logging)) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let context = CliContext::from_config(config).context("opening store")?;
    let output = context.execute(&cli.command)?;
    Ok(output)
}
