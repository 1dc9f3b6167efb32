//! vanilla-bridge - build style modules into JS and extracted CSS.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use vanilla_bridge::cli::{self, Cli, Commands};
use vanilla_bridge::config::VanillaConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    cli::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = VanillaConfig::load(&cli)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match &cli.command {
        Commands::Build { .. } => runtime.block_on(cli::build::run(config)),
    }
}
