//! tola-assets - serve and inspect configured static assets.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use tola_assets::{
    cli::{self, Cli, Commands},
    config::AppConfig,
    logger,
};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    cli::serve::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = AppConfig::load(&cli)?;

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve(&config),
        Commands::Resolve { paths } => cli::resolve::resolve_paths(&config, paths),
    }
}
