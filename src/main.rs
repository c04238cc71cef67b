//! sitecap - walk multi-language content trees and capture them into pages.

mod capture;
mod cli;
mod config;
mod core;
mod logger;
mod page;
mod utils;
mod vfs;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{SiteConfig, cfg, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    let token = core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    init_config(SiteConfig::load(&cli)?);
    let config = cfg();

    match &cli.command {
        Commands::Capture { args } => cli::capture::capture_site(&config, args, token),
        Commands::Walk { args } => cli::walk::walk_site(&config, args),
    }
}
