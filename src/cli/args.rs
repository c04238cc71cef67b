//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Walk multi-language content trees and capture them into pages
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Output directory path (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Content directory path, replacing all configured mounts
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub content: Option<PathBuf>,

    /// Config file path (default: sitecap.toml)
    #[arg(short = 'C', long, default_value = "sitecap.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Capture the content tree into pages and publish plain files
    #[command(visible_alias = "c")]
    Capture {
        #[command(flatten)]
        args: CaptureArgs,
    },

    /// Print the walk order of the content tree
    #[command(visible_alias = "w")]
    Walk {
        #[command(flatten)]
        args: WalkArgs,
    },
}

/// Arguments shared by all commands that walk content.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Start from this directory inside the content tree
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// Capture command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct CaptureArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Cancel the run on the first construction error
    #[arg(short = 'F', long)]
    pub fail_fast: bool,

    /// Replace pages by logical path instead of adding them
    #[arg(short, long)]
    pub partial: bool,

    /// Print a JSON summary instead of the page tree
    #[arg(short, long)]
    pub json: bool,

    /// Show running counters while capturing
    #[arg(short = 'P', long)]
    pub progress: bool,
}

/// Walk command arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct WalkArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

impl Cli {
    pub const fn common(&self) -> &CommonArgs {
        match &self.command {
            Commands::Capture { args } => &args.common,
            Commands::Walk { args } => &args.common,
        }
    }
}
