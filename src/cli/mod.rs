//! Command-line interface module.

mod args;
pub mod capture;
pub mod walk;

pub use args::{CaptureArgs, Cli, Commands, CommonArgs, WalkArgs};
