//! Command-line interface module.

mod args;
pub mod build;
mod state;
pub mod watch;

pub use args::{BuildArgs, Cli, Commands};
pub use state::setup_shutdown_handler;
