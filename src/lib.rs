//! vanilla-bridge - bundler integration for co-located style definitions.
//!
//! Style modules (`*.css.ts`) are evaluated by a [`compiler::StyleCompiler`]
//! session at build time. The plugin rewrites them into plain JS that
//! imports a virtual `.vanilla.css` module, and serves that module's CSS
//! from the same session.
//!
//! ```text
//! plugin/     # resolve, load and dispose handlers (the bundler surface)
//! compiler/   # compiler traits + the built-in inline compiler
//! host/       # handler table, build host, watch graph
//! hooks/      # external CSS post-processing
//! config/     # vanilla.toml
//! cli/        # `vanilla-bridge build [--watch]`
//! ```

pub mod logger;

pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod hooks;
pub mod host;
pub mod plugin;
pub mod utils;

pub use error::{Error, Result};
pub use plugin::{PluginOptions, vanilla_extract_plugin};
