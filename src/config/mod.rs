//! Project configuration management for `vanilla.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section    # [plugin] and [build]
//! ├── error      # ConfigError, ConfigDiagnostics
//! ├── util       # config file lookup
//! └── mod.rs     # VanillaConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section               | Purpose                                          |
//! |-----------------------|--------------------------------------------------|
//! | `[plugin]`            | CSS output, runtime mode, class name format      |
//! | `[plugin.process_css]`| External CSS post-processor command              |
//! | `[build]`             | Entries, output directory, minify, CSS bundle    |
//!
//! The file is optional: without one, defaults apply and the project root
//! is the current directory.

mod error;
mod section;
mod util;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use section::{BuildSection, PluginSection, ProcessCssSection};

use util::find_config_file;

use crate::cli::{BuildArgs, Cli};
use crate::hooks::css::command;
use crate::plugin::PluginOptions;
use crate::{debug, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing vanilla.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VanillaConfig {
    /// Absolute path to the config file, empty when none was found (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Whether `--watch` was requested (internal use only)
    #[serde(skip)]
    pub watch: bool,

    /// Plugin settings
    #[serde(default)]
    pub plugin: PluginSection,

    /// Build settings
    #[serde(default)]
    pub build: BuildSection,
}

impl VanillaConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd to find the config file. The project root
    /// is the config file's parent directory, else cwd.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, root) = match find_config_file(&cwd, &cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                let root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = path;
                (config, root)
            }
            None => {
                debug!("config"; "{} not found, using defaults", cli.config.display());
                (Self::default(), cwd)
            }
        };

        config.finalize(&root, cli.build_args());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Set root, apply CLI overrides, and make paths absolute.
    fn finalize(&mut self, root: &Path, args: &BuildArgs) {
        self.root = crate::utils::path::normalize_path(root);
        self.apply_build_args(args);
        self.normalize_paths();
    }

    /// Apply build arguments from CLI.
    fn apply_build_args(&mut self, args: &BuildArgs) {
        // Set verbose mode globally
        crate::logger::set_verbose(args.verbose);

        if !args.entries.is_empty() {
            self.build.entries = args.entries.clone();
        }
        Self::update_option(&mut self.build.outdir, args.outdir.as_ref());
        Self::update_option(&mut self.build.minify, args.minify.as_ref());
        if args.identifiers.is_some() {
            self.plugin.identifiers = args.identifiers;
        }
        self.watch = args.watch;
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Normalize entries and output directory relative to root.
    fn normalize_paths(&mut self) {
        let root = self.root.clone();
        self.build.entries = self
            .build
            .entries
            .iter()
            .map(|p| crate::utils::path::normalize_path(&root.join(p)))
            .collect();
        self.build.outdir = crate::utils::path::normalize_path(&root.join(&self.build.outdir));
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.plugin.validate(&mut diag);
        self.build.validate(&mut diag);

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    // ========================================================================
    // plugin options
    // ========================================================================

    /// Plugin options for this project.
    pub fn plugin_options(&self) -> PluginOptions {
        let process_css = self
            .plugin
            .process_css
            .as_ref()
            .filter(|_| !self.plugin.runtime)
            .map(|p| command(p.command.clone(), self.root.clone(), self.build.minify));

        PluginOptions {
            output_css: self.plugin.output_css,
            runtime: self.plugin.runtime,
            process_css,
            identifiers: self.plugin.identifiers,
            ..PluginOptions::default()
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> VanillaConfig {
    let (parsed, ignored) = VanillaConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
