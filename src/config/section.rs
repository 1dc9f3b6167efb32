//! Configuration sections.
//!
//! ```toml
//! [plugin]
//! output_css = true
//! runtime = false
//! identifiers = "debug"
//!
//! [plugin.process_css]
//! command = ["postcss", "--config", "$VANILLA_ROOT"]
//!
//! [build]
//! entries = ["src/index.ts"]
//! outdir = "dist"
//! minify = false
//! css_bundle = "styles.css"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::ConfigDiagnostics;
use crate::compiler::IdentifierMode;

// ============================================================================
// [plugin]
// ============================================================================

/// `[plugin]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSection {
    /// Emit static CSS
    pub output_css: bool,

    /// Runtime-only transform instead of extraction
    pub runtime: bool,

    /// Class name format; derived from `build.minify` when unset
    pub identifiers: Option<IdentifierMode>,

    /// External CSS post-processor
    pub process_css: Option<ProcessCssSection>,
}

impl Default for PluginSection {
    fn default() -> Self {
        Self {
            output_css: true,
            runtime: false,
            identifiers: None,
            process_css: None,
        }
    }
}

/// `[plugin.process_css]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessCssSection {
    /// Program and arguments; CSS is written to stdin, read from stdout
    pub command: Vec<String>,
}

impl PluginSection {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let Some(process_css) = &self.process_css else {
            return;
        };

        if self.runtime {
            diag.warn(
                "plugin.process_css",
                "ignored in runtime mode (no CSS is extracted)",
            );
        }

        match process_css.command.first() {
            None => diag.error_with_hint(
                "plugin.process_css.command",
                "command is empty",
                "e.g. command = [\"postcss\"]",
            ),
            Some(program) if which::which(program).is_err() => diag.error_with_hint(
                "plugin.process_css.command",
                format!("`{program}` not found"),
                "install it or use an absolute path",
            ),
            Some(_) => {}
        }
    }
}

// ============================================================================
// [build]
// ============================================================================

/// `[build]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Entry modules, relative to the project root
    pub entries: Vec<PathBuf>,

    /// Output directory
    pub outdir: PathBuf,

    /// Minify output; selects short class names
    pub minify: bool,

    /// File name of the concatenated CSS, inside `outdir`
    pub css_bundle: String,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            outdir: "dist".into(),
            minify: false,
            css_bundle: "styles.css".into(),
        }
    }
}

impl BuildSection {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.entries.is_empty() {
            diag.error_with_hint(
                "build.entries",
                "no entry modules",
                "set build.entries or pass entries on the command line",
            );
        }
        for entry in &self.entries {
            if !entry.is_file() {
                diag.error("build.entries", format!("`{}` not found", entry.display()));
            }
        }
        if self.css_bundle.is_empty() || Path::new(&self.css_bundle).components().count() != 1 {
            diag.error("build.css_bundle", "must be a plain file name");
        }
    }

    /// Path of the CSS bundle.
    pub fn css_bundle_path(&self) -> PathBuf {
        self.outdir.join(&self.css_bundle)
    }
}
