//! Style compiler collaborator.
//!
//! The plugin never evaluates style definitions itself. It talks to a
//! [`StyleCompiler`] that opens one [`CompilerSession`] per build:
//!
//! ```text
//! open(root, identifiers, extensions) ──> CompilerSession
//!   process_file(path, output_css)   ──> rewritten JS + watch files
//!   get_css_for_file(root_relative)  ──> CSS extracted during process_file
//!   close()
//! ```
//!
//! [`InlineCompiler`] is the bundled implementation.

mod ident;
mod inline;

pub use ident::IdentifierMode;
pub use inline::InlineCompiler;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::Result;
use crate::host::BoxFuture;

/// Style definition files: `*.css.{js,cjs,mjs,jsx,ts,tsx}` with optional `?used`.
pub(crate) static STYLE_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.css\.(js|cjs|mjs|jsx|ts|tsx)(\?used)?$").unwrap());

/// Whether a path names a style definition file.
#[inline]
pub fn is_style_file(path: &str) -> bool {
    STYLE_FILE.is_match(path)
}

/// Source-level transform run before evaluation.
pub trait CompilerExtension: Send + Sync {
    fn name(&self) -> &str;

    /// Return `Some(new_source)` to replace the source, `None` to keep it.
    fn transform(&self, path: &Path, source: &str) -> Result<Option<String>>;
}

/// Options for opening a session.
#[derive(Clone)]
pub struct CompilerOptions {
    /// Absolute project root; CSS is keyed by paths relative to it.
    pub root: PathBuf,
    pub identifiers: IdentifierMode,
    pub extensions: Vec<Arc<dyn CompilerExtension>>,
}

impl std::fmt::Debug for CompilerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.extensions.iter().map(|e| e.name()).collect();
        f.debug_struct("CompilerOptions")
            .field("root", &self.root)
            .field("identifiers", &self.identifiers)
            .field("extensions", &names)
            .finish()
    }
}

/// Options for one `process_file` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessOptions {
    /// Emit the companion `.vanilla.css` import in the rewritten module.
    pub output_css: bool,
}

/// CSS extracted for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssResult {
    pub css: String,
    /// Absolute path of the originating source file.
    pub source_file_path: PathBuf,
}

/// Result of rewriting one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFile {
    /// Rewritten JS; `None` means pass the file through unmodified.
    pub source: Option<String>,
    /// Absolute paths that influenced the result, including the file itself.
    pub watch_files: BTreeSet<PathBuf>,
}

/// Factory for per-build sessions.
pub trait StyleCompiler: Send + Sync {
    fn open(&self, options: CompilerOptions) -> Result<Arc<dyn CompilerSession>>;
}

/// One live compiler instance. Must tolerate concurrent queries.
pub trait CompilerSession: Send + Sync {
    /// CSS previously extracted for `root_relative_path`.
    fn get_css_for_file(&self, root_relative_path: &str) -> Result<CssResult>;

    /// Rewrite a source file. `Ok(None)` when the file has no style definitions.
    fn process_file(
        &self,
        path: &Path,
        options: ProcessOptions,
    ) -> BoxFuture<'static, Result<Option<ProcessedFile>>>;

    /// Release evaluation resources. Queries afterwards fail with `SessionClosed`.
    fn close(&self) -> BoxFuture<'static, Result<()>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_style_file() {
        assert!(is_style_file("/site/src/button.css.ts"));
        assert!(is_style_file("/site/src/button.css.tsx"));
        assert!(is_style_file("/site/src/button.css.mjs"));
        assert!(is_style_file("/site/src/button.css.ts?used"));
        assert!(!is_style_file("/site/src/button.ts"));
        assert!(!is_style_file("/site/src/button.css"));
        assert!(!is_style_file("/site/src/button.css.ts.vanilla.css"));
    }
}
