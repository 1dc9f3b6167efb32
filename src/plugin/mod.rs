//! The bundler plugin.
//!
//! ```text
//! setup ──> SessionHandle::open
//!   on_resolve  /\.vanilla\.css/            ──> vanilla-extract-css-ns
//!   on_load     vanilla-extract-css-ns      ──> compiler CSS (+ processCss)
//!   on_load     file                        ──> rewritten JS + watch files
//!   on_dispose                              ──> SessionHandle::close
//! ```
//!
//! With `runtime` set, [`vanilla_extract_plugin`] returns [`RuntimePlugin`]
//! instead and no session is ever opened.

mod css;
mod resolve;
mod runtime;
mod session;
mod source;

pub use css::load_css;
pub use resolve::VirtualCssPath;
pub use runtime::{RuntimePlugin, add_debug_ids, add_file_scope};
pub use session::SessionHandle;
pub use source::load_source;

use std::sync::Arc;

use crate::compiler::{CompilerExtension, IdentifierMode, InlineCompiler, StyleCompiler};
use crate::error::Result;
use crate::hooks::css::ProcessCss;
use crate::host::{Plugin, PluginBuild};

/// Namespace of virtual CSS modules.
pub const VIRTUAL_NAMESPACE: &str = "vanilla-extract-css-ns";

/// Suffix marking a virtual CSS import.
pub const CSS_MARKER: &str = ".vanilla.css";

/// Caller configuration.
#[derive(Clone)]
pub struct PluginOptions {
    /// Emit static CSS. When false, JS is still rewritten but imports no CSS.
    pub output_css: bool,
    /// Use the runtime-only transform instead of the full pipeline.
    pub runtime: bool,
    pub process_css: Option<ProcessCss>,
    /// Overrides the mode derived from `minify`.
    pub identifiers: Option<IdentifierMode>,
    /// Passed through to the compiler.
    pub extensions: Vec<Arc<dyn CompilerExtension>>,
    pub compiler: Arc<dyn StyleCompiler>,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            output_css: true,
            runtime: false,
            process_css: None,
            identifiers: None,
            extensions: Vec::new(),
            compiler: Arc::new(InlineCompiler),
        }
    }
}

impl std::fmt::Debug for PluginOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginOptions")
            .field("output_css", &self.output_css)
            .field("runtime", &self.runtime)
            .field("process_css", &self.process_css.is_some())
            .field("identifiers", &self.identifiers)
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}

/// Build the plugin for `options`.
pub fn vanilla_extract_plugin(options: PluginOptions) -> Box<dyn Plugin> {
    if options.runtime {
        return Box::new(RuntimePlugin);
    }
    Box::new(VanillaExtractPlugin { options })
}

/// Full extraction pipeline.
pub struct VanillaExtractPlugin {
    options: PluginOptions,
}

impl Plugin for VanillaExtractPlugin {
    fn name(&self) -> &str {
        "vanilla-extract"
    }

    fn setup(&self, build: &mut PluginBuild<'_>) -> Result<()> {
        let session = SessionHandle::open(
            self.options.compiler.as_ref(),
            build.initial_options(),
            self.options.identifiers,
            self.options.extensions.clone(),
        )?;

        resolve::register(build);
        css::register(build, session.clone(), self.options.process_css.clone());
        source::register(build, session.clone(), self.options.output_css);

        build.on_dispose(move || Box::pin(async move { session.close().await }));
        Ok(())
    }
}

#[cfg(test)]
mod tests;
