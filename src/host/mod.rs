//! Host-agnostic plugin protocol.
//!
//! Bundler callbacks are re-expressed as a dispatch table keyed by
//! `(namespace, path pattern)`. Plugins register handlers through
//! [`PluginBuild`]; an adapter such as [`BuildHost`] drives them.
//!
//! ```text
//! BuildHost::resolve ──> HandlerTable (resolvers) ──> ResolveResult
//! BuildHost::load    ──> HandlerTable (loaders)   ──> LoadResult ──> WatchGraph
//! BuildHost::dispose ──> HandlerTable (disposers, once)
//! ```

mod driver;
mod table;
mod watch;

pub use driver::BuildHost;
pub use table::{DisposeHandler, Filter, HandlerTable, LoadHandler, ResolveHandler};
pub use watch::WatchGraph;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::error::Result;

/// Namespace of modules backed by real files.
pub const FILE_NAMESPACE: &str = "file";

/// Boxed future returned by type-erased handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Build options visible to plugins during setup.
#[derive(Debug, Clone, Default)]
pub struct InitialOptions {
    /// Absolute working directory configured for the build.
    pub abs_working_dir: Option<PathBuf>,
    /// Whether the build minifies output.
    pub minify: bool,
}

impl InitialOptions {
    /// Working root: the configured directory, else the process cwd.
    pub fn working_root(&self) -> PathBuf {
        self.abs_working_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default()
    }
}

/// Module kind handed back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Loader {
    Js,
    Jsx,
    Ts,
    Tsx,
    Css,
    Text,
}

impl Loader {
    /// Infer a loader from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("js" | "mjs" | "cjs") => Self::Js,
            Some("jsx") => Self::Jsx,
            Some("ts" | "mts" | "cts") => Self::Ts,
            Some("tsx") => Self::Tsx,
            Some("css") => Self::Css,
            _ => Self::Text,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Js => "js",
            Self::Jsx => "jsx",
            Self::Ts => "ts",
            Self::Tsx => "tsx",
            Self::Css => "css",
            Self::Text => "text",
        }
    }
}

/// Arguments of a resolve request.
#[derive(Debug, Clone)]
pub struct ResolveArgs {
    /// Import specifier exactly as written.
    pub path: String,
    /// Absolute path of the importing module, if any.
    pub importer: Option<PathBuf>,
    /// Namespace of the importing module.
    pub namespace: String,
}

/// A resolved module reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolveResult {
    pub path: String,
    pub namespace: String,
}

impl ResolveResult {
    pub fn new(path: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: namespace.into(),
        }
    }

    /// Reference into the `file` namespace.
    pub fn file(path: &Path) -> Self {
        Self::new(path.to_string_lossy(), FILE_NAMESPACE)
    }
}

/// Arguments of a load request.
#[derive(Debug, Clone)]
pub struct LoadArgs {
    pub path: String,
    pub namespace: String,
}

impl From<&ResolveResult> for LoadArgs {
    fn from(resolved: &ResolveResult) -> Self {
        Self {
            path: resolved.path.clone(),
            namespace: resolved.namespace.clone(),
        }
    }
}

/// Module content produced by a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub contents: String,
    pub loader: Loader,
    /// Directory used to resolve relative references inside `contents`.
    pub resolve_dir: Option<PathBuf>,
    /// Files whose change must invalidate this module.
    pub watch_files: Vec<PathBuf>,
}

impl LoadResult {
    pub fn new(contents: impl Into<String>, loader: Loader) -> Self {
        Self {
            contents: contents.into(),
            loader,
            resolve_dir: None,
            watch_files: Vec::new(),
        }
    }

    pub fn with_resolve_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resolve_dir = Some(dir.into());
        self
    }

    pub fn with_watch_files(mut self, files: Vec<PathBuf>) -> Self {
        self.watch_files = files;
        self
    }
}

/// A bundler plugin.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Register handlers for one build.
    fn setup(&self, build: &mut PluginBuild<'_>) -> Result<()>;
}

/// Registration facade handed to [`Plugin::setup`].
pub struct PluginBuild<'a> {
    initial_options: &'a InitialOptions,
    table: &'a mut HandlerTable,
}

impl<'a> PluginBuild<'a> {
    pub fn new(initial_options: &'a InitialOptions, table: &'a mut HandlerTable) -> Self {
        Self {
            initial_options,
            table,
        }
    }

    pub fn initial_options(&self) -> &InitialOptions {
        self.initial_options
    }

    pub fn on_resolve<F>(&mut self, filter: Filter, handler: F)
    where
        F: Fn(ResolveArgs) -> BoxFuture<'static, Result<Option<ResolveResult>>>
            + Send
            + Sync
            + 'static,
    {
        self.table.add_resolver(filter, std::sync::Arc::new(handler));
    }

    pub fn on_load<F>(&mut self, filter: Filter, handler: F)
    where
        F: Fn(LoadArgs) -> BoxFuture<'static, Result<Option<LoadResult>>> + Send + Sync + 'static,
    {
        self.table.add_loader(filter, std::sync::Arc::new(handler));
    }

    pub fn on_dispose<F>(&mut self, handler: F)
    where
        F: FnOnce() -> BoxFuture<'static, Result<()>> + Send + 'static,
    {
        self.table.add_disposer(Box::new(handler));
    }
}
