//! Build host: drives registered plugins the way a bundler would.
//!
//! Resolution and loading go through the handler table first and fall
//! back to plain filesystem behavior in the `file` namespace. Every load
//! feeds the watch graph so incremental rebuilds know what to reload.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use super::{
    BoxFuture, FILE_NAMESPACE, HandlerTable, InitialOptions, LoadResult, Loader, Plugin,
    PluginBuild, ResolveArgs, ResolveResult, WatchGraph,
};
use crate::error::{Error, Result};
use crate::utils::path::resolve_specifier;

/// One build session over a set of plugins.
pub struct BuildHost {
    options: InitialOptions,
    table: HandlerTable,
    watch: RwLock<WatchGraph>,
    plugins: Vec<String>,
    disposed: AtomicBool,
}

impl BuildHost {
    pub fn new(options: InitialOptions) -> Self {
        Self {
            options,
            table: HandlerTable::new(),
            watch: RwLock::new(WatchGraph::new()),
            plugins: Vec::new(),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn options(&self) -> &InitialOptions {
        &self.options
    }

    /// Names of registered plugins, in registration order.
    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    /// Run a plugin's setup against this host's handler table.
    pub fn register(&mut self, plugin: &dyn Plugin) -> Result<()> {
        let mut build = PluginBuild::new(&self.options, &mut self.table);
        plugin.setup(&mut build)?;
        crate::debug!(
            "build";
            "plugin `{}`: {} resolvers, {} loaders",
            plugin.name(),
            self.table.resolver_count(),
            self.table.loader_count()
        );
        self.plugins.push(plugin.name().to_string());
        Ok(())
    }

    /// Resolve an import specifier.
    pub async fn resolve(&self, specifier: &str, importer: Option<&Path>) -> Result<ResolveResult> {
        let args = ResolveArgs {
            path: specifier.to_string(),
            importer: importer.map(Path::to_path_buf),
            namespace: FILE_NAMESPACE.to_string(),
        };
        if let Some(resolved) = self.table.resolve(args).await? {
            return Ok(resolved);
        }

        let root = self.options.working_root();
        Ok(ResolveResult::file(&resolve_specifier(
            specifier, importer, &root,
        )))
    }

    /// Load a resolved module and record its watch files.
    pub async fn load(&self, module: &ResolveResult) -> Result<LoadResult> {
        let result = match self.table.load(module.into()).await? {
            Some(result) => result,
            None if module.namespace == FILE_NAMESPACE => load_from_disk(&module.path).await?,
            None => {
                return Err(Error::NoLoader {
                    path: module.path.clone(),
                    namespace: module.namespace.clone(),
                });
            }
        };

        self.watch.write().record(module, &result.watch_files);
        crate::debug!(
            "build";
            "loaded {} ({}, {} watch files)",
            module.path,
            result.loader.as_str(),
            result.watch_files.len()
        );
        Ok(result)
    }

    /// Modules to reload after `file` changed.
    pub fn invalidated_by(&self, file: &Path) -> Vec<ResolveResult> {
        self.watch.read().invalidated_by(file)
    }

    /// Read access to the watch graph.
    pub fn with_watch_graph<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&WatchGraph) -> R,
    {
        f(&self.watch.read())
    }

    /// End the build session. Later calls are no-ops.
    pub async fn dispose(&self) -> Result<()> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        crate::debug!("build"; "disposing {} plugins", self.plugins.len());
        self.table.dispose().await
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Run `f` against this host, then dispose on every exit path.
    ///
    /// An error from `f` wins over a dispose error.
    pub async fn scoped<T, E, F>(self, f: F) -> std::result::Result<T, E>
    where
        E: From<Error>,
        F: for<'a> FnOnce(&'a BuildHost) -> BoxFuture<'a, std::result::Result<T, E>>,
    {
        let outcome = f(&self).await;
        let disposed = self.dispose().await;
        match (outcome, disposed) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e.into()),
            (Ok(value), Ok(())) => Ok(value),
        }
    }
}

/// Default loading: read the file as-is and watch only itself.
async fn load_from_disk(path: &str) -> Result<LoadResult> {
    let path = Path::new(path);
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Io(path.to_path_buf(), e))?;

    let mut result = LoadResult::new(contents, Loader::from_path(path))
        .with_watch_files(vec![path.to_path_buf()]);
    if let Some(dir) = path.parent() {
        result = result.with_resolve_dir(dir);
    }
    Ok(result)
}

#[cfg(test)]
mod tests;
