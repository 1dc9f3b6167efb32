//! Handler dispatch table.
//!
//! Handlers run in registration order; the first one returning `Some`
//! wins. `Ok(None)` declines and lets the next handler (or the host's
//! default behavior) take the request.

use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use regex::Regex;

use super::{BoxFuture, LoadArgs, LoadResult, ResolveArgs, ResolveResult};
use crate::error::Result;

pub type ResolveHandler =
    Arc<dyn Fn(ResolveArgs) -> BoxFuture<'static, Result<Option<ResolveResult>>> + Send + Sync>;
pub type LoadHandler =
    Arc<dyn Fn(LoadArgs) -> BoxFuture<'static, Result<Option<LoadResult>>> + Send + Sync>;
pub type DisposeHandler = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

static CATCH_ALL: LazyLock<Regex> = LazyLock::new(|| Regex::new(".*").unwrap());

/// Path pattern plus optional namespace restriction.
#[derive(Debug, Clone)]
pub struct Filter {
    pattern: Regex,
    namespace: Option<String>,
}

impl Filter {
    /// Match any namespace.
    pub fn new(pattern: Regex) -> Self {
        Self {
            pattern,
            namespace: None,
        }
    }

    /// Match `.*` in every namespace.
    pub fn any() -> Self {
        Self::new(CATCH_ALL.clone())
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn matches(&self, path: &str, namespace: &str) -> bool {
        self.namespace.as_deref().is_none_or(|ns| ns == namespace) && self.pattern.is_match(path)
    }
}

/// Registered handlers for one build.
#[derive(Default)]
pub struct HandlerTable {
    resolvers: Vec<(Filter, ResolveHandler)>,
    loaders: Vec<(Filter, LoadHandler)>,
    disposers: Mutex<Vec<DisposeHandler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_resolver(&mut self, filter: Filter, handler: ResolveHandler) {
        self.resolvers.push((filter, handler));
    }

    pub fn add_loader(&mut self, filter: Filter, handler: LoadHandler) {
        self.loaders.push((filter, handler));
    }

    pub fn add_disposer(&mut self, handler: DisposeHandler) {
        self.disposers.get_mut().push(handler);
    }

    /// Run matching resolvers until one claims the request.
    pub async fn resolve(&self, args: ResolveArgs) -> Result<Option<ResolveResult>> {
        for (filter, handler) in &self.resolvers {
            if !filter.matches(&args.path, &args.namespace) {
                continue;
            }
            if let Some(result) = handler(args.clone()).await? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Run matching loaders until one claims the request.
    pub async fn load(&self, args: LoadArgs) -> Result<Option<LoadResult>> {
        for (filter, handler) in &self.loaders {
            if !filter.matches(&args.path, &args.namespace) {
                continue;
            }
            if let Some(result) = handler(args.clone()).await? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Run every dispose handler once, in registration order.
    ///
    /// All handlers run even if one fails; the first error is returned.
    pub async fn dispose(&self) -> Result<()> {
        let handlers = std::mem::take(&mut *self.disposers.lock());
        let mut first_err = None;
        for handler in handlers {
            if let Err(e) = handler().await {
                crate::log!("error"; "dispose failed: {}", e);
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }

    pub fn loader_count(&self) -> usize {
        self.loaders.len()
    }
}
