use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use regex::Regex;
use tempfile::TempDir;

use super::BuildHost;
use crate::error::{Error, Result};
use crate::host::{
    FILE_NAMESPACE, Filter, InitialOptions, LoadResult, Loader, Plugin, PluginBuild,
    ResolveResult,
};

/// Redirects `virtual:*` into its own namespace and counts disposals.
struct VirtualPlugin {
    disposed: Arc<AtomicUsize>,
}

impl Plugin for VirtualPlugin {
    fn name(&self) -> &str {
        "virtual"
    }

    fn setup(&self, build: &mut PluginBuild<'_>) -> Result<()> {
        build.on_resolve(Filter::new(Regex::new("^virtual:").unwrap()), |args| {
            Box::pin(async move { Ok(Some(ResolveResult::new(args.path, "virtual-ns"))) })
        });
        build.on_load(Filter::any().namespace("virtual-ns"), |args| {
            Box::pin(async move {
                Ok(Some(LoadResult::new(
                    format!("/* {} */", args.path),
                    Loader::Css,
                )))
            })
        });

        let disposed = self.disposed.clone();
        build.on_dispose(move || {
            Box::pin(async move {
                disposed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        });
        Ok(())
    }
}

fn host_in(dir: &Path) -> (BuildHost, Arc<AtomicUsize>) {
    let disposed = Arc::new(AtomicUsize::new(0));
    let mut host = BuildHost::new(InitialOptions {
        abs_working_dir: Some(dir.to_path_buf()),
        minify: false,
    });
    host.register(&VirtualPlugin {
        disposed: disposed.clone(),
    })
    .unwrap();
    (host, disposed)
}

#[tokio::test]
async fn test_plugin_resolver_claims_matching_specifier() {
    let temp = TempDir::new().unwrap();
    let (host, _) = host_in(temp.path());

    let resolved = host.resolve("virtual:theme", None).await.unwrap();
    assert_eq!(resolved, ResolveResult::new("virtual:theme", "virtual-ns"));

    let loaded = host.load(&resolved).await.unwrap();
    assert_eq!(loaded.contents, "/* virtual:theme */");
    assert_eq!(loaded.loader, Loader::Css);
    assert_eq!(host.plugins(), ["virtual".to_string()]);
}

#[tokio::test]
async fn test_default_resolution_and_loading() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(src.join("app.js"), "console.log(1);").unwrap();
    let (host, _) = host_in(temp.path());

    let resolved = host.resolve("src/app.js", None).await.unwrap();
    assert_eq!(resolved.namespace, FILE_NAMESPACE);
    assert_eq!(PathBuf::from(&resolved.path), src.join("app.js"));

    let loaded = host.load(&resolved).await.unwrap();
    assert_eq!(loaded.contents, "console.log(1);");
    assert_eq!(loaded.loader, Loader::Js);
    assert_eq!(loaded.resolve_dir, Some(src.clone()));
    assert_eq!(host.invalidated_by(&src.join("app.js")), vec![resolved]);
}

#[tokio::test]
async fn test_relative_resolution_uses_importer_dir() {
    let temp = TempDir::new().unwrap();
    let (host, _) = host_in(temp.path());
    let importer = temp.path().join("src/app.js");

    let resolved = host.resolve("./util.js", Some(&importer)).await.unwrap();
    assert_eq!(
        PathBuf::from(resolved.path),
        temp.path().join("src/util.js")
    );
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let (host, _) = host_in(temp.path());

    let resolved = host.resolve("missing.js", None).await.unwrap();
    let err = host.load(&resolved).await.unwrap_err();
    assert!(matches!(err, Error::Io(..)));
}

#[tokio::test]
async fn test_unknown_namespace_has_no_loader() {
    let temp = TempDir::new().unwrap();
    let (host, _) = host_in(temp.path());

    let err = host
        .load(&ResolveResult::new("x", "elsewhere"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoLoader { .. }));
}

#[tokio::test]
async fn test_dispose_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let (host, disposed) = host_in(temp.path());

    host.dispose().await.unwrap();
    host.dispose().await.unwrap();
    assert!(host.is_disposed());
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_scoped_disposes_on_error() {
    let temp = TempDir::new().unwrap();
    let (host, disposed) = host_in(temp.path());

    let outcome: std::result::Result<(), Error> = host
        .scoped(|host| {
            Box::pin(async move {
                host.load(&ResolveResult::new("x", "elsewhere")).await?;
                Ok(())
            })
        })
        .await;

    assert!(matches!(outcome, Err(Error::NoLoader { .. })));
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_scoped_returns_value_and_disposes() {
    let temp = TempDir::new().unwrap();
    let (host, disposed) = host_in(temp.path());

    let value: std::result::Result<usize, Error> = host
        .scoped(|host| Box::pin(async move { Ok(host.plugins().len()) }))
        .await;

    assert_eq!(value.unwrap(), 1);
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
}
