use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tempfile::TempDir;

use super::*;
use crate::compiler::{
    CompilerOptions, CompilerSession, CssResult, ProcessOptions, ProcessedFile,
};
use crate::error::Error;
use crate::hooks::css::from_fn;
use crate::host::{BoxFuture, BuildHost, FILE_NAMESPACE, InitialOptions, Loader, ResolveResult};
use crate::utils::path::root_relative;

// ============================================================================
// Scripted compiler
// ============================================================================

#[derive(Default)]
struct Calls {
    opened: AtomicUsize,
    closed: AtomicUsize,
    processed: AtomicUsize,
    options: Mutex<Option<CompilerOptions>>,
}

/// Treats every `*.css.ts` file as defining one `button_abc123` rule.
struct FakeCompiler {
    calls: Arc<Calls>,
}

struct FakeSession {
    root: PathBuf,
    calls: Arc<Calls>,
    css: Mutex<FxHashMap<String, CssResult>>,
}

impl StyleCompiler for FakeCompiler {
    fn open(&self, options: CompilerOptions) -> Result<Arc<dyn CompilerSession>> {
        self.calls.opened.fetch_add(1, Ordering::SeqCst);
        *self.calls.options.lock() = Some(options.clone());
        Ok(Arc::new(FakeSession {
            root: options.root,
            calls: self.calls.clone(),
            css: Mutex::new(FxHashMap::default()),
        }))
    }
}

impl CompilerSession for FakeSession {
    fn get_css_for_file(&self, root_relative_path: &str) -> Result<CssResult> {
        self.css
            .lock()
            .get(root_relative_path)
            .cloned()
            .ok_or_else(|| Error::unknown_css_target(root_relative_path))
    }

    fn process_file(
        &self,
        path: &Path,
        options: ProcessOptions,
    ) -> BoxFuture<'static, Result<Option<ProcessedFile>>> {
        if !path.to_string_lossy().ends_with(".css.ts") {
            return Box::pin(async { Ok(None) });
        }
        self.calls.processed.fetch_add(1, Ordering::SeqCst);

        let rel = root_relative(&self.root, path);
        self.css.lock().insert(
            rel.clone(),
            CssResult {
                css: ".button_abc123{color:red}".into(),
                source_file_path: path.to_path_buf(),
            },
        );

        let mut source = String::new();
        if options.output_css {
            source.push_str(&format!("import \"{}\";\n", VirtualCssPath::format(&rel)));
        }
        source.push_str("export var button = \"button_abc123\";\n");
        let watch_files = BTreeSet::from([path.to_path_buf(), self.root.join("theme.css.ts")]);

        Box::pin(async move {
            Ok(Some(ProcessedFile {
                source: Some(source),
                watch_files,
            }))
        })
    }

    fn close(&self) -> BoxFuture<'static, Result<()>> {
        self.calls.closed.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }
}

// ============================================================================
// Helpers
// ============================================================================

struct Fixture {
    temp: TempDir,
    calls: Arc<Calls>,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("styles.css.ts"), "export const button = style({});")
            .unwrap();
        std::fs::write(temp.path().join("app.ts"), "console.log('plain');").unwrap();
        Self {
            temp,
            calls: Arc::new(Calls::default()),
        }
    }

    fn root(&self) -> &Path {
        self.temp.path()
    }

    fn options(&self) -> PluginOptions {
        PluginOptions {
            compiler: Arc::new(FakeCompiler {
                calls: self.calls.clone(),
            }),
            ..PluginOptions::default()
        }
    }

    fn host(&self, options: PluginOptions, minify: bool) -> BuildHost {
        let mut host = BuildHost::new(InitialOptions {
            abs_working_dir: Some(self.root().to_path_buf()),
            minify,
        });
        host.register(vanilla_extract_plugin(options).as_ref()).unwrap();
        host
    }

    fn file(&self, name: &str) -> ResolveResult {
        ResolveResult::file(&self.root().join(name))
    }

    fn opened(&self) -> usize {
        self.calls.opened.load(Ordering::SeqCst)
    }

    fn closed(&self) -> usize {
        self.calls.closed.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Session manager
// ============================================================================

#[tokio::test]
async fn test_session_root_and_debug_identifiers() {
    let fx = Fixture::new();
    let _host = fx.host(fx.options(), false);

    assert_eq!(fx.opened(), 1);
    let options = fx.calls.options.lock().clone().unwrap();
    assert_eq!(options.root, fx.root());
    assert_eq!(options.identifiers, IdentifierMode::Debug);
}

#[tokio::test]
async fn test_minify_selects_short_identifiers() {
    let fx = Fixture::new();
    let _host = fx.host(fx.options(), true);

    let options = fx.calls.options.lock().clone().unwrap();
    assert_eq!(options.identifiers, IdentifierMode::Short);
}

#[tokio::test]
async fn test_explicit_identifiers_win() {
    let fx = Fixture::new();
    let options = PluginOptions {
        identifiers: Some(IdentifierMode::Debug),
        ..fx.options()
    };
    let _host = fx.host(options, true);

    let options = fx.calls.options.lock().clone().unwrap();
    assert_eq!(options.identifiers, IdentifierMode::Debug);
}

#[tokio::test]
async fn test_dispose_closes_once_without_any_loads() {
    let fx = Fixture::new();
    let host = fx.host(fx.options(), false);

    host.dispose().await.unwrap();
    host.dispose().await.unwrap();
    assert_eq!(fx.closed(), 1);
}

#[tokio::test]
async fn test_loads_after_dispose_fail_with_session_closed() {
    let fx = Fixture::new();
    let host = fx.host(fx.options(), false);
    host.dispose().await.unwrap();

    let err = host.load(&fx.file("styles.css.ts")).await.unwrap_err();
    assert!(matches!(err, Error::SessionClosed));
}

#[tokio::test]
async fn test_dropped_host_closes_session() {
    let fx = Fixture::new();
    drop(fx.host(fx.options(), false));

    for _ in 0..3 {
        tokio::task::yield_now().await;
    }
    assert_eq!(fx.closed(), 1);
}

// ============================================================================
// Loaders
// ============================================================================

#[tokio::test]
async fn test_plain_file_passes_through() {
    let fx = Fixture::new();
    let host = fx.host(fx.options(), false);

    let loaded = host.load(&fx.file("app.ts")).await.unwrap();
    assert_eq!(loaded.contents, "console.log('plain');");
    assert_eq!(loaded.loader, Loader::Ts);
}

#[tokio::test]
async fn test_style_file_rewritten_with_watch_files() {
    let fx = Fixture::new();
    let host = fx.host(fx.options(), false);

    let loaded = host.load(&fx.file("styles.css.ts")).await.unwrap();
    assert_eq!(loaded.loader, Loader::Js);
    assert!(loaded.contents.contains("button_abc123"));
    assert!(loaded.contents.contains("styles.css.ts.vanilla.css"));
    assert_eq!(
        loaded.watch_files,
        vec![fx.root().join("styles.css.ts"), fx.root().join("theme.css.ts")]
    );

    // a dependency change invalidates the style module
    assert_eq!(
        host.invalidated_by(&fx.root().join("theme.css.ts")),
        vec![fx.file("styles.css.ts")]
    );
}

#[tokio::test]
async fn test_repeated_load_is_idempotent() {
    let fx = Fixture::new();
    let host = fx.host(fx.options(), false);

    let first = host.load(&fx.file("styles.css.ts")).await.unwrap();
    let second = host.load(&fx.file("styles.css.ts")).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_output_css_false_omits_virtual_import() {
    let fx = Fixture::new();
    let options = PluginOptions {
        output_css: false,
        ..fx.options()
    };
    let host = fx.host(options, false);

    let loaded = host.load(&fx.file("styles.css.ts")).await.unwrap();
    assert!(loaded.contents.contains("button_abc123"));
    assert!(!loaded.contents.contains(CSS_MARKER));
}

#[tokio::test]
async fn test_virtual_css_resolves_and_loads_beside_source() {
    let fx = Fixture::new();
    let host = fx.host(fx.options(), false);
    let importer = fx.root().join("styles.css.ts");

    host.load(&fx.file("styles.css.ts")).await.unwrap();
    let resolved = host
        .resolve("styles.css.ts.vanilla.css", Some(&importer))
        .await
        .unwrap();
    assert_eq!(
        resolved,
        ResolveResult::new("styles.css.ts.vanilla.css", VIRTUAL_NAMESPACE)
    );

    let css = host.load(&resolved).await.unwrap();
    assert_eq!(css.contents, ".button_abc123{color:red}");
    assert_eq!(css.loader, Loader::Css);
    assert_eq!(css.resolve_dir.as_deref(), Some(fx.root()));
}

#[tokio::test]
async fn test_css_for_unprocessed_file_fails() {
    let fx = Fixture::new();
    let host = fx.host(fx.options(), false);

    let resolved = host.resolve("never.css.ts.vanilla.css", None).await.unwrap();
    let err = host.load(&resolved).await.unwrap_err();
    assert!(matches!(err, Error::UnknownCssTarget { .. }));
    assert_eq!(err.to_string(), "No CSS for file: never.css.ts");
}

#[tokio::test]
async fn test_malformed_virtual_path_rejected() {
    let fx = Fixture::new();
    let host = fx.host(fx.options(), false);

    let resolved = host
        .resolve("a.vanilla.css/styles.css.ts.vanilla.css", None)
        .await
        .unwrap();
    let err = host.load(&resolved).await.unwrap_err();
    assert!(matches!(err, Error::InvalidVirtualPath(_)));
}

#[tokio::test]
async fn test_process_css_applied() {
    let fx = Fixture::new();
    let options = PluginOptions {
        process_css: Some(from_fn(|css| async move { Ok(css.to_uppercase()) })),
        ..fx.options()
    };
    let host = fx.host(options, false);

    host.load(&fx.file("styles.css.ts")).await.unwrap();
    let resolved = host.resolve("styles.css.ts.vanilla.css", None).await.unwrap();
    let css = host.load(&resolved).await.unwrap();
    assert_eq!(css.contents, ".BUTTON_ABC123{COLOR:RED}");
}

#[tokio::test]
async fn test_process_css_failure_propagates() {
    let fx = Fixture::new();
    let options = PluginOptions {
        process_css: Some(from_fn(|_| async {
            Err(anyhow::anyhow!("unknown word").context("postcss failed"))
        })),
        ..fx.options()
    };
    let host = fx.host(options, false);

    host.load(&fx.file("styles.css.ts")).await.unwrap();
    let resolved = host.resolve("styles.css.ts.vanilla.css", None).await.unwrap();
    let err = host.load(&resolved).await.unwrap_err();
    assert_eq!(err.to_string(), "postcss failed");
    let Error::PostProcessFailure(inner) = &err else {
        panic!("expected post-process failure, got {err:?}");
    };
    assert_eq!(inner.root_cause().to_string(), "unknown word");
}

// ============================================================================
// Runtime mode
// ============================================================================

#[tokio::test]
async fn test_runtime_mode_opens_no_session() {
    let fx = Fixture::new();
    let options = PluginOptions {
        runtime: true,
        ..fx.options()
    };
    let host = fx.host(options, false);
    assert_eq!(host.plugins(), ["vanilla-extract-runtime".to_string()]);

    // no virtual namespace
    let resolved = host.resolve("styles.css.ts.vanilla.css", None).await.unwrap();
    assert_eq!(resolved.namespace, FILE_NAMESPACE);

    let loaded = host.load(&fx.file("styles.css.ts")).await.unwrap();
    assert!(loaded.contents.contains("setFileScope(\"styles.css.ts\""));
    assert!(loaded.contents.contains("style({}, \"button\")"));
    assert_eq!(loaded.loader, Loader::Ts);

    host.dispose().await.unwrap();
    assert_eq!(fx.opened(), 0);
    assert_eq!(fx.closed(), 0);
    assert_eq!(fx.calls.processed.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Bundled compiler end to end
// ============================================================================

#[tokio::test]
async fn test_inline_compiler_scenario() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("src/styles.css.ts");
    std::fs::create_dir_all(file.parent().unwrap()).unwrap();
    std::fs::write(&file, "export const button = style({ color: 'red' });").unwrap();

    let mut host = BuildHost::new(InitialOptions {
        abs_working_dir: Some(temp.path().to_path_buf()),
        minify: false,
    });
    host.register(vanilla_extract_plugin(PluginOptions::default()).as_ref())
        .unwrap();

    let js = host.load(&ResolveResult::file(&file)).await.unwrap();
    assert!(js.contents.starts_with("import \"src/styles.css.ts.vanilla.css\";"));
    assert!(js.watch_files.contains(&file));

    let resolved = host
        .resolve("src/styles.css.ts.vanilla.css", Some(&file))
        .await
        .unwrap();
    let css = host.load(&resolved).await.unwrap();
    assert!(css.contents.starts_with(".styles_button__"));
    assert!(css.contents.contains("color: red;"));
    assert_eq!(css.resolve_dir.as_deref(), file.parent());

    host.dispose().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_loads_share_one_session() {
    let temp = TempDir::new().unwrap();
    let names = ["a", "b", "c", "d", "e"];
    for name in names {
        let file = temp.path().join(format!("src/{name}.css.ts"));
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(
            &file,
            format!("export const {name} = style({{ color: '{name}' }});\n"),
        )
        .unwrap();
    }

    let mut host = BuildHost::new(InitialOptions {
        abs_working_dir: Some(temp.path().to_path_buf()),
        minify: false,
    });
    host.register(vanilla_extract_plugin(PluginOptions::default()).as_ref())
        .unwrap();
    let host = Arc::new(host);

    // every file twice, all in flight at once
    let mut tasks = tokio::task::JoinSet::new();
    for name in names.iter().chain(names.iter()) {
        let host = host.clone();
        let rel = format!("src/{name}.css.ts");
        let file = temp.path().join(&rel);
        tasks.spawn(async move {
            let js = host.load(&ResolveResult::file(&file)).await?;
            let css = host
                .load(&ResolveResult::new(VirtualCssPath::format(&rel), VIRTUAL_NAMESPACE))
                .await?;
            Ok::<_, Error>((rel, js.contents, css.contents))
        });
    }

    let mut results: FxHashMap<String, Vec<(String, String)>> = FxHashMap::default();
    while let Some(joined) = tasks.join_next().await {
        let (rel, js, css) = joined.unwrap().unwrap();
        results.entry(rel).or_default().push((js, css));
    }

    assert_eq!(results.len(), names.len());
    for name in names {
        let outputs = &results[&format!("src/{name}.css.ts")];
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0], outputs[1]);
        let (js, css) = &outputs[0];
        assert!(js.contains(&format!("export var {name} = ")));
        assert!(css.contains(&format!("color: {name};")));
    }

    host.dispose().await.unwrap();
}
