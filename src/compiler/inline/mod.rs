//! Bundled static compiler.
//!
//! Evaluates the literal subset of style definition modules without a
//! JavaScript runtime. Results are cached per `(file, output_css)` and
//! reused while every watch file keeps its content hash.

mod css;
mod deps;
mod parse;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;

use super::ident::ClassNamer;
use super::{
    CompilerOptions, CompilerSession, CssResult, ProcessOptions, ProcessedFile, StyleCompiler,
    is_style_file,
};
use crate::error::{Error, Result};
use crate::host::BoxFuture;
use crate::utils::hash::ContentHash;
use crate::utils::path::root_relative;
use parse::{Item, Value};

/// Compiler that reads style files statically.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineCompiler;

impl StyleCompiler for InlineCompiler {
    fn open(&self, options: CompilerOptions) -> Result<Arc<dyn CompilerSession>> {
        crate::debug!(
            "session";
            "inline compiler opened at {} ({})",
            options.root.display(),
            options.identifiers.as_str()
        );
        Ok(Arc::new(InlineSession {
            state: Arc::new(SessionState {
                options,
                css: DashMap::new(),
                cache: DashMap::new(),
                closed: AtomicBool::new(false),
            }),
        }))
    }
}

struct InlineSession {
    state: Arc<SessionState>,
}

struct SessionState {
    options: CompilerOptions,
    /// Extracted CSS keyed by root-relative source path.
    css: DashMap<String, CssResult>,
    cache: DashMap<(PathBuf, bool), CachedFile>,
    closed: AtomicBool,
}

struct CachedFile {
    hashes: Vec<(PathBuf, ContentHash)>,
    result: ProcessedFile,
}

impl CachedFile {
    fn is_fresh(&self) -> bool {
        self.hashes
            .iter()
            .all(|(path, hash)| ContentHash::of_file(path).is_ok_and(|h| h == *hash))
    }
}

impl CompilerSession for InlineSession {
    fn get_css_for_file(&self, root_relative_path: &str) -> Result<CssResult> {
        self.state.ensure_open()?;
        self.state
            .css
            .get(root_relative_path)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::unknown_css_target(root_relative_path))
    }

    fn process_file(
        &self,
        path: &Path,
        options: ProcessOptions,
    ) -> BoxFuture<'static, Result<Option<ProcessedFile>>> {
        let state = self.state.clone();
        let path = path.to_path_buf();
        Box::pin(async move {
            state.ensure_open()?;
            if !is_style_file(&path.to_string_lossy()) {
                return Ok(None);
            }
            let task_path = path.clone();
            tokio::task::spawn_blocking(move || state.process(&task_path, options))
                .await
                .map_err(|e| Error::transform(&path, format!("compiler task failed: {e}")))?
        })
    }

    fn close(&self) -> BoxFuture<'static, Result<()>> {
        let state = self.state.clone();
        Box::pin(async move {
            if !state.closed.swap(true, Ordering::SeqCst) {
                state.css.clear();
                state.cache.clear();
                crate::debug!("session"; "inline compiler closed");
            }
            Ok(())
        })
    }
}

impl SessionState {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(Error::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn process(&self, path: &Path, options: ProcessOptions) -> Result<Option<ProcessedFile>> {
        // `?used` marks a re-request of the same file
        let path = strip_query(path);
        let key = (path.clone(), options.output_css);
        if let Some(hit) = self.cache.get(&key)
            && hit.is_fresh()
        {
            crate::debug!("session"; "cache hit: {}", path.display());
            return Ok(Some(hit.result.clone()));
        }

        let raw = fs::read_to_string(&path).map_err(|e| Error::Io(path.clone(), e))?;
        let source = self.apply_extensions(&path, &raw)?;
        let module = parse::parse_module(&source)
            .map_err(|e| Error::transform(&path, format!("{}:{}", path.display(), e)))?;

        let rel = root_relative(&self.options.root, &path);
        let mut namer = ClassNamer::new(self.options.identifiers, &rel);
        let mut rules = Vec::new();
        let mut exports = Vec::new();

        for item in &module.items {
            match item {
                Item::Style { name, object } => {
                    let class = namer.next(name);
                    css::flatten(&format!(".{class}"), object, None, &mut rules)
                        .map_err(|e| Error::transform(&path, format!("{rel}: `{name}`: {e}")))?;
                    exports.push((name.as_str(), js_string(&class)));
                }
                Item::Literal { name, value } => exports.push((name.as_str(), js_literal(value))),
                Item::Global { selector, object } => {
                    css::flatten(selector, object, None, &mut rules)
                        .map_err(|e| Error::transform(&path, format!("{rel}: `{selector}`: {e}")))?;
                }
            }
        }

        let css_text = css::render(&rules);
        let emit_import = options.output_css && !css_text.is_empty();
        self.css.insert(
            rel.clone(),
            CssResult {
                css: css_text,
                source_file_path: path.clone(),
            },
        );

        // keep style dependencies in the module graph so their CSS is reached
        let style_imports: Vec<&str> = module
            .imports
            .iter()
            .filter(|spec| {
                deps::resolve_import(&path, spec)
                    .is_some_and(|dep| is_style_file(&dep.to_string_lossy()))
            })
            .map(String::as_str)
            .collect();

        let result = ProcessedFile {
            source: Some(render_module(&rel, &style_imports, &exports, emit_import)),
            watch_files: deps::collect_watch_files(&path, &module.imports),
        };

        let hashes = result
            .watch_files
            .iter()
            .filter_map(|file| {
                let hash = if *file == path {
                    ContentHash::of(&raw)
                } else {
                    ContentHash::of_file(file).ok()?
                };
                Some((file.clone(), hash))
            })
            .collect();
        self.cache.insert(
            key,
            CachedFile {
                hashes,
                result: result.clone(),
            },
        );

        crate::debug!(
            "session";
            "processed {} ({} exports, {} watch files)",
            rel,
            exports.len(),
            result.watch_files.len()
        );
        Ok(Some(result))
    }

    fn apply_extensions(&self, path: &Path, raw: &str) -> Result<String> {
        let mut source = raw.to_string();
        for extension in &self.options.extensions {
            if let Some(transformed) = extension.transform(path, &source)? {
                crate::debug!("session"; "extension `{}` rewrote {}", extension.name(), path.display());
                source = transformed;
            }
        }
        Ok(source)
    }
}

fn strip_query(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    match text.split_once('?') {
        Some((file, _)) => PathBuf::from(file),
        None => path.to_path_buf(),
    }
}

/// JSON string syntax is valid JS string syntax.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn js_literal(value: &Value) -> String {
    match value {
        Value::Str(s) => js_string(s),
        Value::Num(n) => n.clone(),
        Value::Bool(b) => b.to_string(),
        // exports are scalars only
        Value::Object(_) => "{}".to_string(),
    }
}

/// Dependency imports first, then this file's CSS, then its exports.
fn render_module(
    rel: &str,
    style_imports: &[&str],
    exports: &[(&str, String)],
    emit_import: bool,
) -> String {
    let mut out = String::new();
    for spec in style_imports {
        out.push_str(&format!("import {};\n", js_string(spec)));
    }
    if emit_import {
        out.push_str(&format!("import {};\n", js_string(&format!("{rel}.vanilla.css"))));
    }
    for (name, value) in exports {
        out.push_str(&format!("export var {name} = {value};\n"));
    }
    out
}
