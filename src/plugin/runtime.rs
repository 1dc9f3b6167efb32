//! Runtime-only transform.
//!
//! Styles are created by the runtime in the browser, so no session, no
//! virtual namespace and no CSS output. Style files only get a file scope
//! and debug identifiers:
//!
//! ```text
//! import { setFileScope, endFileScope } from "@vanilla-extract/css/fileScope";
//! setFileScope("src/button.css.ts", "my-app");
//! export const root = style({ color: 'red' }, "root");
//! endFileScope();
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::compiler::STYLE_FILE;
use crate::error::{Error, Result};
use crate::host::{FILE_NAMESPACE, Filter, LoadResult, Loader, Plugin, PluginBuild};
use crate::utils::path::root_relative;

/// `const NAME = style(`, `styleVariants(` or `recipe(`.
static STYLE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:style|styleVariants|recipe)\(")
        .unwrap()
});

const FILE_SCOPE_IMPORT: &str =
    "import { setFileScope, endFileScope } from \"@vanilla-extract/css/fileScope\";";

/// Plugin used when styles are consumed at runtime.
#[derive(Debug, Default)]
pub struct RuntimePlugin;

impl Plugin for RuntimePlugin {
    fn name(&self) -> &str {
        "vanilla-extract-runtime"
    }

    fn setup(&self, build: &mut PluginBuild<'_>) -> Result<()> {
        let root = build.initial_options().working_root();
        build.on_load(
            Filter::new(STYLE_FILE.clone()).namespace(FILE_NAMESPACE),
            move |args| {
                let root = root.clone();
                Box::pin(async move { load_runtime(&root, Path::new(&args.path)).await })
            },
        );
        Ok(())
    }
}

async fn load_runtime(root: &Path, path: &Path) -> Result<Option<LoadResult>> {
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Io(path.to_path_buf(), e))?;

    let Some(contents) = add_file_scope(root, path, &source) else {
        return Ok(None);
    };

    let mut result = LoadResult::new(contents, Loader::from_path(path))
        .with_watch_files(vec![path.to_path_buf()]);
    if let Some(dir) = path.parent() {
        result = result.with_resolve_dir(dir);
    }
    Ok(Some(result))
}

/// Wrap a style file in its file scope. `None` if it already has one.
pub fn add_file_scope(root: &Path, path: &Path, source: &str) -> Option<String> {
    if source.contains("setFileScope") {
        return None;
    }
    let file_scope = serde_json::Value::String(root_relative(root, path));
    let package = serde_json::Value::String(package_name(path).unwrap_or_default());

    Some(format!(
        "{FILE_SCOPE_IMPORT}\nsetFileScope({file_scope}, {package});\n{}\nendFileScope();\n",
        add_debug_ids(source).trim_end()
    ))
}

/// Append `, "NAME"` to single-argument style calls assigned to `NAME`.
pub fn add_debug_ids(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut copied = 0;

    for caps in STYLE_CALL.captures_iter(source) {
        let (Some(call), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(shape) = scan_call(source, call.end()) else {
            continue;
        };
        if shape.args != 1 || shape.close < copied {
            continue;
        }

        out.push_str(&source[copied..shape.close]);
        let sep = if shape.trailing_comma { " " } else { ", " };
        out.push_str(&format!("{sep}\"{}\"", name.as_str()));
        copied = shape.close;
    }

    out.push_str(&source[copied..]);
    out
}

struct CallShape {
    /// Byte offset of the closing `)`.
    close: usize,
    args: usize,
    trailing_comma: bool,
}

/// Count top-level arguments of a call whose `(` ends just before `start`.
fn scan_call(source: &str, start: usize) -> Option<CallShape> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut commas = 0;
    let mut last = None;
    let mut quote = None;
    let mut i = start;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' | b'[' | b'{' => depth += 1,
            b')' if depth == 0 => {
                let trailing_comma = last == Some(b',');
                let args = match last {
                    None => 0,
                    Some(_) if trailing_comma => commas,
                    Some(_) => commas + 1,
                };
                return Some(CallShape {
                    close: i,
                    args,
                    trailing_comma,
                });
            }
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => commas += 1,
            _ => {}
        }
        if !b.is_ascii_whitespace() {
            last = Some(b);
        }
        i += 1;
    }

    None
}

#[derive(Deserialize)]
struct PackageJson {
    name: Option<String>,
}

/// `name` of the nearest `package.json` above `path`.
fn package_name(path: &Path) -> Option<String> {
    nearest_package_json(path).and_then(|manifest| {
        let text = fs::read_to_string(&manifest).ok()?;
        serde_json::from_str::<PackageJson>(&text).ok()?.name
    })
}

fn nearest_package_json(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .skip(1)
        .map(|dir| dir.join("package.json"))
        .find(|candidate| candidate.is_file())
}
