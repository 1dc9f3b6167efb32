//! Build orchestration.
//!
//! Build pipeline phases:
//! - **Setup** - Open the build host and register the plugin
//! - **Walk** - Load entries, follow relative and `.vanilla.css` imports
//! - **Write** - One output per module, plus the concatenated CSS bundle
//! - **Watch** - Optional incremental rebuilds (see [`super::watch`])
//! - **Dispose** - Close the compiler session on every exit path

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Instant;

use anyhow::{Context, Result};
use regex::Regex;
use rustc_hash::FxHashSet;

use crate::config::VanillaConfig;
use crate::host::{BuildHost, FILE_NAMESPACE, InitialOptions, LoadResult, Loader, ResolveResult};
use crate::plugin::{CSS_MARKER, vanilla_extract_plugin};
use crate::utils::path::{is_relative_specifier, probe_module, root_relative};
use crate::{debug, log};

/// Static import and re-export specifiers.
static IMPORT_SPECIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*(?:import|export)\s+(?:[^'";]*?\bfrom\s*)?['"]([^'"]+)['"]"#).unwrap()
});

/// Run the `build` command: build once, optionally watch, always dispose.
pub async fn run(config: VanillaConfig) -> Result<()> {
    let mut host = BuildHost::new(InitialOptions {
        abs_working_dir: Some(config.get_root().to_path_buf()),
        minify: config.build.minify,
    });
    let plugin = vanilla_extract_plugin(config.plugin_options());
    host.register(plugin.as_ref())
        .with_context(|| format!("failed to set up plugin `{}`", plugin.name()))?;

    host.scoped(|host| {
        Box::pin(async move {
            let mut bundle = Bundle::default();
            build_once(host, &config, &mut bundle).await?;
            if config.watch {
                super::watch::watch(host, &config, &mut bundle).await?;
            }
            Ok(())
        })
    })
    .await
}

/// Load every entry and its graph, then write outputs.
pub async fn build_once(
    host: &BuildHost,
    config: &VanillaConfig,
    bundle: &mut Bundle,
) -> Result<()> {
    let start = Instant::now();
    let entries = config.build.entries.iter().map(|e| ResolveResult::file(e)).collect();

    let loaded = walk(host, entries, bundle).await?;
    let written = bundle.write(config)?;

    log!(
        "build";
        "{} modules, {} files written in {:.2?}",
        loaded,
        written,
        start.elapsed()
    );
    Ok(())
}

/// Load `start` and everything reachable from it, depth first.
///
/// Returns the number of modules loaded.
pub async fn walk(host: &BuildHost, start: Vec<ResolveResult>, bundle: &mut Bundle) -> Result<usize> {
    let mut seen = FxHashSet::default();
    let mut stack: Vec<_> = start.into_iter().rev().collect();
    let mut loaded = 0;

    while let Some(module) = stack.pop() {
        if !seen.insert(module.clone()) {
            continue;
        }
        let result = host
            .load(&module)
            .await
            .with_context(|| format!("failed to load `{}`", module.path))?;

        if matches!(result.loader, Loader::Js | Loader::Jsx | Loader::Ts | Loader::Tsx) {
            let importer = (module.namespace == FILE_NAMESPACE).then(|| PathBuf::from(&module.path));
            let mut children = Vec::new();
            for specifier in followed_imports(&result.contents) {
                children.push(resolve_module(host, specifier, importer.as_deref()).await?);
            }
            stack.extend(children.into_iter().rev());
        }

        debug!("build"; "loaded {} [{}]", module.path, module.namespace);
        bundle.insert(module, result);
        loaded += 1;
    }

    Ok(loaded)
}

/// Relative and virtual CSS imports; package imports are left to the consumer.
fn followed_imports(source: &str) -> impl Iterator<Item = &str> {
    IMPORT_SPECIFIER
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|spec| is_relative_specifier(spec) || spec.contains(CSS_MARKER))
}

/// Resolve through the host, then probe extensions for plain files.
async fn resolve_module(
    host: &BuildHost,
    specifier: &str,
    importer: Option<&Path>,
) -> Result<ResolveResult> {
    let resolved = host.resolve(specifier, importer).await?;
    if resolved.namespace != FILE_NAMESPACE {
        return Ok(resolved);
    }
    Ok(probe_module(Path::new(&resolved.path))
        .map(|path| ResolveResult::file(&path))
        .unwrap_or(resolved))
}

// ============================================================================
// Bundle
// ============================================================================

/// Loaded modules in first-load order.
#[derive(Debug, Default)]
pub struct Bundle {
    modules: Vec<(ResolveResult, LoadResult)>,
}

impl Bundle {
    /// Insert or replace a module, keeping its original position.
    pub fn insert(&mut self, module: ResolveResult, result: LoadResult) {
        match self.modules.iter_mut().find(|(m, _)| *m == module) {
            Some(slot) => slot.1 = result,
            None => self.modules.push((module, result)),
        }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// All CSS modules, in load order.
    pub fn css(&self) -> String {
        self.modules
            .iter()
            .filter(|(_, result)| result.loader == Loader::Css)
            .map(|(module, result)| format!("/* {} */\n{}", module.path, result.contents))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write module outputs and the CSS bundle. Returns files written.
    pub fn write(&self, config: &VanillaConfig) -> Result<usize> {
        let outdir = &config.build.outdir;
        let mut written = 0;

        for (module, result) in &self.modules {
            if module.namespace != FILE_NAMESPACE {
                continue;
            }
            let target = outdir.join(output_name(config.get_root(), module, result));
            write_file(&target, &result.contents)?;
            written += 1;
        }

        let css = self.css();
        if !css.is_empty() {
            write_file(&config.build.css_bundle_path(), &css)?;
            written += 1;
        }
        Ok(written)
    }
}

/// Root-relative output name; rewritten modules get a `.js` suffix.
fn output_name(root: &Path, module: &ResolveResult, result: &LoadResult) -> String {
    let rel = root_relative(root, Path::new(&module.path));
    let rel = rel.trim_start_matches('/').to_string();
    if result.loader == Loader::Js && !rel.ends_with(".js") {
        format!("{rel}.js")
    } else {
        rel
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create `{}`", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write `{}`", path.display()))
}
