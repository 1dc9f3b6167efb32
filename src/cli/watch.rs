//! Watch mode: incremental rebuilds driven by the host's watch graph.
//!
//! ```text
//! notify ──> Debouncer ──> BuildHost::invalidated_by ──> walk ──> Bundle::write
//! ```
//!
//! Only modules whose recorded watch files changed are reloaded. A change
//! that touches no recorded file is reported as unchanged.

mod debouncer;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;

use super::build::{Bundle, walk};
use super::state::{is_shutdown, shutdown_signal};
use crate::config::VanillaConfig;
use crate::host::{BuildHost, ResolveResult};
use crate::logger::{status_error, status_success, status_unchanged};
use crate::utils::path::root_relative;
use debouncer::Debouncer;

/// Watch the project root until Ctrl+C.
pub async fn watch(host: &BuildHost, config: &VanillaConfig, bundle: &mut Bundle) -> Result<()> {
    let root = config.get_root();
    let mut shutdown = shutdown_signal();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) => {
                let _ = tx.send(event);
            }
            Err(e) => crate::log!("watch"; "notify error: {}", e),
        }
    })
    .context("failed to create file watcher")?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch `{}`", root.display()))?;

    let mut debouncer = Debouncer::new(vec![config.build.outdir.clone()]);
    let (modules, files) =
        host.with_watch_graph(|graph| (graph.module_count(), graph.all_files().len()));
    crate::log!(
        "watch";
        "watching {} ({} modules, {} tracked files)",
        root.display(),
        modules,
        files
    );

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            Some(event) = rx.recv() => debouncer.add_event(&event),
            _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                if let Some(changed) = debouncer.take_if_ready()
                    && !is_shutdown()
                {
                    rebuild(host, config, bundle, &changed).await;
                }
            }
        }
    }

    Ok(())
}

/// Reload modules affected by `changed` and rewrite outputs.
async fn rebuild(host: &BuildHost, config: &VanillaConfig, bundle: &mut Bundle, changed: &[PathBuf]) {
    let affected = affected_modules(host, changed);
    let names = display_names(config.get_root(), changed);

    if affected.is_empty() {
        status_unchanged(&format!("unchanged: {names}"));
        return;
    }

    let outcome = async {
        walk(host, affected, bundle).await?;
        bundle.write(config)
    }
    .await;

    match outcome {
        Ok(_) => status_success(&format!("rebuilt: {names}")),
        Err(e) => status_error(&format!("failed: {names}"), &format!("{e:#}")),
    }
}

/// Every module whose watch set contains one of `changed`, deduplicated.
fn affected_modules(host: &BuildHost, changed: &[PathBuf]) -> Vec<ResolveResult> {
    let mut seen = FxHashSet::default();
    changed
        .iter()
        .flat_map(|path| host.invalidated_by(path))
        .filter(|module| seen.insert(module.clone()))
        .collect()
}

fn display_names(root: &Path, changed: &[PathBuf]) -> String {
    changed
        .iter()
        .map(|p| root_relative(root, p).trim_start_matches('/').to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
