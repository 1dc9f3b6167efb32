//! Watch-file tracking for incremental rebuilds.
//!
//! Every load that reports watch files is recorded here so the host can
//! answer "which modules must be reloaded when this file changes".
//!
//! # Invariants
//! - Forward and reverse mappings are always consistent
//! - Watch paths are normalized for reliable matching
//! - Re-recording a module replaces its previous watch set

use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use super::ResolveResult;
use crate::utils::path::normalize_path;

type PathSet = FxHashSet<PathBuf>;

/// Bidirectional mapping between modules and the files they watch.
#[derive(Debug, Default)]
pub struct WatchGraph {
    /// Forward: module → files that influenced its content
    forward: FxHashMap<ResolveResult, PathSet>,
    /// Reverse: file → modules to invalidate when it changes
    reverse: FxHashMap<PathBuf, FxHashSet<ResolveResult>>,
}

impl WatchGraph {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the watch set of a module, replacing any previous one.
    pub fn record(&mut self, module: &ResolveResult, watch_files: &[PathBuf]) {
        self.remove(module);

        let files: PathSet = watch_files.iter().map(|p| normalize_path(p)).collect();
        for file in &files {
            self.reverse
                .entry(file.clone())
                .or_default()
                .insert(module.clone());
        }
        self.forward.insert(module.clone(), files);
    }

    /// Modules whose content depends on `file`.
    pub fn invalidated_by(&self, file: &Path) -> Vec<ResolveResult> {
        let file = normalize_path(file);
        let mut modules: Vec<_> = self
            .reverse
            .get(&file)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        modules.sort_by(|a, b| a.path.cmp(&b.path));
        modules
    }

    /// Every watched file across all modules.
    pub fn all_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<_> = self.reverse.keys().cloned().collect();
        files.sort();
        files
    }

    #[inline]
    pub fn module_count(&self) -> usize {
        self.forward.len()
    }

    /// Drop a module and clean up its reverse mappings.
    pub fn remove(&mut self, module: &ResolveResult) {
        let Some(old_files) = self.forward.remove(module) else {
            return;
        };

        for file in old_files {
            if let Some(dependents) = self.reverse.get_mut(&file) {
                dependents.remove(module);
                if dependents.is_empty() {
                    self.reverse.remove(&file);
                }
            }
        }
    }
}
