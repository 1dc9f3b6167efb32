//! Import following for watch files.
//!
//! Only relative imports are followed; package imports are treated as
//! stable for the lifetime of a session.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::parse::scan_imports;
use crate::utils::path::{clean, is_relative_specifier, probe_module};

/// Resolve a relative import to an existing file.
pub(super) fn resolve_import(importer: &Path, specifier: &str) -> Option<PathBuf> {
    if !is_relative_specifier(specifier) {
        return None;
    }
    probe_module(&clean(&importer.parent()?.join(specifier)))
}

/// `entry` plus every file reachable through relative imports.
///
/// Unreadable dependencies are still watched, but not descended into.
pub(super) fn collect_watch_files(entry: &Path, imports: &[String]) -> BTreeSet<PathBuf> {
    let mut seen = BTreeSet::from([entry.to_path_buf()]);
    let mut stack: Vec<PathBuf> = imports
        .iter()
        .filter_map(|spec| resolve_import(entry, spec))
        .collect();

    while let Some(file) = stack.pop() {
        if !seen.insert(file.clone()) {
            continue;
        }
        let Ok(source) = fs::read_to_string(&file) else {
            continue;
        };
        stack.extend(
            scan_imports(&source)
                .iter()
                .filter_map(|spec| resolve_import(&file, spec)),
        );
    }

    seen
}
