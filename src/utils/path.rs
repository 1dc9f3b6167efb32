//! Path normalization utilities.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `root_relative` - forward-slash path relative to a project root
//! - `resolve_specifier` - relative import specifier to absolute path
//! - `probe_module` - extension and index file lookup for module paths

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Lexically cleaned path if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            clean(path)
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| clean(&cwd.join(path)))
        }
    })
}

/// Lexically remove `.` and `..` components.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path of `path` relative to `root`, always with `/` separators.
///
/// Paths outside `root` are returned whole.
pub fn root_relative(root: &Path, path: &Path) -> String {
    let Ok(relative) = path.strip_prefix(root) else {
        return path.to_string_lossy().replace('\\', "/");
    };
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether an import specifier is relative (`./x`, `../x`).
#[inline]
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Resolve a specifier against the importer's directory or a fallback root.
///
/// Absolute specifiers are kept, everything else is joined and cleaned.
pub fn resolve_specifier(specifier: &str, importer: Option<&Path>, root: &Path) -> PathBuf {
    let spec = Path::new(specifier);
    if spec.is_absolute() {
        return clean(spec);
    }
    let base = match importer.and_then(Path::parent) {
        Some(dir) if is_relative_specifier(specifier) => dir,
        _ => root,
    };
    clean(&base.join(spec))
}

/// Extensions tried for extension-less module paths, in order.
pub const MODULE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Existing file for a module path: as written, with an extension
/// appended, or as a directory index.
pub fn probe_module(base: &Path) -> Option<PathBuf> {
    if base.is_file() {
        return Some(base.to_path_buf());
    }
    let name = base.file_name()?.to_string_lossy().into_owned();
    MODULE_EXTENSIONS
        .iter()
        .map(|ext| base.with_file_name(format!("{name}.{ext}")))
        .chain(
            MODULE_EXTENSIONS
                .iter()
                .map(|ext| base.join(format!("index.{ext}"))),
        )
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_absolute_cleans() {
        let normalized = normalize_path(Path::new("/nonexistent/a/../b/./c.ts"));
        assert_eq!(normalized, PathBuf::from("/nonexistent/b/c.ts"));
    }

    #[test]
    fn test_root_relative() {
        let root = Path::new("/site");
        assert_eq!(
            root_relative(root, Path::new("/site/src/button.css.ts")),
            "src/button.css.ts"
        );
        assert_eq!(root_relative(root, Path::new("/other/x.ts")), "/other/x.ts");
    }

    #[test]
    fn test_resolve_specifier() {
        let root = Path::new("/site");
        let importer = Path::new("/site/src/app.ts");
        assert_eq!(
            resolve_specifier("./theme.css.ts", Some(importer), root),
            PathBuf::from("/site/src/theme.css.ts")
        );
        assert_eq!(
            resolve_specifier("../lib/x.ts", Some(importer), root),
            PathBuf::from("/site/lib/x.ts")
        );
        assert_eq!(
            resolve_specifier("src/app.ts", None, root),
            PathBuf::from("/site/src/app.ts")
        );
        assert_eq!(
            resolve_specifier("/abs/x.ts", Some(importer), root),
            PathBuf::from("/abs/x.ts")
        );
    }

    #[test]
    fn test_probe_module() {
        let temp = tempfile::TempDir::new().unwrap();
        let theme = temp.path().join("theme.css.ts");
        let index = temp.path().join("tokens/index.js");
        std::fs::create_dir_all(index.parent().unwrap()).unwrap();
        std::fs::write(&theme, "").unwrap();
        std::fs::write(&index, "").unwrap();

        assert_eq!(probe_module(&theme), Some(theme.clone()));
        assert_eq!(probe_module(&temp.path().join("theme.css")), Some(theme));
        assert_eq!(probe_module(&temp.path().join("tokens")), Some(index));
        assert_eq!(probe_module(&temp.path().join("missing")), None);
    }
}
