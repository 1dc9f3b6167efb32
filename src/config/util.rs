//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`
///
/// Walks up parent directories until finding `config_name`.
/// Absolute `config_name` paths are returned as-is when they exist.
///
/// # Example
/// ```text
/// /home/user/app/src/components/  ← start
/// /home/user/app/vanilla.toml     ← found!
/// ```
pub fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.exists())
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("src/components");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join("vanilla.toml"), "").unwrap();

        assert_eq!(
            find_config_file(&nested, Path::new("vanilla.toml")),
            Some(temp.path().join("vanilla.toml"))
        );
    }

    #[test]
    fn test_find_config_absolute() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("custom.toml");
        assert_eq!(find_config_file(Path::new("/"), &config), None);

        std::fs::write(&config, "").unwrap();
        assert_eq!(find_config_file(Path::new("/"), &config), Some(config));
    }
}
