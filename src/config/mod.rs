use std::path::PathBuf;

use serde::Deserialize;

use crate::paths;
use crate::scan::ScanConfig;

/// Optional user overrides loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    /// Scanner settings; any omitted field keeps its default.
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Search config paths for user overrides (first found wins).
///
/// Search order:
/// 1. `./.usacloud-update.toml` (project-local)
/// 2. `<config_dir>/usacloud-update/config.toml` (user-level)
pub fn load_user_config() -> Option<UserConfig> {
    load_user_config_from(&config_search_paths())
}

fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".usacloud-update.toml"));
    }

    if let Some(user) = paths::user_dir() {
        paths.push(user.join("config.toml"));
    }

    paths
}

/// Testable version that accepts explicit paths.
pub fn load_user_config_from(paths: &[PathBuf]) -> Option<UserConfig> {
    for path in paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            match toml::from_str(&content) {
                Ok(config) => return Some(config),
                Err(e) => {
                    eprintln!(
                        "[usacloud-update] warning: failed to parse {}: {e}",
                        path.display()
                    );
                    return None;
                }
            }
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn load_config_first_found_wins() {
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();

        let path1 = dir1.path().join("config.toml");
        let path2 = dir2.path().join("config.toml");

        fs::write(&path1, "[scan]\nmax_depth = 7\n").unwrap();
        fs::write(&path2, "[scan]\nmax_depth = 9\n").unwrap();

        let config = load_user_config_from(&[path1, path2]).unwrap();
        assert_eq!(config.scan.max_depth, 7);
    }

    #[test]
    fn load_config_nonexistent_returns_none() {
        let result = load_user_config_from(&[PathBuf::from("/no/such/file.toml")]);
        assert!(result.is_none());
    }

    #[test]
    fn load_config_invalid_toml_returns_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "not valid [[[").unwrap();

        let result = load_user_config_from(&[path]);
        assert!(result.is_none());
    }

    #[test]
    fn empty_config_uses_scan_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();

        let config = load_user_config_from(&[path]).unwrap();
        assert_eq!(config.scan.max_depth, 2);
        assert_eq!(config.scan.extensions, [".sh", ".bash"]);
    }

    #[test]
    fn partial_scan_table_overrides_named_fields_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[scan]\nmin_confidence = 0.8\nworkers = 2\n").unwrap();

        let config = load_user_config_from(&[path]).unwrap();
        assert!((config.scan.min_confidence - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.scan.workers, 2);
        assert_eq!(config.scan.max_depth, 2);
    }
}
