use serde::Deserialize;

/// Sort key for the final ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Importance,
    Path,
    Confidence,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Scanner settings. Every field has a default so a partial `[scan]` table
/// in the user config overrides only what it names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Extensions considered candidate scripts (case-insensitive).
    pub extensions: Vec<String>,

    /// Directory names never descended into.
    pub exclude_dirs: Vec<String>,

    /// File-name suffixes marking editor/backup artifacts (case-insensitive).
    pub backup_suffixes: Vec<String>,

    /// 0 = only files directly in the root.
    pub max_depth: usize,

    /// Files larger than this are classified binary without being read.
    pub max_file_size: u64,

    /// Confidence at or above which a file counts as a script.
    pub min_confidence: f64,

    /// Results below this importance are dropped from the report.
    pub min_importance: f64,

    /// Keep only high/critical results.
    pub only_high_priority: bool,

    /// Run pattern detection on binary files too (normally pointless).
    pub scan_binary_files: bool,

    pub follow_symlinks: bool,

    /// Worker threads for classification; 0 = available parallelism.
    pub workers: usize,

    /// Glob patterns; when non-empty, only matching paths are kept.
    pub include: Vec<String>,

    /// Glob patterns; matching paths are dropped from the report.
    pub exclude: Vec<String>,

    pub sort: SortKey,
    pub order: SortOrder,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".sh".to_string(), ".bash".to_string()],
            exclude_dirs: [
                "node_modules",
                ".git",
                ".svn",
                ".hg",
                "vendor",
                "bin",
                "build",
                "dist",
                ".vscode",
                ".idea",
                "__pycache__",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            backup_suffixes: [
                ".bak", ".backup", ".old", ".orig", ".save", "~", ".tmp", ".temp",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            max_depth: 2,
            max_file_size: 1024 * 1024,
            min_confidence: 0.5,
            min_importance: 0.0,
            only_high_priority: false,
            scan_binary_files: false,
            follow_symlinks: false,
            workers: 0,
            include: Vec::new(),
            exclude: Vec::new(),
            sort: SortKey::default(),
            order: SortOrder::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.extensions, [".sh", ".bash"]);
        assert_eq!(cfg.max_depth, 2);
        assert_eq!(cfg.max_file_size, 1024 * 1024);
        assert!((cfg.min_confidence - 0.5).abs() < f64::EPSILON);
        assert!(!cfg.follow_symlinks);
        assert!(!cfg.scan_binary_files);
        assert!(cfg.exclude_dirs.contains(&"node_modules".to_string()));
        assert!(cfg.exclude_dirs.contains(&"__pycache__".to_string()));
        assert_eq!(cfg.sort, SortKey::Importance);
        assert_eq!(cfg.order, SortOrder::Desc);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg: ScanConfig = toml::from_str("max_depth = 5\nmin_confidence = 0.9\n").unwrap();
        assert_eq!(cfg.max_depth, 5);
        assert!((cfg.min_confidence - 0.9).abs() < f64::EPSILON);
        assert_eq!(cfg.extensions, [".sh", ".bash"]);
    }

    #[test]
    fn sort_key_deserializes_kebab_case() {
        let cfg: ScanConfig = toml::from_str("sort = \"path\"\norder = \"asc\"\n").unwrap();
        assert_eq!(cfg.sort, SortKey::Path);
        assert_eq!(cfg.order, SortOrder::Asc);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let parsed: Result<ScanConfig, _> = toml::from_str("no_such_option = true\n");
        assert!(parsed.is_err());
    }
}
