use std::path::{Path, PathBuf};

use serde::Serialize;

use super::config::ScanConfig;

/// A per-file failure collected during the walk. Never aborts the scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanError {
    pub path: PathBuf,
    pub message: String,
}

pub(crate) struct WalkOutcome {
    /// Files that passed the eligibility filter, in discovery order.
    pub candidates: Vec<PathBuf>,
    /// All regular files seen, eligible or not.
    pub total_files: usize,
    pub errors: Vec<ScanError>,
}

/// Collect candidate files under `root`.
///
/// Excluded directory names are skipped before descending; hidden entries
/// and backup suffixes are skipped; symlinks are followed only when
/// configured. A `root` that is itself a file bypasses the eligibility
/// filter — naming a file explicitly means the caller wants it scanned.
pub(crate) fn collect_candidates(root: &Path, config: &ScanConfig) -> WalkOutcome {
    let mut outcome = WalkOutcome {
        candidates: Vec::new(),
        total_files: 0,
        errors: Vec::new(),
    };

    if root.is_file() {
        outcome.total_files = 1;
        outcome.candidates.push(root.to_path_buf());
        return outcome;
    }

    walk_dir(root, 0, config, &mut outcome);
    outcome
}

fn walk_dir(dir: &Path, depth: usize, config: &ScanConfig, outcome: &mut WalkOutcome) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            outcome.errors.push(ScanError {
                path: dir.to_path_buf(),
                message: e.to_string(),
            });
            return;
        }
    };

    let mut entries: Vec<_> = entries.filter_map(Result::ok).collect();
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();

        if name.starts_with('.') {
            continue;
        }

        if !config.follow_symlinks
            && path
                .symlink_metadata()
                .is_ok_and(|m| m.file_type().is_symlink())
        {
            continue;
        }

        if path.is_dir() {
            if config.exclude_dirs.iter().any(|d| *d == name) {
                continue;
            }
            if depth < config.max_depth {
                walk_dir(&path, depth + 1, config, outcome);
            }
        } else if path.is_file() {
            outcome.total_files += 1;
            if is_eligible(&name, config) {
                outcome.candidates.push(path);
            }
        }
    }
}

/// Extension must be in the configured set and the name must not carry a
/// backup suffix. Hidden names are rejected by the walk before this runs.
fn is_eligible(name: &str, config: &ScanConfig) -> bool {
    let lowered = name.to_lowercase();
    if config
        .backup_suffixes
        .iter()
        .any(|suffix| lowered.ends_with(&suffix.to_lowercase()))
    {
        return false;
    }
    config
        .extensions
        .iter()
        .any(|ext| lowered.ends_with(&ext.to_lowercase()))
}
