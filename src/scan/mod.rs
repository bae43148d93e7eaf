pub mod classify;
pub mod config;
pub mod detect;
pub mod walk;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Instant;

use anyhow::Context;
use regex::Regex;
use serde::Serialize;

pub use classify::{FileAnalysis, TextMetrics};
pub use config::{ScanConfig, SortKey, SortOrder};
pub use detect::{DetectedCommand, DetectionResult, Priority};
pub use walk::ScanError;

use classify::LanguageMatchers;
use detect::CommandMatchers;

/// Aggregate counters over one scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStatistics {
    /// Priority band counts over detected scripts.
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
    /// Pattern hits across every analyzed file.
    pub total_commands: usize,
    pub deprecated_commands: usize,
}

impl ScanStatistics {
    fn collect(results: &[DetectionResult]) -> Self {
        let mut stats = Self::default();
        for result in results {
            if result.is_script {
                match result.priority {
                    Priority::Low => stats.low += 1,
                    Priority::Medium => stats.medium += 1,
                    Priority::High => stats.high += 1,
                    Priority::Critical => stats.critical += 1,
                }
            }
            stats.total_commands += result.command_count;
            stats.deprecated_commands +=
                result.commands.iter().filter(|c| c.deprecated).count();
        }
        stats
    }
}

/// Full scan output: ranked results plus walk-level bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub results: Vec<DetectionResult>,
    pub total_files: usize,
    pub detected_files: usize,
    pub duration_ms: u64,
    pub statistics: ScanStatistics,
    pub errors: Vec<ScanError>,
}

/// Directory scanner: walk, classify, score, rank.
pub struct Scanner {
    config: ScanConfig,
    commands: CommandMatchers,
    languages: LanguageMatchers,
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> anyhow::Result<Self> {
        let compile_globs = |globs: &[String]| {
            globs
                .iter()
                .map(|glob| glob_to_regex(glob))
                .collect::<anyhow::Result<Vec<_>>>()
        };
        let includes = compile_globs(&config.include)?;
        let excludes = compile_globs(&config.exclude)?;
        Ok(Self {
            commands: CommandMatchers::new()?,
            languages: LanguageMatchers::new()?,
            includes,
            excludes,
            config,
        })
    }

    /// Scan `root` (directory or single file) and return the ranked report.
    ///
    /// Per-file failures land in `ScanReport.errors`; only a completely
    /// unusable root is an error here.
    pub fn scan(&self, root: &Path) -> anyhow::Result<ScanReport> {
        if !root.exists() {
            anyhow::bail!("path not found: {}", root.display());
        }
        let started = Instant::now();

        let walk = walk::collect_candidates(root, &self.config);
        let mut errors = walk.errors;
        let candidates: Vec<PathBuf> = walk
            .candidates
            .into_iter()
            .filter(|path| self.is_included(path) && !self.is_excluded(path))
            .collect();

        let mut results = self.classify_all(&candidates, &mut errors);

        results.retain(|r| r.importance_score >= self.config.min_importance);
        if self.config.only_high_priority {
            results.retain(|r| r.priority >= Priority::High);
        }
        self.sort_results(&mut results);

        let detected_files = results.iter().filter(|r| r.is_script).count();
        let statistics = ScanStatistics::collect(&results);

        Ok(ScanReport {
            detected_files,
            statistics,
            results,
            total_files: walk.total_files,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            errors,
        })
    }

    /// Classify candidates on a bounded pool of scoped worker threads.
    ///
    /// Workers pull indices from a shared counter and push outcomes through
    /// a channel; arrival order is unspecified, determinism comes from the
    /// sort afterwards.
    fn classify_all(
        &self,
        candidates: &[PathBuf],
        errors: &mut Vec<ScanError>,
    ) -> Vec<DetectionResult> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let workers = self.worker_count(candidates.len());
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel();
        let mut results = Vec::with_capacity(candidates.len());

        std::thread::scope(|s| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                s.spawn(move || {
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(path) = candidates.get(index) else {
                            break;
                        };
                        if tx.send(self.process_file(path)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);
            for outcome in rx {
                match outcome {
                    Ok(result) => results.push(result),
                    Err(error) => errors.push(error),
                }
            }
        });

        results
    }

    fn process_file(&self, path: &Path) -> Result<DetectionResult, ScanError> {
        let scan_error = |e: std::io::Error| ScanError {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let metadata = std::fs::metadata(path).map_err(scan_error)?;
        let size = metadata.len();
        if size > self.config.max_file_size {
            // Oversized files are classified binary without being read.
            return Ok(DetectionResult::skipped(FileAnalysis::binary(path, size)));
        }

        let bytes = std::fs::read(path).map_err(scan_error)?;
        match classify::decode_text(&bytes) {
            Some(content) => {
                let analysis = self.languages.analyze(path, content, size);
                Ok(self.commands.detect(path, content, analysis, &self.config))
            }
            None if self.config.scan_binary_files => {
                let content = String::from_utf8_lossy(&bytes);
                let analysis = FileAnalysis::binary(path, size);
                Ok(self.commands.detect(path, &content, analysis, &self.config))
            }
            None => Ok(DetectionResult::skipped(FileAnalysis::binary(path, size))),
        }
    }

    fn worker_count(&self, jobs: usize) -> usize {
        let configured = if self.config.workers == 0 {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        } else {
            self.config.workers
        };
        configured.clamp(1, jobs.max(1))
    }

    fn is_included(&self, path: &Path) -> bool {
        self.includes.is_empty() || matches_any(&self.includes, path)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        !self.excludes.is_empty() && matches_any(&self.excludes, path)
    }

    /// Stable total order: chosen key, then path — identical inputs always
    /// produce identical rankings regardless of worker arrival order.
    fn sort_results(&self, results: &mut [DetectionResult]) {
        let key = self.config.sort;
        let order = self.config.order;
        results.sort_by(|a, b| {
            let primary = match key {
                SortKey::Importance => a.importance_score.total_cmp(&b.importance_score),
                SortKey::Confidence => a.confidence.total_cmp(&b.confidence),
                SortKey::Path => a.path.cmp(&b.path),
                SortKey::Name => a.path.file_name().cmp(&b.path.file_name()),
            };
            let primary = match order {
                SortOrder::Asc => primary,
                SortOrder::Desc => primary.reverse(),
            };
            primary.then_with(|| a.path.cmp(&b.path))
        });
    }
}

/// Globs match against the full path or the bare file name.
fn matches_any(patterns: &[Regex], path: &Path) -> bool {
    let full = path.to_string_lossy();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    patterns
        .iter()
        .any(|re| re.is_match(&full) || re.is_match(&name))
}

/// Shell-style glob to anchored regex: `*` matches any run, `?` one char.
fn glob_to_regex(glob: &str) -> anyhow::Result<Regex> {
    let mut pattern = String::from("^");
    for ch in glob.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            _ => pattern.push_str(&regex::escape(&ch.to_string())),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).with_context(|| format!("invalid exclude pattern {glob:?}"))
}
