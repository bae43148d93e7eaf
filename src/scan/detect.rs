use std::path::Path;

use anyhow::Context;
use regex::Regex;
use serde::Serialize;

use super::classify::FileAnalysis;
use super::config::ScanConfig;

/// Keywords marking a command as targeting a removed or renamed resource.
const DEPRECATED_KEYWORDS: &[&str] = &[
    "summary",
    "object-storage",
    "iso-image",
    "startup-script",
    "ipv4",
    "product-",
];

/// Importance weights: command count, log(file size), infrastructure
/// commands, deprecated commands, complexity.
const W_COMMANDS: f64 = 1.0;
const W_SIZE: f64 = 0.1;
const W_INFRA: f64 = 1.5;
const W_DEPRECATED: f64 = 2.0;
const W_COMPLEXITY: f64 = 0.2;

/// File size above which its logarithm contributes to importance.
const SIZE_FLOOR: u64 = 1000;

/// Migration priority, a total function of the importance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn from_importance(score: f64) -> Self {
        if score >= 10.0 {
            Self::Critical
        } else if score >= 5.0 {
            Self::High
        } else if score >= 2.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// One pattern hit on one line.
#[derive(Debug, Clone, Serialize)]
pub struct DetectedCommand {
    /// 1-based.
    pub line_number: usize,
    pub content: String,
    pub command_type: &'static str,
    pub confidence: f64,
    pub deprecated: bool,
}

/// Scanner verdict for one file.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    pub path: std::path::PathBuf,
    pub is_script: bool,
    pub confidence: f64,
    pub command_count: usize,
    pub importance_score: f64,
    pub priority: Priority,
    pub commands: Vec<DetectedCommand>,
    pub analysis: FileAnalysis,
}

impl DetectionResult {
    /// Result for a file that was never pattern-matched (binary or oversized).
    pub fn skipped(analysis: FileAnalysis) -> Self {
        Self {
            path: analysis.path.clone(),
            is_script: false,
            confidence: 0.0,
            command_count: 0,
            importance_score: 0.0,
            priority: Priority::Low,
            commands: Vec::new(),
            analysis,
        }
    }
}

struct CommandPattern {
    name: &'static str,
    regex: Regex,
    weight: f64,
}

/// Compiled detection patterns, built once per scanner.
pub(crate) struct CommandMatchers {
    patterns: Vec<CommandPattern>,
}

impl CommandMatchers {
    pub fn new() -> anyhow::Result<Self> {
        let defs: &[(&'static str, &str, f64)] = &[
            ("usacloud-command", r"^\s*usacloud\s+\S+", 1.0),
            ("usacloud-variable", r"(?i)\busacloud\s*=", 0.8),
            ("usacloud-in-pipe", r"\|\s*usacloud\s+", 0.9),
            (
                "sakura-cloud-reference",
                r"(?i)sakura\s*cloud|さくらのクラウド",
                0.3,
            ),
            (
                "infrastructure-commands",
                r"usacloud\s+(?:server|disk|switch|router|database)\s+",
                1.2,
            ),
        ];
        let mut patterns = Vec::with_capacity(defs.len());
        for &(name, pattern, weight) in defs {
            patterns.push(CommandPattern {
                name,
                regex: Regex::new(pattern)
                    .with_context(|| format!("detection pattern \"{name}\""))?,
                weight,
            });
        }
        Ok(Self { patterns })
    }

    /// Run every pattern over every line. Each pattern contributes its
    /// weight once per line it matches; patterns are independent.
    pub fn detect(&self, path: &Path, content: &str, analysis: FileAnalysis, config: &ScanConfig) -> DetectionResult {
        let mut commands = Vec::new();
        let mut pattern_score = 0.0;

        for (index, line) in content.lines().enumerate() {
            let lowered = line.to_lowercase();
            let deprecated = DEPRECATED_KEYWORDS.iter().any(|k| lowered.contains(k));
            for pattern in &self.patterns {
                if !pattern.regex.is_match(line) {
                    continue;
                }
                pattern_score += pattern.weight;
                commands.push(DetectedCommand {
                    line_number: index + 1,
                    content: line.trim().to_string(),
                    command_type: pattern.name,
                    confidence: pattern.weight,
                    deprecated,
                });
            }
        }

        let confidence = confidence_for(pattern_score, &analysis.language, path);
        let importance = importance_for(&commands, analysis.size_bytes, analysis.metrics.complexity);

        DetectionResult {
            path: path.to_path_buf(),
            is_script: confidence >= config.min_confidence,
            confidence,
            command_count: commands.len(),
            importance_score: importance,
            priority: Priority::from_importance(importance),
            commands,
            analysis,
        }
    }
}

/// `min(1, tanh(score / 3) · language · extension)`; monotone in score.
fn confidence_for(pattern_score: f64, language: &str, path: &Path) -> f64 {
    let language_multiplier = if matches!(language, "bash" | "sh") {
        1.2
    } else {
        1.0
    };
    let extension_multiplier = if path.extension().is_some_and(|e| e == "sh") {
        1.1
    } else {
        1.0
    };
    ((pattern_score / 3.0).tanh() * language_multiplier * extension_multiplier).min(1.0)
}

#[allow(clippy::cast_precision_loss)]
fn importance_for(commands: &[DetectedCommand], size_bytes: u64, complexity: usize) -> f64 {
    let infra_count = commands
        .iter()
        .filter(|c| {
            matches!(
                c.command_type,
                "infrastructure-commands" | "usacloud-command"
            )
        })
        .count();
    let deprecated_count = commands.iter().filter(|c| c.deprecated).count();

    let size_factor = if size_bytes > SIZE_FLOOR {
        (size_bytes as f64).ln() * W_SIZE
    } else {
        0.0
    };

    commands.len() as f64 * W_COMMANDS
        + size_factor
        + infra_count as f64 * W_INFRA
        + deprecated_count as f64 * W_DEPRECATED
        + complexity as f64 * W_COMPLEXITY
}
