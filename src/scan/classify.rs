use std::path::{Path, PathBuf};

use anyhow::Context;
use regex::Regex;
use serde::Serialize;

/// Printable-byte ratio above which content counts as text.
const PRINTABLE_RATIO: f64 = 0.7;

/// Line-shape counters for a text file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextMetrics {
    pub comment_lines: usize,
    pub blank_lines: usize,
    pub code_lines: usize,
    /// Count of lines containing a branching or looping keyword.
    pub complexity: usize,
    pub comment_ratio: f64,
}

/// Classification of one file: shape, encoding, language, metrics.
#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub line_count: usize,
    pub file_type: String,
    pub encoding: String,
    pub is_text: bool,
    pub is_binary: bool,
    pub language: String,
    pub metrics: TextMetrics,
}

impl FileAnalysis {
    /// Analysis for a file that was not (or could not be) read as text.
    pub fn binary(path: &Path, size_bytes: u64) -> Self {
        Self {
            path: path.to_path_buf(),
            size_bytes,
            line_count: 0,
            file_type: file_type_of(path, false),
            encoding: "binary".to_string(),
            is_text: false,
            is_binary: true,
            language: "unknown".to_string(),
            metrics: TextMetrics::default(),
        }
    }
}

/// Compiled language-heuristic patterns, built once per scanner.
#[derive(Debug)]
pub(crate) struct LanguageMatchers {
    bash: Vec<Regex>,
    python: Vec<Regex>,
    complexity: Regex,
}

impl LanguageMatchers {
    pub fn new() -> anyhow::Result<Self> {
        let compile = |p: &str| Regex::new(p).with_context(|| format!("pattern {p:?}"));
        Ok(Self {
            bash: vec![
                compile(r"(?m)^\s*function\s+\w+\s*\(")?,
                compile(r"(?m)^\s*if\s+\[")?,
                compile(r"(?m)^\s*for\s+\w+\s+in\b")?,
            ],
            python: vec![
                compile(r"(?m)^\s*def\s+\w+\s*\(")?,
                compile(r"(?m)^\s*import\s+\w+")?,
                compile(r#"(?m)^\s*if\s+__name__\s*==\s*["']__main__["']"#)?,
            ],
            complexity: compile(r"\b(?:if|for|while|case|function)\b")?,
        })
    }

    /// Shebang first, then lightweight content heuristics.
    pub fn detect_language(&self, content: &str) -> &'static str {
        if let Some(first) = content.lines().next()
            && let Some(interp) = first.strip_prefix("#!")
        {
            if interp.contains("bash") {
                return "bash";
            }
            if interp.contains("python") {
                return "python";
            }
            if interp.contains("sh") {
                return "sh";
            }
        }
        if self.bash.iter().any(|re| re.is_match(content)) {
            return "bash";
        }
        if self.python.iter().any(|re| re.is_match(content)) {
            return "python";
        }
        "unknown"
    }

    pub fn analyze(&self, path: &Path, content: &str, size_bytes: u64) -> FileAnalysis {
        let mut metrics = TextMetrics::default();
        let mut line_count = 0;
        for line in content.lines() {
            line_count += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                metrics.blank_lines += 1;
            } else if trimmed.starts_with('#') || trimmed.starts_with("//") {
                metrics.comment_lines += 1;
            } else {
                metrics.code_lines += 1;
            }
            if self.complexity.is_match(line) {
                metrics.complexity += 1;
            }
        }
        if line_count > 0 {
            #[allow(clippy::cast_precision_loss)]
            let ratio = metrics.comment_lines as f64 / line_count as f64;
            metrics.comment_ratio = ratio;
        }

        FileAnalysis {
            path: path.to_path_buf(),
            size_bytes,
            line_count,
            file_type: file_type_of(path, content.starts_with("#!")),
            encoding: "utf-8".to_string(),
            is_text: true,
            is_binary: false,
            language: self.detect_language(content).to_string(),
            metrics,
        }
    }
}

/// File type by extension; `script` when a shebang is present but the
/// extension says nothing, `unknown` otherwise.
fn file_type_of(path: &Path, has_shebang: bool) -> String {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("sh" | "bash") => "shell".to_string(),
        Some("py") => "python".to_string(),
        Some("txt") => "text".to_string(),
        Some(other) if !other.is_empty() => other.to_string(),
        _ if has_shebang => "script".to_string(),
        _ => "unknown".to_string(),
    }
}

/// Borrow bytes as text per the classification contract: no NUL byte,
/// valid UTF-8, and printable ratio above the threshold. Returns `None`
/// for anything that should be treated as binary.
pub(crate) fn decode_text(bytes: &[u8]) -> Option<&str> {
    if bytes.is_empty() {
        return Some("");
    }
    if bytes.contains(&0) {
        return None;
    }
    let printable = bytes
        .iter()
        .filter(|&&b| matches!(b, b'\n' | b'\r' | b'\t' | 0x20..=0x7e))
        .count();
    #[allow(clippy::cast_precision_loss)]
    let ratio = printable as f64 / bytes.len() as f64;
    if ratio <= PRINTABLE_RATIO {
        return None;
    }
    std::str::from_utf8(bytes).ok()
}
