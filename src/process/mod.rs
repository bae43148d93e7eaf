use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::transform::{self, Catalog};

/// Shebang emitted when the input does not start with one.
pub const HEADER_SHEBANG: &str = "#!/usr/bin/env bash";

/// Generated banner line. The exact text is a contract asserted by tests.
pub const HEADER_BANNER: &str = "# Updated for usacloud v1.1 by usacloud-update";

/// Prefix of every annotation this tool inserts. Lines carrying it are
/// never fed back to the engine, which prevents an annotation whose text
/// mentions a flag (e.g. `--zone=all`) from being annotated itself.
const ANNOTATION_PREFIX: &str = "# usacloud-update: ";

/// Per-rule rewrite counts for one processed stream.
///
/// Counts are keyed by rule name; reporting iterates the catalog so the
/// table always comes out in declaration order, never hash order.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    counts: HashMap<&'static str, u64>,
    changed_lines: u64,
}

impl Statistics {
    fn record(&mut self, rule_name: &'static str) {
        *self.counts.entry(rule_name).or_insert(0) += 1;
    }

    pub fn count(&self, rule_name: &str) -> u64 {
        self.counts.get(rule_name).copied().unwrap_or(0)
    }

    /// Total rule firings; equals the number of emitted annotation lines.
    pub fn total_changes(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of input lines that produced at least one annotation.
    pub fn changed_lines(&self) -> u64 {
        self.changed_lines
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Rows in catalog declaration order; rules that never fired are omitted.
    pub fn rows<'a>(&self, catalog: &'a Catalog) -> Vec<(&'a str, u64)> {
        catalog
            .rules()
            .iter()
            .filter_map(|r| {
                let n = self.count(r.name);
                (n > 0).then_some((r.name, n))
            })
            .collect()
    }

    /// Human-readable table for stderr (`--stats`).
    pub fn render(&self, catalog: &Catalog) -> String {
        let mut out = String::new();
        for (name, count) in self.rows(catalog) {
            out.push_str(&format!("{name:<32}{count:>6}\n"));
        }
        out.push_str(&format!("changed lines: {}\n", self.changed_lines));
        out
    }
}

/// Transform `input` into `output` line by line, returning the statistics.
///
/// CRLF input is canonicalized to `\n`. When the first input line is not a
/// shebang, a generated header (shebang + banner + one blank line) is
/// prepended. Blank lines pass through untouched; comment lines pass
/// through verbatim but still run the engine so commented-out invocations
/// get annotated; everything else is rewritten in place.
///
/// I/O errors are returned to the caller; partial output may have been
/// written. The transformation itself cannot fail.
pub fn process_stream<R: BufRead, W: Write>(
    catalog: &Catalog,
    input: R,
    output: &mut W,
) -> anyhow::Result<Statistics> {
    let mut stats = Statistics::default();
    // Comment lines emitted since the last non-comment output line. Used to
    // suppress an annotation that is already present directly above the
    // current line, which is what keeps a second run byte-identical.
    let mut recent_comments: Vec<String> = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let raw = line?;
        let line = raw.strip_suffix('\r').unwrap_or(&raw);

        if index == 0 && !line.starts_with("#!") {
            writeln!(output, "{HEADER_SHEBANG}")?;
            writeln!(output, "{HEADER_BANNER}")?;
            writeln!(output)?;
        }

        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            writeln!(output, "{line}")?;
            recent_comments.clear();
            continue;
        }

        let is_comment = trimmed.starts_with('#');
        if is_comment && trimmed.starts_with(ANNOTATION_PREFIX) {
            writeln!(output, "{line}")?;
            recent_comments.push(line.to_string());
            continue;
        }

        let result = transform::apply(catalog, line);

        let mut annotated = false;
        if result.changed {
            for change in &result.changes {
                let Some(rule) = catalog.find(change.rule_name) else {
                    continue;
                };
                let annotation = rule.annotation();
                if recent_comments.iter().any(|c| *c == annotation) {
                    continue;
                }
                writeln!(output, "{annotation}")?;
                recent_comments.push(annotation);
                stats.record(rule.name);
                annotated = true;
            }
        }
        if annotated {
            stats.changed_lines += 1;
        }

        if is_comment {
            // Comments are never rewritten, only annotated.
            writeln!(output, "{line}")?;
            recent_comments.push(line.to_string());
        } else {
            writeln!(output, "{}", result.line)?;
            if result.line.trim_start().starts_with('#') {
                recent_comments.push(result.line);
            } else {
                recent_comments.clear();
            }
        }
    }

    Ok(stats)
}
