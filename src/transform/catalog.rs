use anyhow::Context;
use regex::Regex;
use serde::Serialize;

/// One compiled migration rule.
///
/// `name` and `explanation` are stable identifiers: they appear in emitted
/// annotations and in the `--stats` table, and golden tests assert them.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: &'static str,
    pub pattern: Regex,
    pub replacement: &'static str,
    pub explanation: &'static str,
    pub doc_url: Option<&'static str>,
}

impl Rule {
    /// The annotation line the processor inserts above a rewritten line.
    pub fn annotation(&self) -> String {
        match self.doc_url {
            Some(url) => format!("# usacloud-update: {} (see {url})", self.explanation),
            None => format!("# usacloud-update: {}", self.explanation),
        }
    }
}

/// Catalog row for `rules --json` and other read-only listings.
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub order: usize,
    pub name: &'static str,
    pub explanation: &'static str,
    pub doc_url: Option<&'static str>,
}

/// The ordered, immutable set of migration rules.
///
/// Declaration order is a contract: rules are applied top to bottom and a
/// later rule sees the output of earlier ones. Reordering changes output.
#[derive(Debug, Clone)]
pub struct Catalog {
    rules: Vec<Rule>,
}

struct RuleDef {
    name: &'static str,
    pattern: &'static str,
    replacement: &'static str,
    explanation: &'static str,
    doc_url: Option<&'static str>,
}

const UPGRADE_GUIDE: &str = "https://docs.usacloud.jp/usacloud/upgrade/v1_1_0/";

/// The v0.x/v1.0 → v1.1 compatibility matrix.
///
/// `remove-summary` and `remove-object-storage` comment the line out instead
/// of rewriting it; their patterns are anchored so the commented form no
/// longer matches on a second run. `zone-all` substitutes the matched text
/// with itself — it exists only to attach an annotation.
const RULE_DEFS: &[RuleDef] = &[
    RuleDef {
        name: "output-type-csv-tsv",
        pattern: r"--output-type[=\s]+(?:csv|tsv)\b",
        replacement: "--output-type=json",
        explanation: "CSV/TSV output was removed; use JSON.",
        doc_url: Some(UPGRADE_GUIDE),
    },
    RuleDef {
        name: "selector-to-positional-args",
        pattern: r#"\s--selector[=\s]+(?:[\w.-]+=)?("[^"]*"|\S+)(.*)$"#,
        replacement: "${2} ${1}",
        explanation: "Selector flag is deprecated; use positional argument.",
        doc_url: Some(UPGRADE_GUIDE),
    },
    RuleDef {
        name: "resource-iso-image",
        pattern: r"\b(usacloud\s+)iso-image\b",
        replacement: "${1}cdrom",
        explanation: "Resource renamed to cdrom.",
        doc_url: Some(UPGRADE_GUIDE),
    },
    RuleDef {
        name: "resource-startup-script",
        pattern: r"\b(usacloud\s+)startup-script\b",
        replacement: "${1}note",
        explanation: "Resource renamed to note.",
        doc_url: Some(UPGRADE_GUIDE),
    },
    RuleDef {
        name: "resource-ipv4",
        pattern: r"\b(usacloud\s+)ipv4\b",
        replacement: "${1}ipaddress",
        explanation: "Resource renamed to ipaddress.",
        doc_url: Some(UPGRADE_GUIDE),
    },
    RuleDef {
        name: "product-aliases",
        pattern: r"\b(usacloud\s+)product-(disk|internet|server)\b",
        replacement: "${1}${2}",
        explanation: "Product aliases were removed; use the plain resource name.",
        doc_url: Some(UPGRADE_GUIDE),
    },
    RuleDef {
        name: "remove-summary",
        pattern: r"^(\s*)(usacloud\s+summary\b.*)$",
        replacement: "${1}# ${2}",
        explanation: "'summary' was removed without replacement.",
        doc_url: None,
    },
    RuleDef {
        name: "remove-object-storage",
        pattern: r"^(\s*)(usacloud\s+(?:object-storage|ojs)\b.*)$",
        replacement: "${1}# ${2}",
        explanation: "'object-storage' was removed; use an S3-compatible client.",
        doc_url: Some(UPGRADE_GUIDE),
    },
    RuleDef {
        name: "zone-all",
        pattern: r"--zone=all\b",
        replacement: "--zone=all",
        explanation: "--zone=all now iterates every zone; verify the command is intended to fan out.",
        doc_url: Some(UPGRADE_GUIDE),
    },
];

impl Catalog {
    /// Compile the built-in catalog.
    ///
    /// A pattern that fails to compile is a programmer error in `RULE_DEFS`;
    /// callers treat it as fatal and refuse to start.
    pub fn builtin() -> anyhow::Result<Self> {
        let mut rules = Vec::with_capacity(RULE_DEFS.len());
        for def in RULE_DEFS {
            let pattern = Regex::new(def.pattern)
                .with_context(|| format!("rule \"{}\": invalid pattern", def.name))?;
            rules.push(Rule {
                name: def.name,
                pattern,
                replacement: def.replacement,
                explanation: def.explanation,
                doc_url: def.doc_url,
            });
        }
        Ok(Self { rules })
    }

    /// All rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn find(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Serializable listing, 1-based order.
    pub fn describe(&self) -> Vec<RuleInfo> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, r)| RuleInfo {
                order: i + 1,
                name: r.name,
                explanation: r.explanation,
                doc_url: r.doc_url,
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn builtin_compiles() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.rules().len(), 9);
    }

    #[test]
    fn declaration_order_is_stable() {
        let catalog = Catalog::builtin().unwrap();
        let names: Vec<&str> = catalog.rules().iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            [
                "output-type-csv-tsv",
                "selector-to-positional-args",
                "resource-iso-image",
                "resource-startup-script",
                "resource-ipv4",
                "product-aliases",
                "remove-summary",
                "remove-object-storage",
                "zone-all",
            ]
        );
    }

    #[test]
    fn summary_rule_has_no_doc_url() {
        let catalog = Catalog::builtin().unwrap();
        let rule = catalog.find("remove-summary").unwrap();
        assert!(rule.doc_url.is_none());
        assert_eq!(
            rule.annotation(),
            "# usacloud-update: 'summary' was removed without replacement."
        );
    }

    #[test]
    fn annotation_includes_doc_url_when_present() {
        let catalog = Catalog::builtin().unwrap();
        let rule = catalog.find("resource-iso-image").unwrap();
        let annotation = rule.annotation();
        assert!(annotation.starts_with("# usacloud-update: Resource renamed to cdrom."));
        assert!(annotation.contains("(see https://"));
    }

    #[test]
    fn describe_is_one_based_and_ordered() {
        let catalog = Catalog::builtin().unwrap();
        let info = catalog.describe();
        assert_eq!(info[0].order, 1);
        assert_eq!(info[0].name, "output-type-csv-tsv");
        assert_eq!(info[8].order, 9);
        assert_eq!(info[8].name, "zone-all");
    }

    #[test]
    fn find_unknown_rule_is_none() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.find("no-such-rule").is_none());
    }
}
