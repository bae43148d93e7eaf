pub mod catalog;
pub mod types;

pub use catalog::{Catalog, Rule};
pub use types::{ChangeRecord, LineResult};

/// Apply the catalog to a single line (no trailing newline).
///
/// Single pass in catalog order, each rule at most once, first match only.
/// Later rules see the already-rewritten line; earlier rules are never
/// re-tried. Total: invalid or irrelevant input simply passes through.
pub fn apply(catalog: &Catalog, input: &str) -> LineResult {
    let mut current = input.to_string();
    let mut changes = Vec::new();

    for rule in catalog.rules() {
        let Some(caps) = rule.pattern.captures(&current) else {
            continue;
        };
        let Some(matched) = caps.get(0) else {
            continue;
        };

        let before_fragment = matched.as_str().to_string();
        let mut after_fragment = String::new();
        caps.expand(rule.replacement, &mut after_fragment);

        let mut next = String::with_capacity(current.len());
        next.push_str(&current[..matched.start()]);
        next.push_str(&after_fragment);
        next.push_str(&current[matched.end()..]);

        changes.push(ChangeRecord {
            rule_name: rule.name,
            before_fragment,
            after_fragment,
        });
        current = next;
    }

    LineResult {
        line: current,
        changed: !changes.is_empty(),
        changes,
    }
}
