use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::registry::Registry;

const SUGGEST_MIN_SCORE: f64 = 0.3;
const SUGGEST_LIMIT: usize = 5;

fn strip_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s_\-.,·/()\[\]]").expect("static pattern"))
}

fn normalize(label: &str) -> String {
    strip_pattern().replace_all(label, "").to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub category: String,
    pub score: f64,
}

/// Map a free-form label onto a registry key.
///
/// Order: exact key, alias, exact/alias after stripping whitespace and
/// punctuation, then the first category (registry order) whose name appears
/// inside the label.
pub fn resolve<'r>(registry: &'r Registry, raw_name: &str) -> Option<&'r str> {
    let name = raw_name.trim();
    if name.is_empty() {
        return None;
    }

    if let Some(cat) = registry.get(name) {
        return Some(cat.name());
    }
    if let Some(target) = registry.alias(name) {
        return registry.get(target).map(|c| c.name());
    }

    let stripped = normalize(name);
    if !stripped.is_empty() {
        if let Some(cat) = registry
            .categories()
            .iter()
            .find(|c| normalize(c.name()) == stripped)
        {
            return Some(cat.name());
        }
        if let Some((_, target)) = registry
            .aliases()
            .iter()
            .find(|(alias, _)| normalize(alias) == stripped)
        {
            return registry.get(target).map(|c| c.name());
        }
    }

    registry
        .categories()
        .iter()
        .find(|c| name.contains(c.name()))
        .map(|c| c.name())
}

fn overlap_score(input: &str, candidate: &str) -> f64 {
    let input_len = input.chars().count();
    let candidate_len = candidate.chars().count();
    let longest = input_len.max(candidate_len);
    if longest == 0 {
        return 0.0;
    }

    let mut pool: HashMap<char, usize> = HashMap::new();
    for c in candidate.chars() {
        *pool.entry(c).or_default() += 1;
    }
    let mut shared = 0usize;
    for c in input.chars() {
        if let Some(n) = pool.get_mut(&c) {
            if *n > 0 {
                *n -= 1;
                shared += 1;
            }
        }
    }
    shared as f64 / longest as f64
}

/// Rank category names by shared characters, best first.
pub fn suggest(registry: &Registry, raw_name: &str) -> Vec<Suggestion> {
    let name = raw_name.trim();
    let mut scored: Vec<Suggestion> = registry
        .categories()
        .iter()
        .map(|c| Suggestion {
            category: c.name().to_string(),
            score: overlap_score(name, c.name()),
        })
        .filter(|s| s.score >= SUGGEST_MIN_SCORE)
        .collect();
    // stable: equal scores keep registry order
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(SUGGEST_LIMIT);
    scored
}

/// Rewrite the top-level labels of a write batch to registry keys. Lists
/// landing on the same category are concatenated in input order; labels that
/// do not resolve are left alone. Returns the rewritten batch and the
/// `(label, category)` pairs that changed.
pub fn resolve_labels(registry: &Registry, batch: &Value) -> (Value, Vec<(String, String)>) {
    let Some(groups) = batch.as_object() else {
        return (batch.clone(), Vec::new());
    };

    let mut out = Map::new();
    let mut renamed = Vec::new();
    for (label, entries) in groups {
        let key = match resolve(registry, label) {
            Some(cat) if cat != label => {
                renamed.push((label.clone(), cat.to_string()));
                cat.to_string()
            }
            _ => label.clone(),
        };
        if !out.contains_key(&key) {
            out.insert(key, entries.clone());
            continue;
        }
        let merged = match (out.get_mut(&key), entries) {
            (Some(Value::Array(existing)), Value::Array(more)) => {
                existing.extend(more.iter().cloned());
                true
            }
            _ => false,
        };
        if !merged {
            // shapes differ; keep the original label so validation sees it
            out.insert(label.clone(), entries.clone());
        }
    }
    (Value::Object(out), renamed)
}
