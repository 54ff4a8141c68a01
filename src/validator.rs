use serde_json::Value;

use crate::models::{Batch, Entry};

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Check the shape of a write batch and collect every problem found.
///
/// Category names are not checked here; unknown categories are reported as
/// warnings at write time.
pub fn validate(batch: &Value) -> Vec<String> {
    let Some(groups) = batch.as_object() else {
        return vec![format!(
            "batch must be an object mapping category -> list of entries, got {}",
            kind(batch)
        )];
    };

    let mut errors = Vec::new();
    for (category, entries) in groups {
        let Some(entries) = entries.as_array() else {
            errors.push(format!(
                "{category}: entries must be a list, got {}",
                kind(entries)
            ));
            continue;
        };

        for (i, entry) in entries.iter().enumerate() {
            let pos = i + 1;
            let Some(fields) = entry.as_object() else {
                errors.push(format!(
                    "{category}[{pos}]: entry must be an object with name and amount, got {}",
                    kind(entry)
                ));
                continue;
            };

            let name_ok = fields
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|n| !n.trim().is_empty());
            if !name_ok {
                errors.push(format!("{category}[{pos}]: name is missing or blank"));
            }

            match fields.get("amount") {
                None | Some(Value::Null) => {
                    errors.push(format!("{category}[{pos}]: amount is missing"));
                }
                Some(Value::Number(n)) => {
                    if n.as_f64().is_some_and(|a| a < 0.0) {
                        errors.push(format!("{category}[{pos}]: amount must be >= 0, got {n}"));
                    }
                }
                Some(other) => {
                    errors.push(format!(
                        "{category}[{pos}]: amount must be a number, got {}",
                        kind(other)
                    ));
                }
            }
        }
    }
    errors
}

/// Convert a batch that already passed [`validate`] into typed entries.
/// Anything malformed is skipped rather than reported.
pub fn parse_batch(batch: &Value) -> Batch {
    let Some(groups) = batch.as_object() else {
        return Vec::new();
    };
    groups
        .iter()
        .map(|(category, entries)| {
            let entries = entries
                .as_array()
                .map(|list| {
                    list.iter()
                        .filter_map(|e| {
                            let name = e.get("name")?.as_str()?.trim();
                            let amount = e.get("amount")?.as_f64()?;
                            Some(Entry::new(name, amount))
                        })
                        .collect()
                })
                .unwrap_or_default();
            (category.clone(), entries)
        })
        .collect()
}
