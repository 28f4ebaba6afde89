//! Diff generation for audit logging

use serde_json::Value;

/// Fields that change on every write and carry no information in a diff
const IGNORED_FIELDS: [&str; 1] = ["updated_at"];

/// Summarize the top-level fields that differ between two snapshots
///
/// Returns None when nothing but ignored fields changed.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let changes: Vec<String> = match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            let mut keys: Vec<&String> = before_obj.keys().chain(after_obj.keys()).collect();
            keys.sort();
            keys.dedup();

            keys.into_iter()
                .filter(|key| !IGNORED_FIELDS.contains(&key.as_str()))
                .filter_map(|key| match (before_obj.get(key), after_obj.get(key)) {
                    (Some(b), Some(a)) if b == a => None,
                    (b, a) => Some(format!(
                        "{}: {} -> {}",
                        key,
                        b.map(format_value).unwrap_or_else(|| "(added)".into()),
                        a.map(format_value).unwrap_or_else(|| "(removed)".into()),
                    )),
                })
                .collect()
        }
        _ if before != after => vec![format!("{} -> {}", format_value(before), format_value(after))],
        _ => Vec::new(),
    };

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.chars().count() > 50 => {
            let head: String = s.chars().take(47).collect();
            format!("\"{}...\"", head)
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_changed_added_removed() {
        let before = json!({"amount": "200", "memo": "x", "old": true});
        let after = json!({"amount": "100", "memo": "x", "new": 1});
        assert_eq!(
            generate_diff(&before, &after).unwrap(),
            "amount: \"200\" -> \"100\", new: (added) -> 1, old: true -> (removed)"
        );
    }

    #[test]
    fn test_timestamps_are_ignored() {
        let before = json!({"name": "Wallet", "updated_at": "2024-01-01"});
        let after = json!({"name": "Wallet", "updated_at": "2024-01-02"});
        assert_eq!(generate_diff(&before, &after), None);
    }

    #[test]
    fn test_long_strings_are_truncated() {
        let long = "é".repeat(80);
        let summary = generate_diff(&json!({"d": ""}), &json!({"d": long})).unwrap();
        assert!(summary.ends_with("...\""));
    }
}
