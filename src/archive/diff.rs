//! Change summaries between two configuration documents
//!
//! Used for the log line written when a new archive is kept, so an operator
//! can see at a glance which parts of the configuration moved.

use serde_json::Value;

/// Maximum number of change lines reported
const MAX_CHANGES: usize = 20;

/// Describe what changed between two documents
///
/// Objects are walked recursively with dotted paths; arrays of different
/// length are summarized by their sizes. Returns an empty list when the
/// documents are equal.
pub fn summarize_changes(before: &Value, after: &Value) -> Vec<String> {
    let mut changes = Vec::new();
    collect(before, after, "", &mut changes);

    if changes.len() > MAX_CHANGES {
        let hidden = changes.len() - MAX_CHANGES;
        changes.truncate(MAX_CHANGES);
        changes.push(format!("... and {} more", hidden));
    }

    changes
}

fn collect(before: &Value, after: &Value, prefix: &str, changes: &mut Vec<String>) {
    match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            for (key, before_val) in before_obj {
                let path = join(prefix, key);
                match after_obj.get(key) {
                    Some(after_val) if after_val != before_val => {
                        collect(before_val, after_val, &path, changes);
                    }
                    Some(_) => {}
                    None => changes.push(format!("{}: (removed)", path)),
                }
            }

            for (key, after_val) in after_obj {
                if !before_obj.contains_key(key) {
                    changes.push(format!(
                        "{}: (added) {}",
                        join(prefix, key),
                        format_value(after_val)
                    ));
                }
            }
        }
        (Value::Array(before_arr), Value::Array(after_arr)) => {
            if before_arr.len() != after_arr.len() {
                changes.push(format!(
                    "{}: [{} items] -> [{} items]",
                    label(prefix),
                    before_arr.len(),
                    after_arr.len()
                ));
            } else {
                for (i, (b, a)) in before_arr.iter().zip(after_arr).enumerate() {
                    if b != a {
                        collect(b, a, &format!("{}[{}]", prefix, i), changes);
                    }
                }
            }
        }
        _ => {
            if before != after {
                changes.push(format!(
                    "{}: {} -> {}",
                    label(prefix),
                    format_value(before),
                    format_value(after)
                ));
            }
        }
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn label(prefix: &str) -> &str {
    if prefix.is_empty() {
        "(root)"
    } else {
        prefix
    }
}

/// Format a JSON value for human-readable display
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.chars().count() > 50 {
                let truncated: String = s.chars().take(47).collect();
                format!("\"{}...\"", truncated)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
