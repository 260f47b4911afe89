//! Shape-directed diffing of JSON values.

use serde_json::{Map, Value};

/// Compute the change from `previous` to `current`.
///
/// Returns `None` when nothing changed. With no previous observation the
/// whole current value is the delta.
///
/// - Two objects diff shallowly: the result holds keys that are new or
///   whose values differ.
/// - Two arrays diff by tail: when the current array is longer, the delta
///   is the items past the previous length. A shortened array is treated
///   as a wholesale replacement.
/// - Any other pairing is an equality check; the delta is the new value.
pub fn diff_values(previous: Option<&Value>, current: &Value) -> Option<Value> {
    let Some(previous) = previous else {
        return Some(current.clone());
    };

    match (previous, current) {
        (Value::Array(prev), Value::Array(curr)) => {
            if curr.len() > prev.len() {
                Some(Value::Array(curr[prev.len()..].to_vec()))
            } else if prev == curr {
                None
            } else {
                Some(current.clone())
            }
        }
        (Value::Object(prev), Value::Object(curr)) => {
            let mut changed = Map::new();
            for (key, value) in curr {
                if prev.get(key) != Some(value) {
                    changed.insert(key.clone(), value.clone());
                }
            }
            if changed.is_empty() {
                None
            } else {
                Some(Value::Object(changed))
            }
        }
        _ => {
            if previous == current {
                None
            } else {
                Some(current.clone())
            }
        }
    }
}

/// Items of `current` not yet present in `previous`.
///
/// For arrays this is the tail past the previous length; message channels
/// use it to find newly appended messages. A non-array current value counts
/// as a single new item when it differs from the previous observation.
pub fn new_items(previous: Option<&Value>, current: &Value) -> Vec<Value> {
    match current {
        Value::Array(curr) => {
            let prev_len = previous
                .and_then(Value::as_array)
                .map(|prev| prev.len())
                .unwrap_or(0);
            if curr.len() > prev_len {
                curr[prev_len..].to_vec()
            } else {
                Vec::new()
            }
        }
        other => {
            if previous == Some(other) {
                Vec::new()
            } else {
                vec![other.clone()]
            }
        }
    }
}
