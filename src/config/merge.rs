//! Field-by-field merge of settings documents.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// - Objects merge key by key, recursively
/// - Arrays and scalars in `overlay` replace the base value
/// - A null in `overlay` leaves the base value in place
///
/// ```
/// use serde_json::json;
/// use settings_registry::config::deep_merge;
///
/// let base = json!({"store": {"db_path": "a.db", "key_prefix": "config"}});
/// let overlay = json!({"store": {"db_path": "b.db"}});
/// assert_eq!(
///     deep_merge(base, overlay),
///     json!({"store": {"db_path": "b.db", "key_prefix": "config"}})
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let value = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold [`deep_merge`] over documents, later ones winning.
pub fn deep_merge_all(documents: impl IntoIterator<Item = Value>) -> Value {
    documents.into_iter().fold(Value::Null, deep_merge)
}
