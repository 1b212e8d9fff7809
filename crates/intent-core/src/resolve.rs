//! Dotted-path lookup over nested records.

use serde_json::Value;

/// Resolve `path` (e.g. `assets.tv_4k.artwork_updated_at`) against `record`.
///
/// Each segment must name a key of an object; anything else (a missing key,
/// a scalar or array in the way) yields `None`. No array indexing or
/// wildcards. An explicit JSON `null` at the end of the path resolves to
/// `Some(&Value::Null)`; callers decide whether that counts as absent.
pub fn resolve<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |current, segment| current.as_object()?.get(segment))
}

/// Like [`resolve`], but treats an explicit `null` as absent.
pub fn resolve_present<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    resolve(record, path).filter(|v| !v.is_null())
}

/// Whether a value is a primitive scalar (string, number, or boolean).
pub fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}
