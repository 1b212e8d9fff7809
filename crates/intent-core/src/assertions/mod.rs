//! Assertion evaluators, one per assertion type.
//!
//! Each evaluator fetches what it needs through a [`BoundedProvider`] and
//! hands the fetched data to a pure `judge` function. Fetch and parse
//! faults propagate as [`EngineError`]; PASS and FAIL are always a
//! [`Verdict`].

use serde_json::Value;

use crate::errors::{EngineError, EngineResult};
use crate::model::{Assertion, AssertionKind, Params, Verdict};
use crate::providers::BoundedProvider;

pub mod contains_title;
pub mod field_exists;
pub mod freshness;

pub use contains_title::ContainsTitle;
pub use field_exists::FieldExists;
pub use freshness::AssetFreshness;

/// Run the evaluator matching `assertion`.
pub async fn evaluate(assertion: &Assertion, provider: &BoundedProvider<'_>) -> EngineResult<Verdict> {
    match assertion {
        Assertion::ContainsTitle(spec) => contains_title::evaluate(spec, provider).await,
        Assertion::AssetFreshness(spec) => freshness::evaluate(spec, provider).await,
        Assertion::FieldExists(spec) => field_exists::evaluate(spec, provider).await,
    }
}

/// Which block of a check definition a parameter lives in.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Block {
    Assert,
    Target,
}

impl Block {
    fn qualify(self, key: &str) -> String {
        match self {
            Block::Assert => format!("assert.{}", key),
            Block::Target => format!("target.{}", key),
        }
    }
}

/// A non-empty string parameter that must be present.
pub(crate) fn required_str(
    params: &Params,
    block: Block,
    key: &str,
    assertion: AssertionKind,
) -> EngineResult<String> {
    match params.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        None | Some(Value::Null) | Some(Value::String(_)) => Err(EngineError::MissingField {
            assertion,
            field: block.qualify(key),
        }),
        Some(other) => Err(EngineError::InvalidField {
            assertion,
            field: block.qualify(key),
            reason: format!("expected a string, got {}", other),
        }),
    }
}

/// An optional string parameter; absent, null, or empty means `default`.
pub(crate) fn optional_str(
    params: &Params,
    block: Block,
    key: &str,
    default: &str,
    assertion: AssertionKind,
) -> EngineResult<String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(EngineError::InvalidField {
            assertion,
            field: block.qualify(key),
            reason: format!("expected a string, got {}", other),
        }),
    }
}

/// An optional number; numeric strings are accepted (`"24"`).
pub(crate) fn optional_f64(
    params: &Params,
    block: Block,
    key: &str,
    default: f64,
    assertion: AssertionKind,
) -> EngineResult<f64> {
    let invalid = |reason: String| EngineError::InvalidField {
        assertion,
        field: block.qualify(key),
        reason,
    };
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| invalid(format!("{} is not representable as a float", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(format!("{:?} is not a number ({})", s, e))),
        Some(other) => Err(invalid(format!("expected a number, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_required_str_rejects_empty_and_wrong_type() {
        let p = params(json!({"a": "", "b": 7, "c": "ok"}));
        let kind = AssertionKind::FieldExists;
        assert!(matches!(
            required_str(&p, Block::Assert, "a", kind),
            Err(EngineError::MissingField { .. })
        ));
        assert!(matches!(
            required_str(&p, Block::Assert, "b", kind),
            Err(EngineError::InvalidField { .. })
        ));
        assert_eq!(required_str(&p, Block::Assert, "c", kind).unwrap(), "ok");
    }

    #[test]
    fn test_optional_f64_accepts_numeric_strings() {
        let p = params(json!({"n": 12, "s": "1.5", "bad": "soon"}));
        let kind = AssertionKind::AssetFreshness;
        assert_eq!(optional_f64(&p, Block::Assert, "n", 24.0, kind).unwrap(), 12.0);
        assert_eq!(optional_f64(&p, Block::Assert, "s", 24.0, kind).unwrap(), 1.5);
        assert_eq!(optional_f64(&p, Block::Assert, "missing", 24.0, kind).unwrap(), 24.0);
        assert!(optional_f64(&p, Block::Assert, "bad", 24.0, kind).is_err());
    }
}
