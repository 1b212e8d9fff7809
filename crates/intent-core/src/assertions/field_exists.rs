//! `field_exists`: a dotted field of a title record must be present and non-null.

use serde_json::{json, Value};

use super::{required_str, Block};
use crate::errors::EngineResult;
use crate::model::{AssertionKind, Evidence, Params, Verdict};
use crate::providers::BoundedProvider;
use crate::resolve::{is_scalar, resolve_present};

pub const SUSPECTED_CAUSES: &[&str] = &[
    "localization missing",
    "schema migration issue",
    "bad data publish",
];

#[derive(Debug, Clone, PartialEq)]
pub struct FieldExists {
    pub title_id: String,
    pub field: String,
}

impl FieldExists {
    pub(crate) fn from_params(assert: &Params, target: &Params) -> EngineResult<Self> {
        let kind = AssertionKind::FieldExists;
        Ok(Self {
            title_id: required_str(target, Block::Target, "title_id", kind)?,
            field: required_str(assert, Block::Assert, "field", kind)?,
        })
    }
}

pub(crate) async fn evaluate(
    spec: &FieldExists,
    provider: &BoundedProvider<'_>,
) -> EngineResult<Verdict> {
    let record = provider.title(&spec.title_id).await?;
    Ok(judge(spec, &record))
}

/// Structured values are never echoed into evidence; only scalars get a preview.
pub fn judge(spec: &FieldExists, record: &Value) -> Verdict {
    let value = resolve_present(record, &spec.field);

    let mut evidence = Evidence::new();
    evidence.insert("title_id".into(), json!(spec.title_id));
    evidence.insert("field".into(), json!(spec.field));
    if let Some(preview) = value.filter(|v| is_scalar(v)) {
        evidence.insert("field_value_preview".into(), preview.clone());
    }

    Verdict::decide(value.is_some(), evidence, SUSPECTED_CAUSES)
}
