//! `contains_title`: a title must appear on the trending surface.

use serde_json::json;

use super::{optional_str, required_str, Block};
use crate::errors::EngineResult;
use crate::model::{AssertionKind, Evidence, Params, Verdict};
use crate::providers::BoundedProvider;

pub const SURFACE: &str = "trending";
pub const DEFAULT_REGION: &str = "US";
pub const DEFAULT_LOCALE: &str = "en-US";

/// Number of surface entries echoed into evidence.
pub const SAMPLE_SIZE: usize = 25;

pub const SUSPECTED_CAUSES: &[&str] = &[
    "surface index not refreshed",
    "eligibility/ranking rule change",
    "region/locale mismatch",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ContainsTitle {
    pub region: String,
    pub locale: String,
    pub title_id: String,
}

impl ContainsTitle {
    pub(crate) fn from_params(assert: &Params, target: &Params) -> EngineResult<Self> {
        let kind = AssertionKind::ContainsTitle;
        Ok(Self {
            region: optional_str(target, Block::Target, "region", DEFAULT_REGION, kind)?,
            locale: optional_str(target, Block::Target, "locale", DEFAULT_LOCALE, kind)?,
            title_id: required_str(assert, Block::Assert, "title_id", kind)?,
        })
    }
}

pub(crate) async fn evaluate(
    spec: &ContainsTitle,
    provider: &BoundedProvider<'_>,
) -> EngineResult<Verdict> {
    let ids = provider.trending(&spec.region, &spec.locale).await?;
    Ok(judge(spec, &ids))
}

/// PASS iff `title_id` is anywhere in the full list, not just the sample.
pub fn judge(spec: &ContainsTitle, ids: &[String]) -> Verdict {
    let sample: Vec<&String> = ids.iter().take(SAMPLE_SIZE).collect();

    let mut evidence = Evidence::new();
    evidence.insert("surface".into(), json!(SURFACE));
    evidence.insert("region".into(), json!(spec.region));
    evidence.insert("locale".into(), json!(spec.locale));
    evidence.insert("surface_response_sample".into(), json!(sample));
    evidence.insert("expected_title_id".into(), json!(spec.title_id));

    let found = ids.iter().any(|id| id == &spec.title_id);
    Verdict::decide(found, evidence, SUSPECTED_CAUSES)
}
