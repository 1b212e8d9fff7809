//! `asset_freshness_hours`: a title's per-device artwork must be recent.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::{optional_f64, optional_str, required_str, Block};
use crate::errors::{EngineError, EngineResult};
use crate::model::{AssertionKind, Evidence, Params, Verdict};
use crate::providers::BoundedProvider;
use crate::resolve::resolve_present;

pub const DEFAULT_DEVICE: &str = "tv_4k";
pub const DEFAULT_MAX_AGE_HOURS: f64 = 24.0;

pub const MISSING_ASSET_CAUSES: &[&str] = &["asset missing for device", "ingestion pipeline failure"];

pub const STALE_ASSET_CAUSES: &[&str] = &[
    "asset generation stalled",
    "CDN/artwork pipeline delay",
    "bad clock or timestamp",
];

#[derive(Debug, Clone, PartialEq)]
pub struct AssetFreshness {
    pub title_id: String,
    pub device: String,
    pub max_age_hours: f64,
}

impl AssetFreshness {
    pub(crate) fn from_params(assert: &Params, target: &Params) -> EngineResult<Self> {
        let kind = AssertionKind::AssetFreshness;
        let title_id = required_str(target, Block::Target, "title_id", kind)?;
        let device = optional_str(target, Block::Target, "device", DEFAULT_DEVICE, kind)?;
        let max_age_hours =
            optional_f64(assert, Block::Assert, "max_age_hours", DEFAULT_MAX_AGE_HOURS, kind)?;

        if !max_age_hours.is_finite() || max_age_hours <= 0.0 {
            return Err(EngineError::InvalidField {
                assertion: kind,
                field: "assert.max_age_hours".to_string(),
                reason: format!("must be a positive number, got {}", max_age_hours),
            });
        }

        Ok(Self {
            title_id,
            device,
            max_age_hours,
        })
    }

    /// Dotted path of the artwork timestamp inside a title record.
    pub fn field_path(&self) -> String {
        format!("assets.{}.artwork_updated_at", self.device)
    }
}

pub(crate) async fn evaluate(
    spec: &AssetFreshness,
    provider: &BoundedProvider<'_>,
) -> EngineResult<Verdict> {
    let record = provider.title(&spec.title_id).await?;
    judge(spec, &record, Utc::now())
}

/// Compare the artwork timestamp in `record` against `now`.
///
/// A missing or empty timestamp is a FAIL; a malformed one is a parse
/// fault. The boundary is inclusive: an age equal to the limit passes.
pub fn judge(spec: &AssetFreshness, record: &Value, now: DateTime<Utc>) -> EngineResult<Verdict> {
    let path = spec.field_path();
    let updated_at = resolve_present(record, &path).filter(|v| v.as_str() != Some(""));

    let mut evidence = Evidence::new();
    evidence.insert("title_id".into(), json!(spec.title_id));
    evidence.insert("device".into(), json!(spec.device));
    evidence.insert("artwork_updated_at".into(), updated_at.cloned().unwrap_or(Value::Null));
    evidence.insert("max_age_hours".into(), json!(spec.max_age_hours));

    let Some(raw) = updated_at else {
        return Ok(Verdict::fail(evidence, MISSING_ASSET_CAUSES));
    };

    let parsed = parse_timestamp(&path, raw)?;
    let age_hours = hours_between(parsed, now);
    evidence.insert("age_hours".into(), json!(round3(age_hours)));

    Ok(Verdict::decide(
        age_hours <= spec.max_age_hours,
        evidence,
        STALE_ASSET_CAUSES,
    ))
}

/// Timestamps must carry an offset; naive ones are rejected.
fn parse_timestamp(field: &str, raw: &Value) -> EngineResult<DateTime<Utc>> {
    let malformed = |reason: String| EngineError::Timestamp {
        field: field.to_string(),
        value: raw.as_str().map(String::from).unwrap_or_else(|| raw.to_string()),
        reason,
    };
    let text = raw
        .as_str()
        .ok_or_else(|| malformed("expected an RFC 3339 string".to_string()))?;
    DateTime::parse_from_rfc3339(text.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| malformed(e.to_string()))
}

fn hours_between(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let delta = now.signed_duration_since(then);
    match delta.num_microseconds() {
        Some(us) => us as f64 / 3_600_000_000.0,
        None => delta.num_seconds() as f64 / 3_600.0,
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
