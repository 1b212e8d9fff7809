//! Check definitions, typed assertions, and evaluation results.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::assertions::{AssetFreshness, ContainsTitle, FieldExists};
use crate::errors::{EngineError, EngineResult};

/// Loosely-typed key/value block (`assert:` and `target:` in check files).
pub type Params = Map<String, Value>;

/// Insertion-ordered diagnostic key/value pairs.
pub type Evidence = Map<String, Value>;

fn default_severity() -> String {
    "low".to_string()
}

/// A declarative check as supplied by a check source.
///
/// The assertion and target blocks stay raw values here, mapping or not, so
/// that a structurally wrong definition can still be listed; it only fails
/// once evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckDefinition {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_severity")]
    pub severity: String,

    /// Polling hint for collectors. The engine ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,

    #[serde(
        rename = "assert",
        alias = "assertion",
        default,
        skip_serializing_if = "Value::is_null"
    )]
    pub assertion: Value,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub target: Value,
}

impl CheckDefinition {
    /// Raw `assert.type` tag, if it is a string.
    pub fn assertion_type(&self) -> Option<&str> {
        self.assertion.get("type").and_then(Value::as_str)
    }
}

/// A definition block as a parameter map. An absent block is empty; any
/// other non-mapping value is a configuration error.
fn params_block(value: &Value, block: &str) -> EngineResult<Params> {
    match value {
        Value::Null => Ok(Params::new()),
        Value::Object(map) => Ok(map.clone()),
        other => Err(EngineError::InvalidDefinition {
            reason: format!("`{}` must be a mapping, got {}", block, other),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub every_seconds: u64,
}

/// Wire tags of the supported assertion types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionKind {
    ContainsTitle,
    #[serde(rename = "asset_freshness_hours")]
    AssetFreshness,
    FieldExists,
}

impl AssertionKind {
    pub const ALL: [AssertionKind; 3] = [
        AssertionKind::ContainsTitle,
        AssertionKind::AssetFreshness,
        AssertionKind::FieldExists,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssertionKind::ContainsTitle => "contains_title",
            AssertionKind::AssetFreshness => "asset_freshness_hours",
            AssertionKind::FieldExists => "field_exists",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }
}

impl fmt::Display for AssertionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated assertion with its resolved target parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    ContainsTitle(ContainsTitle),
    AssetFreshness(AssetFreshness),
    FieldExists(FieldExists),
}

impl Assertion {
    /// Validate a definition's assertion and target blocks.
    ///
    /// Unknown types and missing or mistyped required fields are
    /// configuration errors; nothing is defaulted except the documented
    /// optional target fields.
    pub fn from_definition(def: &CheckDefinition) -> EngineResult<Self> {
        if def.id.trim().is_empty() {
            return Err(EngineError::InvalidDefinition {
                reason: "check id must not be empty".to_string(),
            });
        }

        let assert = params_block(&def.assertion, "assert")?;
        let target = params_block(&def.target, "target")?;

        let tag = match assert.get("type") {
            None | Some(Value::Null) => return Err(EngineError::MissingAssertionType),
            Some(Value::String(tag)) => tag.as_str(),
            Some(other) => {
                return Err(EngineError::UnknownAssertion {
                    kind: other.to_string(),
                })
            }
        };

        let kind = AssertionKind::parse(tag).ok_or_else(|| EngineError::UnknownAssertion {
            kind: tag.to_string(),
        })?;

        let assertion = match kind {
            AssertionKind::ContainsTitle => {
                Assertion::ContainsTitle(ContainsTitle::from_params(&assert, &target)?)
            }
            AssertionKind::AssetFreshness => Assertion::AssetFreshness(
                AssetFreshness::from_params(&assert, &target)?,
            ),
            AssertionKind::FieldExists => {
                Assertion::FieldExists(FieldExists::from_params(&assert, &target)?)
            }
        };
        Ok(assertion)
    }

    pub fn kind(&self) -> AssertionKind {
        match self {
            Assertion::ContainsTitle(_) => AssertionKind::ContainsTitle,
            Assertion::AssetFreshness(_) => AssertionKind::AssetFreshness,
            Assertion::FieldExists(_) => AssertionKind::FieldExists,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
    Error,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PASS" => Some(CheckStatus::Pass),
            "FAIL" => Some(CheckStatus::Fail),
            "ERROR" => Some(CheckStatus::Error),
            _ => None,
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business outcome of a completed evaluation. Faults are never an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail,
}

impl From<Outcome> for CheckStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Pass => CheckStatus::Pass,
            Outcome::Fail => CheckStatus::Fail,
        }
    }
}

/// What an assertion evaluator returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub outcome: Outcome,
    pub evidence: Evidence,
    pub suspected_causes: Vec<String>,
}

impl Verdict {
    pub fn pass(evidence: Evidence) -> Self {
        Self {
            outcome: Outcome::Pass,
            evidence,
            suspected_causes: Vec::new(),
        }
    }

    pub fn fail(evidence: Evidence, causes: &[&str]) -> Self {
        Self {
            outcome: Outcome::Fail,
            evidence,
            suspected_causes: causes.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// `pass` when `ok`, otherwise `fail` with the given causes.
    pub fn decide(ok: bool, evidence: Evidence, causes: &[&str]) -> Self {
        if ok {
            Self::pass(evidence)
        } else {
            Self::fail(evidence, causes)
        }
    }
}

/// Result of one evaluation. Created fresh per call; the engine keeps no history.
///
/// PASS and FAIL always serialize `evidence` and `suspected_causes`, even
/// when empty. ERROR results omit them when empty, and only ERROR results
/// carry `error`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckResult {
    pub check_id: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub severity: String,

    pub status: CheckStatus,

    /// Evaluation completion time.
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub evidence: Evidence,

    #[serde(default)]
    pub suspected_causes: Vec<String>,

    #[serde(default)]
    pub error: Option<String>,
}

impl Serialize for CheckResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let is_error = self.status == CheckStatus::Error;
        let mut state = serializer.serialize_struct("CheckResult", 8)?;
        state.serialize_field("check_id", &self.check_id)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("severity", &self.severity)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("timestamp", &self.timestamp)?;

        if is_error && self.evidence.is_empty() {
            state.skip_field("evidence")?;
        } else {
            state.serialize_field("evidence", &self.evidence)?;
        }
        if is_error && self.suspected_causes.is_empty() {
            state.skip_field("suspected_causes")?;
        } else {
            state.serialize_field("suspected_causes", &self.suspected_causes)?;
        }
        match &self.error {
            Some(error) => state.serialize_field("error", error)?,
            None => state.skip_field("error")?,
        }
        state.end()
    }
}

impl CheckResult {
    pub fn from_verdict(def: &CheckDefinition, verdict: Verdict, timestamp: DateTime<Utc>) -> Self {
        Self {
            check_id: def.id.clone(),
            description: def.description.clone(),
            severity: def.severity.clone(),
            status: verdict.outcome.into(),
            timestamp,
            evidence: verdict.evidence,
            suspected_causes: verdict.suspected_causes,
            error: None,
        }
    }

    pub fn error(def: &CheckDefinition, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            check_id: def.id.clone(),
            description: def.description.clone(),
            severity: def.severity.clone(),
            status: CheckStatus::Error,
            timestamp,
            evidence: Evidence::new(),
            suspected_causes: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}
