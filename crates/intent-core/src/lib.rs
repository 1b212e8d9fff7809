//! Check evaluation engine for product intent monitoring.
//!
//! A check is a declarative rule (an assertion type plus target parameters)
//! evaluated against live catalog and surface data. This crate provides:
//!
//! - The check model and its validation into typed assertions
//! - Dotted-path field resolution over nested records
//! - One evaluator per assertion type, producing evidence and suspected causes
//! - [`CheckEngine`], which turns every fault into an `ERROR` result
//! - The [`DataProvider`] port with an HTTP and an in-memory implementation
//! - Loading check definitions from a directory of YAML files
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use intent_core::{load_checks_dir, CheckEngine, EngineSettings, HttpProvider, ProviderConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = HttpProvider::new(ProviderConfig::from_env())?;
//! let engine = CheckEngine::new(Arc::new(provider), EngineSettings::default());
//!
//! let checks = load_checks_dir("./checks".as_ref())?;
//! for result in engine.evaluate_all(checks.definitions()).await {
//!     println!("{} => {}", result.check_id, result.status);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The engine never schedules, retries, or persists. Those concerns belong
//! to the caller.

pub mod assertions;
pub mod engine;
pub mod errors;
pub mod model;
pub mod providers;
pub mod registry;
pub mod report;
pub mod resolve;

pub use engine::{CheckEngine, EngineSettings};
pub use errors::{EngineError, EngineResult, ErrorKind, ProviderCall, ProviderError, ProviderResult};
pub use model::{
    Assertion, AssertionKind, CheckDefinition, CheckResult, CheckStatus, Evidence, Outcome, Params,
    Schedule, Verdict,
};
pub use providers::{DataProvider, FakeProvider, HttpProvider, ProviderConfig};
pub use registry::{load_checks_dir, CheckSet, CheckSummary, LoadError};
pub use resolve::resolve;
