//! Result history for intent checks.
//!
//! The engine itself never persists anything; collectors hand each
//! [`intent_core::CheckResult`] to a [`Store`].

pub mod schema;
pub mod store;

pub use store::{Store, StoredResult};
