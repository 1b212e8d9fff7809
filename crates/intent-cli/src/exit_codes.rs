//! Process exit codes. These are part of the CLI contract.

use intent_core::{CheckResult, CheckStatus};

pub const SUCCESS: i32 = 0;
pub const CHECK_FAILED: i32 = 1; // At least one FAIL result
pub const CHECK_ERROR: i32 = 2; // At least one ERROR result
pub const CONFIG_ERROR: i32 = 2; // Check files or flags unusable
pub const UNKNOWN_CHECK: i32 = 3;

/// ERROR outranks FAIL.
pub fn for_results(results: &[CheckResult]) -> i32 {
    if results.iter().any(|r| r.status == CheckStatus::Error) {
        CHECK_ERROR
    } else if results.iter().any(|r| r.status == CheckStatus::Fail) {
        CHECK_FAILED
    } else {
        SUCCESS
    }
}
