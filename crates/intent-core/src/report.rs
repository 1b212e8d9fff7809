//! Console rendering of check results and PASS/FAIL/ERROR tallies.

use std::fmt;

use crate::model::{CheckResult, CheckStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub pass: usize,
    pub fail: usize,
    pub error: usize,
}

impl Summary {
    pub fn from_results(results: &[CheckResult]) -> Self {
        let mut summary = Self::default();
        for r in results {
            match r.status {
                CheckStatus::Pass => summary.pass += 1,
                CheckStatus::Fail => summary.fail += 1,
                CheckStatus::Error => summary.error += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.pass + self.fail + self.error
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Results: pass={} fail={} error={}",
            self.pass, self.fail, self.error
        )
    }
}

pub fn print_summary(results: &[CheckResult]) {
    eprintln!("{}", Summary::from_results(results));
}

/// Human-readable block for one result.
pub fn format_result(result: &CheckResult) -> String {
    let mut out = format!(
        "{:<5} {} [{}]",
        result.status.as_str(),
        result.check_id,
        result.severity
    );
    if !result.description.is_empty() {
        out.push_str(&format!(" {}", result.description));
    }
    if let Some(error) = &result.error {
        out.push_str(&format!("\n      error: {}", error));
    }
    for cause in &result.suspected_causes {
        out.push_str(&format!("\n      suspected: {}", cause));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CheckDefinition, Verdict};
    use chrono::Utc;
    use serde_json::json;

    fn def(id: &str) -> CheckDefinition {
        serde_json::from_value(json!({"id": id, "severity": "high", "description": "d"})).unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let results = vec![
            CheckResult::from_verdict(&def("a"), Verdict::pass(Default::default()), Utc::now()),
            CheckResult::from_verdict(&def("b"), Verdict::fail(Default::default(), &["x"]), Utc::now()),
            CheckResult::error(&def("c"), "boom", Utc::now()),
        ];
        let summary = Summary::from_results(&results);
        assert_eq!(summary, Summary { pass: 1, fail: 1, error: 1 });
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.to_string(), "Results: pass=1 fail=1 error=1");
    }

    #[test]
    fn test_format_result_lists_causes_and_errors() {
        let fail = CheckResult::from_verdict(
            &def("b"),
            Verdict::fail(Default::default(), &["region/locale mismatch"]),
            Utc::now(),
        );
        let text = format_result(&fail);
        assert!(text.starts_with("FAIL  b [high] d"));
        assert!(text.contains("suspected: region/locale mismatch"));

        let error = format_result(&CheckResult::error(&def("c"), "boom", Utc::now()));
        assert!(error.contains("error: boom"));
    }
}
