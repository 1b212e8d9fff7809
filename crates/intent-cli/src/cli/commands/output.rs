use intent_core::report::{format_result, print_summary};
use intent_core::CheckResult;

use crate::cli::args::OutputFormat;

/// Results go to stdout; the summary line goes to stderr so JSON stays clean.
pub(crate) fn print_results(results: &[CheckResult], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(results)?),
        OutputFormat::Text => {
            for result in results {
                println!("{}", format_result(result));
            }
            print_summary(results);
        }
    }
    Ok(())
}

pub(crate) fn print_result(result: &CheckResult, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Text => println!("{}", format_result(result)),
    }
    Ok(())
}
