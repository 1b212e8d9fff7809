use anyhow::Result;
use chrono::SecondsFormat;
use intent_core::report::format_result;
use intent_core::CheckResult;

use crate::cli::args::{HistoryArgs, OutputFormat};
use crate::exit_codes;

pub fn run(args: HistoryArgs) -> Result<i32> {
    let store = args.store.open()?;
    let rows = if args.latest {
        store.latest_per_check()?
    } else {
        store.recent_results(args.check.as_deref(), args.limit)?
    };

    match args.format {
        OutputFormat::Json => {
            let results: Vec<&CheckResult> = rows.iter().map(|r| &r.result).collect();
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                eprintln!("no stored results in {}", args.store.db.display());
            }
            for row in &rows {
                println!(
                    "{}  {}",
                    row.result.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                    format_result(&row.result)
                );
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}
