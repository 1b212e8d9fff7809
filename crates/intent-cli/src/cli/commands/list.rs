use anyhow::Result;

use crate::cli::args::{ListArgs, OutputFormat};
use crate::exit_codes;

pub fn run(args: ListArgs) -> Result<i32> {
    let checks = args.checks.load()?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&checks.summaries())?);
        }
        OutputFormat::Text => {
            if checks.is_empty() {
                eprintln!("no checks found in {}", args.checks.checks_dir.display());
            }
            for def in checks.iter() {
                let every = def
                    .schedule
                    .map(|s| format!("every {}s", s.every_seconds))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<32} {:<22} {:<8} {:<10} {}",
                    def.id,
                    def.assertion_type().unwrap_or("?"),
                    def.severity,
                    every,
                    def.description
                );
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}
