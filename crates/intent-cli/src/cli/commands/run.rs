use anyhow::Result;

use super::output::{print_result, print_results};
use crate::cli::args::{RunAllArgs, RunArgs};
use crate::exit_codes;

pub async fn run(args: RunArgs) -> Result<i32> {
    let checks = args.checks.load()?;
    let Some(def) = checks.find(&args.check_id) else {
        eprintln!("unknown check id: {}", args.check_id);
        return Ok(exit_codes::UNKNOWN_CHECK);
    };

    let engine = args.provider.build_engine()?;
    let result = engine.evaluate(def).await;
    print_result(&result, args.format)?;

    Ok(exit_codes::for_results(std::slice::from_ref(&result)))
}

pub async fn run_all(args: RunAllArgs) -> Result<i32> {
    let checks = args.checks.load()?;
    let engine = args.provider.build_engine()?;

    let results = engine.evaluate_all(checks.definitions()).await;
    print_results(&results, args.format)?;

    Ok(exit_codes::for_results(&results))
}
