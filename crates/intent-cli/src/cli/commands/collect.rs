use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Result};
use intent_core::{CheckDefinition, CheckEngine, CheckResult, CheckStatus};
use intent_store::Store;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::cli::args::CollectArgs;
use crate::exit_codes;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const RETRY_PAUSE: Duration = Duration::from_secs(3);

pub async fn run(args: CollectArgs) -> Result<i32> {
    let engine = args.provider.build_engine()?;
    let store = args.store.open()?;
    let default_period = Duration::from_secs(args.interval_secs);

    info!(
        checks_dir = %args.checks.checks_dir.display(),
        db = %args.store.db.display(),
        "collector started"
    );

    let mut schedule = Schedule::new(default_period);

    if args.once {
        let results = tick(&args, &engine, &store, &mut schedule).await?;
        return Ok(exit_codes::for_results(&results));
    }

    loop {
        let pause = match tick(&args, &engine, &store, &mut schedule).await {
            Ok(_) => POLL_INTERVAL,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "collector tick failed");
                RETRY_PAUSE
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("stopping collector");
                break;
            }
            _ = tokio::time::sleep(pause) => {}
        }
    }

    Ok(exit_codes::SUCCESS)
}

/// One pass: reload checks, evaluate the due ones, store their results.
///
/// A result that fails to store is logged and its check stays due, so only
/// that check is evaluated again on the next pass. The pass still reports an
/// error once every result has been handled.
async fn tick(
    args: &CollectArgs,
    engine: &CheckEngine,
    store: &Store,
    schedule: &mut Schedule,
) -> Result<Vec<CheckResult>> {
    let checks = args.checks.load()?;
    let now = Instant::now();

    let due: Vec<CheckDefinition> = checks
        .iter()
        .filter(|def| {
            if def.id.is_empty() {
                warn!(description = %def.description, "skipping check without id");
                return false;
            }
            schedule.is_due(&def.id, now)
        })
        .cloned()
        .collect();
    if due.is_empty() {
        return Ok(Vec::new());
    }

    let results = engine.evaluate_all(&due).await;
    let failed = record(&due, &results, args.skip_errors, schedule, now, |r| {
        store.insert_result(r)
    });
    if failed > 0 {
        bail!("{} of {} results could not be stored", failed, results.len());
    }
    Ok(results)
}

/// Hand each result to `sink` and reschedule its check. Returns how many
/// results the sink rejected.
fn record(
    due: &[CheckDefinition],
    results: &[CheckResult],
    skip_errors: bool,
    schedule: &mut Schedule,
    now: Instant,
    mut sink: impl FnMut(&CheckResult) -> Result<i64>,
) -> usize {
    let mut failed = 0;
    for (def, result) in due.iter().zip(results) {
        if skip_errors && result.status == CheckStatus::Error {
            info!(check_id = %def.id, "skipped {} => {}", def.id, result.status);
        } else if let Err(e) = sink(result) {
            warn!(check_id = %def.id, error = %format!("{e:#}"), "failed to store result");
            failed += 1;
            continue;
        } else {
            info!(check_id = %def.id, "stored {} => {}", def.id, result.status);
        }
        schedule.mark_done(def, now);
    }
    failed
}

/// Next due time per check id. Unknown ids are due immediately.
struct Schedule {
    default_period: Duration,
    next_due: HashMap<String, Instant>,
}

impl Schedule {
    fn new(default_period: Duration) -> Self {
        Self {
            default_period,
            next_due: HashMap::new(),
        }
    }

    fn period(&self, def: &CheckDefinition) -> Duration {
        match def.schedule {
            Some(s) if s.every_seconds > 0 => Duration::from_secs(s.every_seconds),
            _ => self.default_period,
        }
    }

    fn is_due(&self, id: &str, now: Instant) -> bool {
        !matches!(self.next_due.get(id), Some(due) if *due > now)
    }

    fn mark_done(&mut self, def: &CheckDefinition, started: Instant) {
        let next = started + self.period(def);
        self.next_due.insert(def.id.clone(), next);
    }
}
