use clap::{Parser, Subcommand};

pub mod common;
pub use common::*;

#[derive(Parser)]
#[command(
    name = "intent",
    version,
    about = "Product intent monitoring: declarative checks against live catalog and surface data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List loaded check definitions
    List(ListArgs),
    /// Evaluate a single check
    Run(RunArgs),
    /// Evaluate every check
    RunAll(RunAllArgs),
    /// Poll checks on their schedule and store results
    Collect(CollectArgs),
    /// Show stored results
    History(HistoryArgs),
    /// Serve the HTTP gateway
    Serve(ServeArgs),
}

#[derive(clap::Args, Clone, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub checks: ChecksArgs,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Clone, Debug)]
pub struct RunArgs {
    pub check_id: String,

    #[command(flatten)]
    pub checks: ChecksArgs,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Clone, Debug)]
pub struct RunAllArgs {
    #[command(flatten)]
    pub checks: ChecksArgs,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Clone, Debug)]
pub struct CollectArgs {
    #[command(flatten)]
    pub checks: ChecksArgs,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Period for checks without `schedule.every_seconds`
    #[arg(
        long,
        env = "DEFAULT_INTERVAL_SECONDS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval_secs: u64,

    /// Do not store ERROR results
    #[arg(long)]
    pub skip_errors: bool,

    /// Run one collection pass and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(clap::Args, Clone, Debug)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Only results of this check
    #[arg(long)]
    pub check: Option<String>,

    #[arg(long, default_value_t = 20)]
    pub limit: u32,

    /// Only the most recent result of every check
    #[arg(long, conflicts_with_all = ["check", "limit"])]
    pub latest: bool,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Clone, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub checks: ChecksArgs,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8003)]
    pub port: u16,
}
