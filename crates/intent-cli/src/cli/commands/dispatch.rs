use super::super::args::*;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::List(args) => super::list::run(args),
        Command::Run(args) => super::run::run(args).await,
        Command::RunAll(args) => super::run::run_all(args).await,
        Command::Collect(args) => super::collect::run(args).await,
        Command::History(args) => super::history::run(args),
        Command::Serve(args) => super::serve::run(args).await,
    }
}
