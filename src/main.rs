use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    let cli = stakewatch::cli::Cli::parse();
    stakewatch::logging::init(cli.global.verbose).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");
    let global = cli.global;

    match cli.command {
        stakewatch::cli::Command::Run(args) => {
            stakewatch::watch::run(&global, args).await.context("run")?;
        }
        stakewatch::cli::Command::Fetch(args) => {
            stakewatch::fetch::run(&global, args)
                .await
                .context("fetch")?;
        }
        stakewatch::cli::Command::Unzip(args) => {
            stakewatch::archive::run(&global, args).context("unzip")?;
        }
        stakewatch::cli::Command::Process(args) => {
            stakewatch::pipeline::run(&global, args)
                .await
                .context("process")?;
        }
        stakewatch::cli::Command::Notify(args) => {
            stakewatch::notify::run(args).await.context("notify")?;
        }
        stakewatch::cli::Command::Db { command } => {
            tokio::task::block_in_place(|| stakewatch::db::run(&global, command))
                .context("db")?;
        }
        stakewatch::cli::Command::Serve(args) => {
            stakewatch::serve::run(args).await.context("serve")?;
        }
    }

    Ok(())
}
