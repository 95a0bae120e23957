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
    difftable::logging::init().context("init logging")?;

    let cli = difftable::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        difftable::cli::Command::Fetch(args) => {
            difftable::fetch::run(args).await.context("fetch")?;
        }
        difftable::cli::Command::Merge(args) => {
            difftable::merge::run(args).context("merge")?;
        }
        difftable::cli::Command::Update(args) => {
            difftable::update::run(args).await.context("update")?;
        }
    }

    Ok(())
}
