use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    wxr2jekyll::logging::init().context("init logging")?;

    let cli = wxr2jekyll::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        wxr2jekyll::cli::Command::Import(args) => {
            wxr2jekyll::import::run(args).context("import")?;
        }
        wxr2jekyll::cli::Command::Inspect(args) => {
            wxr2jekyll::inspect::run(args).context("inspect")?;
        }
    }

    Ok(())
}
