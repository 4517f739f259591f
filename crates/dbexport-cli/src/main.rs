mod cli;
use cli::Cli;

use anyhow::Result;
use clap::Parser;
use dbexport::{CancellationToken, Exporter, RunReport, RunStatus};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(report) => exit_code(&report),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<RunReport> {
    let config = cli.export_config()?;
    let driver = dbexport::connect(&cli.database_url()?).await?;
    let exporter = Exporter::from_shared(driver, config);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted; cancelling export");
                cancel.cancel();
            }
        }
    });

    let report = exporter.run(cancel).await;

    match &report.error {
        Some(err) => error!(run_id = %report.run_id, "export failed: {err}"),
        None => info!(
            run_id = %report.run_id,
            status = %report.status,
            snapshot = report.snapshot.as_deref().unwrap_or_default(),
            manifest = ?report.manifest_path,
            "export finished"
        ),
    }

    for failure in &report.failures {
        error!(object = %failure.object, "{}", failure.error);
    }

    Ok(report)
}

fn exit_code(report: &RunReport) -> ExitCode {
    match report.status {
        RunStatus::Succeeded => ExitCode::SUCCESS,
        RunStatus::PartiallySucceeded => ExitCode::from(2),
        RunStatus::Failed => ExitCode::FAILURE,
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("dbexport=debug,warn")
        } else {
            EnvFilter::new("dbexport=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
