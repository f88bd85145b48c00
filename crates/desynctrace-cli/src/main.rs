mod args;
mod docs;
mod error;
mod logging;
mod orchestrate;

use std::process::ExitCode;

use clap::Parser;
use desynctrace_config::{ReportFormat, ScanConfig};
use desynctrace_report::{print_summary, read_json, write_json, write_text};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use args::{Cli, Command, ScanArgs};
use error::ScanError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Scan(args) => run_scan(args).await,
        Command::Report { file } => run_report(&file),
        Command::Docs => {
            print!("{}", docs::render());
            ExitCode::SUCCESS
        }
    }
}

async fn run_scan(args: ScanArgs) -> ExitCode {
    logging::init(args.verbose);

    let config_path = args.config.clone();
    let config = match ScanConfig::resolve(config_path.as_deref(), args.into_partial()) {
        Ok(config) => config,
        Err(err) => return fail(ScanError::Config(err)),
    };

    info!(target = %config.target, threads = config.threads, "starting scan");

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("ctrl-c received, cancelling in-flight probes");
            ctrl_c_cancel.cancel();
        }
    });

    if let Err(err) = orchestrate::check_reachable(&config, &cancel).await {
        return fail(err);
    }

    let report = match orchestrate::run(&config, &cancel).await {
        Ok(report) => report,
        Err(err) => return fail(err),
    };

    let write_result = match config.output_format {
        ReportFormat::Json => write_json(&report, &config.output_file),
        ReportFormat::Text => write_text(&report, &config.output_file),
    };
    if let Err(err) = write_result {
        return fail(ScanError::Report(err));
    }

    print_summary(&report);
    ExitCode::SUCCESS
}

fn run_report(file: &std::path::Path) -> ExitCode {
    match read_json(file) {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(err) => fail(ScanError::Report(err)),
    }
}

fn fail(err: ScanError) -> ExitCode {
    error!(%err, "scan failed");
    eprintln!("error: {err}");
    ExitCode::from(err.exit_code() as u8)
}
