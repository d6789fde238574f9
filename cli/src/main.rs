use std::io::Write;

use clap::Parser;
use constants::REPORT_UNIT_LOG_ENV;
use report_unit::report::{run_report, ReportArgs};

#[derive(Debug, Parser)]
#[command(
    version = std::env!("CARGO_PKG_VERSION"),
    name = "report-unit",
    about = "Turns NUnit, xUnit, MSTest, Gallio and TestNG results into JSON reports",
)]
struct Cli {
    #[command(flatten)]
    report_args: ReportArgs,
}

fn main() -> anyhow::Result<()> {
    setup_logger()?;
    let cli = Cli::parse();
    print_cli_start_info();
    match run_report(cli.report_args) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            log::error!("Error: {:?}", e);
            std::process::exit(exitcode::SOFTWARE);
        }
    }
}

fn setup_logger() -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, log::LevelFilter::Info);
    if let Ok(log) = std::env::var(REPORT_UNIT_LOG_ENV) {
        builder.parse_filters(&log);
    }
    builder.init();
    Ok(())
}

fn print_cli_start_info() {
    log::info!("Starting report-unit {}", env!("CARGO_PKG_VERSION"));
}
