use std::process::ExitCode;

use nxfleet::cli::InterfaceErrorsCli;
use nxfleet_core::InterfaceErrorsReport;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match nxfleet::parse::<InterfaceErrorsCli>() {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    nxfleet::run(&cli.global, |_| InterfaceErrorsReport).await
}
