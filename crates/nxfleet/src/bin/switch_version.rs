use std::process::ExitCode;

use nxfleet::cli::VersionCli;
use nxfleet_core::VersionReport;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match nxfleet::parse::<VersionCli>() {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    nxfleet::run(&cli.global, |_| VersionReport).await
}
