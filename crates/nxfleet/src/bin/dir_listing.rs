use std::process::ExitCode;

use nxfleet::cli::DirCli;
use nxfleet_core::DirReport;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match nxfleet::parse::<DirCli>() {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    let path = cli.path;
    nxfleet::run(&cli.global, move |_| DirReport::new(path)).await
}
