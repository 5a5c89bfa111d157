use std::process::ExitCode;

use nxfleet::cli::ArpCli;
use nxfleet_core::ArpReport;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match nxfleet::parse::<ArpCli>() {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    // --vrf is already folded into the config by the time the report is built.
    nxfleet::run(&cli.global, |config| ArpReport::new(config.defaults.vrf.clone())).await
}
