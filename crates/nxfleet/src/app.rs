//! Startup glue shared by every report binary.

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use nxfleet_api::{NetboxClient, SessionConfig};
use nxfleet_config::{Config, SecretBackend, SecretProvider, config_path, load_config_from};
use nxfleet_core::{DeviceLogin, DevicePipeline, Endpoint, OutputWriter, Report, RunSummary, parse_device_list};

use crate::cli::GlobalOpts;
use crate::error::{CliError, exit_code};

/// Parse arguments for `C`. Help and version exit 0, anything else
/// clap rejects exits 1.
pub fn parse<C: Parser>() -> Result<C, ExitCode> {
    C::try_parse().map_err(|err| {
        let _ = err.print();
        if err.use_stderr() {
            ExitCode::from(exit_code::STARTUP)
        } else {
            ExitCode::from(exit_code::SUCCESS)
        }
    })
}

/// Run one report over `--devices` and map the outcome to an exit code.
pub async fn run<R, F>(global: &GlobalOpts, make_report: F) -> ExitCode
where
    R: Report,
    F: FnOnce(&Config) -> R,
{
    init_tracing(global.verbose);

    match execute(global, make_report).await {
        Ok(summary) => {
            info!(succeeded = summary.succeeded, failed = summary.failed, "run complete");
            ExitCode::from(u8::try_from(summary.exit_code()).unwrap_or(exit_code::ALL_FAILED))
        }
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

async fn execute<R, F>(global: &GlobalOpts, make_report: F) -> Result<RunSummary, CliError>
where
    R: Report,
    F: FnOnce(&Config) -> R,
{
    let devices = parse_device_list(&global.devices);
    if devices.is_empty() {
        return Err(CliError::NoDevices);
    }

    let path = config_path();
    let config_error = |source| CliError::Config {
        path: path.display().to_string(),
        source,
    };
    let mut config = load_config_from(&path).map_err(config_error)?;
    apply_overrides(&mut config, global);
    let kind = config.vault_kind().map_err(config_error)?;

    let session_config = session_config_for(&config, global);
    let transport = session_config.transport();

    let backend_name: &'static str = kind.into();
    let secrets = |source| CliError::Secrets {
        backend: backend_name,
        source,
    };
    let backend = SecretBackend::from_env(kind, &config.vault.endpoint, transport.clone()).map_err(secrets)?;
    let creds = backend.fetch().await.map_err(secrets)?;
    debug!(vault = backend_name, user = creds.device_user(), "credentials loaded");

    let inventory = NetboxClient::from_token(creds.inv_url(), creds.inv_token(), &transport).map_err(|source| {
        CliError::Inventory {
            url: creds.inv_url().to_owned(),
            source,
        }
    })?;
    let login = DeviceLogin {
        username: creds.device_user().to_owned(),
        password: creds.device_pass().clone(),
    };
    let endpoint = Endpoint {
        scheme: config.nxapi.scheme.clone(),
        port: config.nxapi.port,
    };

    let report = make_report(&config);
    let pipeline = DevicePipeline::new(inventory, login, session_config, report, OutputWriter::stdout())
        .with_endpoint(endpoint);
    Ok(Arc::new(pipeline).run(devices, config.defaults.max_workers).await)
}

/// Flags win over the config file and environment.
fn apply_overrides(config: &mut Config, global: &GlobalOpts) {
    if let Some(vault) = global.vault {
        config.defaults.vault = vault.as_str().to_owned();
    }
    if let Some(vrf) = &global.vrf {
        config.defaults.vrf.clone_from(vrf);
    }
    if let Some(max) = global.max_workers {
        config.defaults.max_workers = Some(usize::from(max));
    }
    config.defaults.verify_tls |= global.verify_tls;
    config.defaults.disable_urllib_warnings |= global.disable_urllib_warnings;
}

fn session_config_for(config: &Config, global: &GlobalOpts) -> SessionConfig {
    SessionConfig {
        save_cookies: global.save_cookies,
        process_cookies: global.process_cookies,
        cookie_file: global.cookie_file.clone(),
        ..config.session_config()
    }
}
