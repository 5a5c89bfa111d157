//! Command-line definitions for the report binaries.
//!
//! Depends on clap only, so `build.rs` can include it for man pages.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, ValueEnum};

/// Secret backend selectable with `--vault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VaultArg {
    /// Local YAML secrets file at `ANSIBLE_VAULT_PATH`
    Ansible,
    /// HTTP KV store at `VAULT_ADDR`, authenticated with `VAULT_TOKEN`
    Hashicorp,
}

impl VaultArg {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ansible => "ansible",
            Self::Hashicorp => "hashicorp",
        }
    }
}

/// Flags shared by every report.
#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Comma-separated device names, no spaces
    #[arg(long, value_name = "NAMES")]
    pub devices: String,

    /// Secret backend [default: hashicorp]
    #[arg(long, value_enum)]
    pub vault: Option<VaultArg>,

    /// Routing context for switch-side lookups [default: default]
    #[arg(long, value_parser = cli_word)]
    pub vrf: Option<String>,

    /// Persist cookies to --cookie_file on exit
    #[arg(
        long = "save_cookies",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub save_cookies: bool,

    /// Reuse cookies across requests to the same switch
    #[arg(
        long = "process_cookies",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub process_cookies: bool,

    /// Path for cookie persistence
    #[arg(long = "cookie_file", value_name = "PATH")]
    pub cookie_file: Option<PathBuf>,

    /// Suppress the insecure-TLS warning
    #[arg(long = "disable_urllib_warnings")]
    pub disable_urllib_warnings: bool,

    /// Verify switch, inventory and vault TLS certificates
    #[arg(long = "verify_tls")]
    pub verify_tls: bool,

    /// Upper bound on concurrent device workers (capped at 64)
    #[arg(long = "max_workers", value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub max_workers: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = ArgAction::Count)]
    pub verbose: u8,
}

/// Print BIOS and NX-OS versions for each switch.
#[derive(Debug, Parser)]
#[command(name = "switch-version", version, about, long_about = None)]
pub struct VersionCli {
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Print error counters for every interface of each switch.
#[derive(Debug, Parser)]
#[command(name = "interface-errors", version, about, long_about = None)]
pub struct InterfaceErrorsCli {
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// List files on a switch filesystem.
#[derive(Debug, Parser)]
#[command(name = "dir-listing", version, about, long_about = None)]
pub struct DirCli {
    #[command(flatten)]
    pub global: GlobalOpts,

    /// Filesystem path to list
    #[arg(long, default_value = "bootflash:", value_parser = cli_word)]
    pub path: String,
}

/// Print the ARP table of each switch for one VRF.
#[derive(Debug, Parser)]
#[command(name = "arp-table", version, about, long_about = None)]
pub struct ArpCli {
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// A value spliced into a switch CLI command. NX-API splits a command
/// string on `;` and pipes on `|`, so one word is all that is accepted.
pub fn cli_word(value: &str) -> Result<String, String> {
    if value.is_empty() {
        return Err("must not be empty".into());
    }
    if let Some(c) = value.chars().find(|c| c.is_whitespace() || matches!(c, ';' | '|')) {
        return Err(format!("must be a single word; found {c:?}"));
    }
    Ok(value.to_owned())
}
