//! Report binaries for NX-API switch fleets.
//!
//! Each binary parses the shared flags, loads credentials, and hands a
//! report to the core pipeline. Startup failures exit 1; per-device
//! failures are logged and only affect the exit code when every device
//! fails.

pub mod app;
pub mod cli;
pub mod error;

pub use app::{parse, run};
pub use error::CliError;
