// nxfleet-core: fan-out query engine for NX-API switch fleets.
//
// Sits between the HTTP clients in `nxfleet-api` and the report binaries.
// Owns device targets, the typed command layer, report rendering, the
// bounded worker pool and the serialized output writer.

pub mod command;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod target;
pub mod writer;

pub use engine::{FanOut, MAX_WORKERS_CAP, RunSummary, parse_device_list, pool_size};
pub use error::{DeviceError, ErrorKind};
pub use pipeline::{DeviceLogin, DevicePipeline};
pub use report::{ArpReport, DirReport, InterfaceErrorsReport, Report, VersionReport};
pub use target::{DeviceTarget, Endpoint};
pub use writer::OutputWriter;
