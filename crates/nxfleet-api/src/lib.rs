// nxfleet-api: Async Rust clients for NX-API switches and the NetBox inventory

pub mod cookies;
pub mod error;
pub mod inventory;
pub mod nxapi;
pub mod retry;
pub mod transport;

pub use cookies::CookieFile;
pub use error::Error;
pub use inventory::NetboxClient;
pub use nxapi::{
    CliMethod, NxapiSession, ResponseView, ResultCode, RpcError, SessionConfig, SessionState,
};
pub use retry::{Jitter, RetryPolicy};
pub use transport::{TlsMode, TransportConfig};
