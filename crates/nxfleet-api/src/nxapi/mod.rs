// NX-API client modules
//
// JSON-RPC 2.0 over HTTPS POST to `/ins`. `models` holds the wire and
// view types, `envelope` maps raw responses onto per-command views, and
// `session` owns the per-device HTTP state (cookies, retries, lifecycle).

pub mod envelope;
pub mod models;
pub mod session;

pub use models::{CliMethod, ResponseView, ResultCode, RpcError, RpcRequest};
pub use session::{NxapiSession, SessionConfig, SessionState};
