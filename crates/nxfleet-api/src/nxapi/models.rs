// NX-API wire and view types
//
// Requests are JSON-RPC 2.0 envelopes, one per command, batched as an
// ordered array. Every response is normalized into a `ResponseView`
// regardless of whether it came from the switch or was synthesized
// after a transport failure.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Request ──────────────────────────────────────────────────────────

/// JSON-RPC method understood by NX-API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CliMethod {
    /// Structured JSON output.
    Cli,
    /// Plain-text output.
    CliAscii,
}

/// One JSON-RPC request envelope.
///
/// ```json
/// { "jsonrpc": "2.0", "method": "cli", "params": { "cmd": "show version", "version": 1 }, "id": 1 }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub method: CliMethod,
    pub params: RpcParams,
    pub id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcParams {
    pub cmd: String,
    pub version: u32,
}

impl RpcRequest {
    pub fn new(method: CliMethod, cmd: impl Into<String>, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params: RpcParams {
                cmd: cmd.into(),
                version: 1,
            },
            id,
        }
    }
}

// ── Result codes ─────────────────────────────────────────────────────

/// Per-command outcome. HTTP-shaped codes plus three synthetic ones for
/// failures that never produced a usable HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Success,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Internal,
    /// Any other HTTP status or JSON-RPC error code, carried verbatim.
    Other(i64),
    /// Connection refused, reset, DNS failure, body read failure.
    NetworkError,
    /// Request deadline exceeded.
    Timeout,
    /// Response body was not the expected JSON shape.
    ParseError,
}

impl ResultCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            200 => Self::Success,
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            500 => Self::Internal,
            other => Self::Other(other),
        }
    }

    pub fn from_status(status: reqwest::StatusCode) -> Self {
        Self::from_code(i64::from(status.as_u16()))
    }

    /// Numeric form. Synthetic codes are negative.
    pub fn code(self) -> i64 {
        match self {
            Self::Success => 200,
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Internal => 500,
            Self::Other(code) => code,
            Self::NetworkError => -1,
            Self::Timeout => -2,
            Self::ParseError => -3,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    pub fn is_auth_failure(self) -> bool {
        matches!(self, Self::Unauthorized | Self::Forbidden)
    }

    /// Network errors, timeouts, 5xx and 408 are worth another attempt.
    pub fn is_retryable(self) -> bool {
        match self {
            Self::NetworkError | Self::Timeout | Self::Internal => true,
            Self::Other(code) => code == 408 || (500..=599).contains(&code),
            _ => false,
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkError => f.write_str("network error"),
            Self::Timeout => f.write_str("timeout"),
            Self::ParseError => f.write_str("parse error"),
            other => write!(f, "{}", other.code()),
        }
    }
}

// ── Response view ────────────────────────────────────────────────────

/// Error payload of a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// Normalized result of one command.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseView {
    /// The command this view answers.
    pub command: String,
    pub result_code: ResultCode,
    /// Parsed `result.body` for `cli`; `None` on failure or for `cli_ascii`.
    pub body: Option<serde_json::Value>,
    /// Raw text: the element JSON, or `result.msg` for `cli_ascii`.
    pub raw: String,
    pub error: Option<RpcError>,
}

impl ResponseView {
    pub fn success(command: impl Into<String>, body: Option<serde_json::Value>, raw: String) -> Self {
        Self {
            command: command.into(),
            result_code: ResultCode::Success,
            body,
            raw,
            error: None,
        }
    }

    pub fn failure(command: impl Into<String>, result_code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            result_code,
            body: None,
            raw: String::new(),
            error: Some(RpcError {
                code: result_code.code(),
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result_code.is_success()
    }

    /// Error message, or an empty string for successful views.
    pub fn message(&self) -> &str {
        self.error.as_ref().map_or("", |e| e.message.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_serializes_as_jsonrpc() {
        let req = RpcRequest::new(CliMethod::Cli, "show version", 1);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "method": "cli",
                "params": { "cmd": "show version", "version": 1 },
                "id": 1
            })
        );
    }

    #[test]
    fn ascii_method_name() {
        let req = RpcRequest::new(CliMethod::CliAscii, "show clock", 7);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["method"], "cli_ascii");
    }

    #[test]
    fn codes_round_trip_through_numbers() {
        for code in [200, 400, 401, 403, 404, 500, 503, -32602] {
            assert_eq!(ResultCode::from_code(code).code(), code);
        }
        assert_eq!(ResultCode::NetworkError.code(), -1);
        assert_eq!(ResultCode::Timeout.code(), -2);
        assert_eq!(ResultCode::ParseError.code(), -3);
    }

    #[test]
    fn failure_view_carries_message() {
        let view = ResponseView::failure("show version", ResultCode::Unauthorized, "Unauthorized");
        assert!(!view.is_success());
        assert_eq!(view.message(), "Unauthorized");
        assert_eq!(view.error.unwrap().code, 401);
    }
}
