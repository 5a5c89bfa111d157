// NX-API session
//
// One stateful HTTP client per switch. Owns the cookie jar, the retry
// loop and the NEW -> INITIALIZED -> ACTIVE -> CLOSED lifecycle. Wire
// failures never escape as `Err`; they come back as `ResponseView`s.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, SET_COOKIE};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use url::Url;

use super::envelope;
use super::models::{CliMethod, ResponseView, ResultCode};
use crate::cookies::{CookieFile, CookieMap, parse_cookie_header};
use crate::error::Error;
use crate::retry::RetryPolicy;
use crate::transport::{TlsMode, TransportConfig};

const JSON_RPC_CONTENT_TYPE: &str = "application/json-rpc";

// ── Configuration ────────────────────────────────────────────────────

/// Options accepted by [`NxapiSession::init`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Persist the jar to `cookie_file` on close.
    pub save_cookies: bool,
    /// Replay `Set-Cookie` values on later requests of this session.
    pub process_cookies: bool,
    pub cookie_file: Option<PathBuf>,
    /// Silence the insecure-TLS warning.
    pub disable_urllib_warnings: bool,
    pub verify_tls: bool,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            save_cookies: true,
            process_cookies: true,
            cookie_file: None,
            disable_urllib_warnings: false,
            verify_tls: false,
            connect_timeout_ms: 5000,
            read_timeout_ms: 30_000,
        }
    }
}

impl SessionConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from_verify(self.verify_tls),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            suppress_insecure_warning: self.disable_urllib_warnings,
        }
    }
}

// ── State ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    New,
    Initialized,
    Active,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::New => "new",
            Self::Initialized => "initialized",
            Self::Active => "active",
            Self::Closed => "closed",
        })
    }
}

/// What one POST attempt produced.
enum Attempt {
    /// An HTTP response with its full body.
    Response { status: StatusCode, body: String },
    /// No usable response.
    Failed { code: ResultCode, message: String },
}

impl Attempt {
    fn from_error(err: &reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ResultCode::Timeout
        } else {
            ResultCode::NetworkError
        };
        Self::Failed {
            code,
            message: err.to_string(),
        }
    }

    fn code(&self) -> ResultCode {
        match self {
            Self::Response { status, .. } if *status == StatusCode::OK => ResultCode::Success,
            Self::Response { status, .. } => ResultCode::from_status(*status),
            Self::Failed { code, .. } => *code,
        }
    }
}

// ── Session ──────────────────────────────────────────────────────────

/// Stateful NX-API client bound to one switch.
///
/// `exec` takes `&mut self`, so a session can never have two requests
/// in flight. Dropping an unclosed session closes it, flushing cookies
/// when configured.
pub struct NxapiSession {
    base_url: Url,
    endpoint: Url,
    username: String,
    password: SecretString,
    retry: RetryPolicy,
    state: SessionState,
    http: Option<reqwest::Client>,
    deadline: Duration,
    cookie_jar: Option<Arc<Jar>>,
    cookie_file: Option<CookieFile>,
    hostname: String,
    last_result_code: Option<ResultCode>,
    last_attempts: u32,
}

impl NxapiSession {
    /// Create a session for the switch at `base_url` (e.g. `https://10.0.0.1`).
    ///
    /// Nothing touches the network until [`init`](Self::init) and
    /// [`exec`](Self::exec).
    pub fn new(base_url: Url, username: impl Into<String>, password: SecretString) -> Result<Self, Error> {
        let endpoint = base_url.join("/ins")?;
        Ok(Self {
            base_url,
            endpoint,
            username: username.into(),
            password,
            retry: RetryPolicy::default(),
            state: SessionState::New,
            http: None,
            deadline: TransportConfig::default().request_deadline(),
            cookie_jar: None,
            cookie_file: None,
            hostname: String::new(),
            last_result_code: None,
            last_attempts: 0,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Hostname learned from the first successful response; empty if the
    /// switch never identified itself.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Outcome of the most recent `exec`: the first failing view's code,
    /// or `Success`.
    pub fn last_result_code(&self) -> Option<ResultCode> {
        self.last_result_code
    }

    /// POST attempts spent by the most recent `exec`.
    pub fn last_attempts(&self) -> u32 {
        self.last_attempts
    }

    /// Current jar contents for this switch.
    pub fn cookies(&self) -> CookieMap {
        self.cookie_jar
            .as_ref()
            .and_then(|jar| jar.cookies(&self.endpoint))
            .and_then(|value| value.to_str().ok().map(parse_cookie_header))
            .unwrap_or_default()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Build the HTTP client and cookie jar. NEW -> INITIALIZED.
    pub fn init(&mut self, config: &SessionConfig) -> Result<(), Error> {
        if self.state != SessionState::New {
            return Err(Error::InvalidState {
                state: self.state,
                operation: "init",
            });
        }

        let transport = config.transport();
        self.http = Some(transport.build_client()?);
        self.deadline = transport.request_deadline();
        self.cookie_jar = config.process_cookies.then(|| Arc::new(Jar::default()));
        self.cookie_file = config
            .cookie_file
            .as_ref()
            .filter(|_| config.save_cookies)
            .map(CookieFile::new);
        self.state = SessionState::Initialized;

        debug!(
            url = %self.endpoint,
            process_cookies = config.process_cookies,
            verify_tls = config.verify_tls,
            "NX-API session initialized"
        );
        Ok(())
    }

    /// Release the session. Any state -> CLOSED; idempotent.
    ///
    /// Writes the cookie jar when `save_cookies` and a `cookie_file`
    /// were configured and the jar holds anything.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        let cookies = self.cookies();
        self.state = SessionState::Closed;
        self.http = None;

        if let Some(file) = self.cookie_file.take() {
            if !cookies.is_empty() {
                file.persist(&self.host_key(), &cookies)?;
            }
        }
        debug!(url = %self.endpoint, "NX-API session closed");
        Ok(())
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Run `commands` as one batched request. Returns one view per
    /// command, in request order.
    ///
    /// Network errors, timeouts, 5xx and 408 are retried per the
    /// session's [`RetryPolicy`]; everything else is answered after a
    /// single attempt.
    pub async fn exec(&mut self, method: CliMethod, commands: &[&str]) -> Result<Vec<ResponseView>, Error> {
        let http = match (self.state, self.http.as_ref()) {
            (SessionState::Initialized | SessionState::Active, Some(http)) => http.clone(),
            (state, _) => {
                return Err(Error::InvalidState {
                    state,
                    operation: "exec",
                });
            }
        };
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let payload = serde_json::to_vec(&envelope::build_payload(method, commands)).map_err(|e| {
            Error::Deserialization {
                message: e.to_string(),
                body: String::new(),
            }
        })?;

        let mut attempt = 0;
        let outcome = loop {
            attempt += 1;
            let outcome = self.send_once(&http, &payload).await;
            let code = outcome.code();
            if !self.retry.should_retry(code, attempt) {
                break outcome;
            }
            let delay = self.retry.delay(attempt - 1);
            warn!(
                url = %self.endpoint,
                attempt,
                %code,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "NX-API request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        };
        self.last_attempts = attempt;

        let views = match outcome {
            Attempt::Failed { code, message } => envelope::uniform_failure(commands, code, &message),
            Attempt::Response { status, body } if status == StatusCode::OK => {
                envelope::from_body(method, commands, &body)
            }
            Attempt::Response { status, .. } => envelope::from_status(commands, status),
        };

        self.record_outcome(&views);
        Ok(views)
    }

    async fn send_once(&self, http: &reqwest::Client, payload: &[u8]) -> Attempt {
        debug!(url = %self.endpoint, "POST");

        let mut request = http
            .post(self.endpoint.clone())
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .header(CONTENT_TYPE, JSON_RPC_CONTENT_TYPE)
            .timeout(self.deadline)
            .body(payload.to_vec());

        if let Some(cookies) = self.cookie_jar.as_ref().and_then(|jar| jar.cookies(&self.endpoint)) {
            request = request.header(COOKIE, cookies);
        }

        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(e) => return Attempt::from_error(&e),
        };

        let status = resp.status();
        if status.is_success() {
            self.store_cookies(resp.headers());
        }

        match resp.text().await {
            Ok(body) => Attempt::Response { status, body },
            Err(e) => Attempt::from_error(&e),
        }
    }

    /// Only 2xx responses feed the jar.
    fn store_cookies(&self, headers: &HeaderMap) {
        let Some(jar) = self.cookie_jar.as_ref() else {
            return;
        };
        let mut set_cookies = headers.get_all(SET_COOKIE).iter().peekable();
        if set_cookies.peek().is_some() {
            trace!(url = %self.endpoint, "storing session cookies");
            jar.set_cookies(&mut set_cookies, &self.endpoint);
        }
    }

    fn record_outcome(&mut self, views: &[ResponseView]) {
        self.last_result_code = Some(
            views
                .iter()
                .find(|v| !v.is_success())
                .map_or(ResultCode::Success, |v| v.result_code),
        );

        if self.state == SessionState::Initialized && views.iter().any(ResponseView::is_success) {
            self.hostname = views
                .iter()
                .filter(|v| v.is_success())
                .find_map(|v| v.body.as_ref().and_then(hostname_of))
                .unwrap_or_default();
            self.state = SessionState::Active;
            debug!(url = %self.endpoint, hostname = %self.hostname, "NX-API session active");
        }
    }

    fn host_key(&self) -> String {
        let host = self.base_url.host_str().unwrap_or_default();
        match self.base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        }
    }
}

impl Drop for NxapiSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(url = %self.endpoint, error = %e, "failed to flush cookies on release");
        }
    }
}

impl fmt::Debug for NxapiSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NxapiSession")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("state", &self.state)
            .field("hostname", &self.hostname)
            .finish_non_exhaustive()
    }
}

/// Switches identify themselves as `hostname` or, in `show version`, `host_name`.
fn hostname_of(body: &serde_json::Value) -> Option<String> {
    ["hostname", "host_name"]
        .iter()
        .find_map(|key| body.get(key).and_then(serde_json::Value::as_str))
        .filter(|h| !h.is_empty())
        .map(str::to_owned)
}
