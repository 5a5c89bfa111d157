//! Per-device pipeline: resolve, open a session, run the report, emit.

use std::sync::Arc;

use nxfleet_api::{NetboxClient, NxapiSession, RetryPolicy, SessionConfig};
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::engine::{FanOut, RunSummary};
use crate::error::{DeviceError, ErrorKind};
use crate::report::Report;
use crate::target::{DeviceTarget, Endpoint};
use crate::writer::OutputWriter;

/// Switch login shared by every session of a run.
#[derive(Clone)]
pub struct DeviceLogin {
    pub username: String,
    pub password: SecretString,
}

impl std::fmt::Debug for DeviceLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLogin")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Everything one run needs, shared read-only by all workers.
#[derive(Debug)]
pub struct DevicePipeline<R: Report> {
    inventory: NetboxClient,
    login: DeviceLogin,
    endpoint: Endpoint,
    session_config: SessionConfig,
    retry: RetryPolicy,
    report: R,
    writer: OutputWriter,
}

impl<R: Report> DevicePipeline<R> {
    pub fn new(
        inventory: NetboxClient,
        login: DeviceLogin,
        session_config: SessionConfig,
        report: R,
        writer: OutputWriter,
    ) -> Self {
        Self {
            inventory,
            login,
            endpoint: Endpoint::default(),
            session_config,
            retry: RetryPolicy::default(),
            report,
            writer,
        }
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Emit the header, then fan out over `devices`.
    pub async fn run(self: Arc<Self>, devices: Vec<String>, max_workers: Option<usize>) -> RunSummary {
        if let Err(e) = self.writer.emit(&[self.report.header()]) {
            warn!(error = %e, "failed to write header");
        }

        info!(report = self.report.name(), devices = devices.len(), "querying devices");
        let pipeline = Arc::clone(&self);
        FanOut::new(max_workers)
            .run(devices, move |name| {
                let pipeline = Arc::clone(&pipeline);
                async move { pipeline.run_device(name).await }
            })
            .await
    }

    /// The whole pipeline for one device. The session is released on
    /// every path, flushing cookies when configured.
    pub async fn run_device(&self, name: String) -> Result<(), DeviceError> {
        let ip = self
            .inventory
            .resolve(&name)
            .await
            .map_err(|e| DeviceError::from_api(&name, &e))?;

        let mut target = DeviceTarget::new(name);
        target.resolve_to(ip);
        debug!(device = target.name(), %ip, "resolved");

        let Some(url) = target.nxapi_url(&self.endpoint) else {
            return Err(DeviceError::new(
                target.name(),
                ErrorKind::Resolution,
                format!("cannot build NX-API URL for {ip} with scheme '{}'", self.endpoint.scheme),
            ));
        };

        let mut session = NxapiSession::new(url, self.login.username.clone(), self.login.password.clone())
            .map_err(|e| DeviceError::from_api(target.name(), &e))?
            .with_retry_policy(self.retry.clone());
        session
            .init(&self.session_config)
            .map_err(|e| DeviceError::from_api(target.name(), &e))?;

        let collected = self.report.collect(&target, &mut session).await;
        target.learn_hostname(session.hostname());
        if let Err(e) = session.close() {
            warn!(device = target.name(), error = %e, "failed to persist cookies");
        }

        let lines = collected?;
        debug!(device = target.name(), hostname = target.hostname(), lines = lines.len(), "record ready");
        self.writer
            .emit(&lines)
            .map_err(|e| DeviceError::new(target.name(), ErrorKind::Output, e.to_string()))
    }
}
