//! Bounded fan-out over devices.
//!
//! One task per device, at most `pool_size` running at once. A failing
//! device is logged and counted; it never cancels the others.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info_span, warn};

use crate::error::DeviceError;

/// Hard ceiling on concurrent workers.
pub const MAX_WORKERS_CAP: usize = 64;

/// Pool size for `devices` names: one worker per device unless
/// `max_workers` asks for fewer, never more than [`MAX_WORKERS_CAP`].
pub fn pool_size(devices: usize, max_workers: Option<usize>) -> usize {
    if devices == 0 {
        return 0;
    }
    max_workers
        .unwrap_or(devices)
        .clamp(1, MAX_WORKERS_CAP)
        .min(devices)
}

/// Split `a,b,,c,` into names. Empty entries are dropped with a warning.
pub fn parse_device_list(raw: &str) -> Vec<String> {
    let mut names = Vec::new();
    for (position, entry) in raw.split(',').enumerate() {
        let name = entry.trim();
        if name.is_empty() {
            warn!(position, "ignoring empty device name");
            continue;
        }
        names.push(name.to_owned());
    }
    names
}

/// Outcome of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    /// 0 if any device succeeded, 2 if all failed.
    pub fn exit_code(&self) -> i32 {
        if self.succeeded > 0 { 0 } else { 2 }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FanOut {
    max_workers: Option<usize>,
}

impl FanOut {
    pub fn new(max_workers: Option<usize>) -> Self {
        Self { max_workers }
    }

    /// Run `worker` for every device and wait for all of them.
    pub async fn run<F, Fut>(&self, devices: Vec<String>, worker: F) -> RunSummary
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DeviceError>> + Send + 'static,
    {
        let size = pool_size(devices.len(), self.max_workers);
        debug!(devices = devices.len(), pool = size, "starting fan-out");

        let permits = Arc::new(Semaphore::new(size));
        let worker = Arc::new(worker);
        let mut tasks = JoinSet::new();

        for device in devices {
            let permits = Arc::clone(&permits);
            let worker = Arc::clone(&worker);
            let span = info_span!("device", device = %device);
            tasks.spawn(
                async move {
                    let Ok(_permit) = permits.acquire_owned().await else {
                        return Err(DeviceError::new(device, crate::ErrorKind::Transport, "worker pool closed"));
                    };
                    worker(device).await
                }
                .instrument(span),
            );
        }

        let mut summary = RunSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => summary.succeeded += 1,
                Ok(Err(e)) => {
                    error!(device = %e.device, kind = %e.kind, "{}", e.message);
                    summary.failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "device worker panicked");
                    summary.failed += 1;
                }
            }
        }

        debug!(succeeded = summary.succeeded, failed = summary.failed, "fan-out complete");
        summary
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ErrorKind;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("sw{i}")).collect()
    }

    #[test]
    fn pool_size_bounds() {
        assert_eq!(pool_size(1, None), 1);
        assert_eq!(pool_size(10, None), 10);
        assert_eq!(pool_size(10, Some(3)), 3);
        assert_eq!(pool_size(3, Some(10)), 3);
        assert_eq!(pool_size(100, None), 64);
        assert_eq!(pool_size(100, Some(500)), 64);
        assert_eq!(pool_size(0, None), 0);
    }

    #[test]
    fn device_list_drops_empty_names() {
        assert_eq!(parse_device_list("a,b,"), vec!["a", "b"]);
        assert_eq!(parse_device_list("a,,b"), vec!["a", "b"]);
        assert_eq!(parse_device_list("x"), vec!["x"]);
        assert!(parse_device_list(",").is_empty());
    }

    #[test]
    fn exit_codes() {
        assert_eq!(RunSummary { succeeded: 1, failed: 5 }.exit_code(), 0);
        assert_eq!(RunSummary { succeeded: 0, failed: 2 }.exit_code(), 2);
    }

    async fn peak_concurrency(devices: usize, max_workers: Option<usize>) -> usize {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let summary = {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            FanOut::new(max_workers)
                .run(names(devices), move |_device| {
                    let in_flight = Arc::clone(&in_flight);
                    let peak = Arc::clone(&peak);
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
                .await
        };

        assert_eq!(summary.succeeded, devices);
        peak.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn worker_cap_bounds_concurrency() {
        assert_eq!(peak_concurrency(10, Some(3)).await, 3);
        assert_eq!(peak_concurrency(1, None).await, 1);
    }

    #[tokio::test]
    async fn hard_cap_applies_without_limit() {
        assert_eq!(peak_concurrency(80, None).await, MAX_WORKERS_CAP);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_others() {
        let summary = FanOut::default()
            .run(vec!["a".into(), "b".into()], |device| async move {
                if device == "b" {
                    Err(DeviceError::new(device, ErrorKind::Resolution, "not found"))
                } else {
                    Ok(())
                }
            })
            .await;

        assert_eq!(summary, RunSummary { succeeded: 1, failed: 1 });
        assert_eq!(summary.exit_code(), 0);
    }

    #[tokio::test]
    async fn panicking_worker_counts_as_failure() {
        let summary = FanOut::default()
            .run(vec!["a".into(), "boom".into()], |device| async move {
                assert_ne!(device, "boom", "worker blew up");
                Ok(())
            })
            .await;

        assert_eq!(summary, RunSummary { succeeded: 1, failed: 1 });
    }

    #[tokio::test]
    async fn all_failed_exits_two() {
        let summary = FanOut::new(Some(2))
            .run(names(4), |device| async move {
                Err(DeviceError::new(device, ErrorKind::Transport, "inventory down"))
            })
            .await;

        assert_eq!(summary.failed, 4);
        assert_eq!(summary.exit_code(), 2);
    }
}
