//! Container health polling

use crate::{CoreError, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use hubdev_config::PollConfig;
use hubdev_provider::{group_by, Container, ContainerInspector, GroupKey, HealthStatus};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

/// What a single snapshot means for the poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthDecision {
    /// Some containers are still starting (or none are up yet)
    Continue,
    /// Nothing is starting, unhealthy or restarting
    Healthy,
    /// These containers are unhealthy or restarting
    Failing(Vec<Container>),
}

/// Decide from one snapshot whether polling is done.
///
/// An empty snapshot keeps polling: with no containers up there is nothing
/// healthy to report, and the timeout will end the run.
pub fn decide(containers: &[Container]) -> HealthDecision {
    let by_status = group_by(containers, GroupKey::Status);

    let failing: Vec<Container> = [HealthStatus::Unhealthy, HealthStatus::Restarting]
        .iter()
        .filter_map(|status| by_status.get(status.as_str()))
        .flatten()
        .cloned()
        .collect();
    if !failing.is_empty() {
        return HealthDecision::Failing(failing);
    }

    if containers.is_empty() || by_status.contains_key(HealthStatus::Starting.as_str()) {
        return HealthDecision::Continue;
    }

    HealthDecision::Healthy
}

/// Receives every snapshot the poller inspects
pub trait PollObserver: Send {
    fn snapshot(&mut self, containers: &[Container]);
}

/// Observer that ignores snapshots
pub struct NoopObserver;

impl PollObserver for NoopObserver {
    fn snapshot(&mut self, _containers: &[Container]) {}
}

/// Successful end of a poll
#[derive(Debug, Clone)]
pub struct PollReport {
    /// Time spent polling
    pub elapsed: Duration,
    /// The snapshot that was judged healthy
    pub containers: Vec<Container>,
}

/// Polls the container runtime until every container settles
pub struct HealthPoller {
    inspector: ContainerInspector,
    interval: Duration,
    timeout: Duration,
}

impl HealthPoller {
    pub fn new(inspector: ContainerInspector, interval: Duration, timeout: Duration) -> Self {
        Self {
            inspector,
            interval,
            timeout,
        }
    }

    pub fn from_config(inspector: ContainerInspector, config: &PollConfig) -> Self {
        Self::new(inspector, config.interval(), config.timeout())
    }

    /// Inspect on every tick until the containers are healthy, one of them
    /// fails, or the timeout passes.
    ///
    /// Ticks do not wait for the previous inspection, so a slow runtime can
    /// have several in flight. Failed inspections are logged and skipped.
    /// Returning drops the ticker and every pending inspection.
    pub async fn poll(&self, observer: &mut dyn PollObserver) -> Result<PollReport> {
        tracing::info!("Polling for container health status");

        let start = Instant::now();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut inflight = FuturesUnordered::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let elapsed = start.elapsed();
                    if elapsed >= self.timeout {
                        return Err(CoreError::PollTimeout { elapsed });
                    }
                    inflight.push(self.inspector.list());
                }
                Some(result) = inflight.next(), if !inflight.is_empty() => {
                    let containers = match result {
                        Ok(containers) => containers,
                        Err(e) => {
                            tracing::warn!("Container status check failed, retrying: {}", e);
                            continue;
                        }
                    };

                    observer.snapshot(&containers);

                    match decide(&containers) {
                        HealthDecision::Continue => {}
                        HealthDecision::Healthy => {
                            return Ok(PollReport {
                                elapsed: start.elapsed(),
                                containers,
                            });
                        }
                        HealthDecision::Failing(failing) => {
                            return Err(CoreError::ContainerUnhealthy { containers: failing });
                        }
                    }
                }
            }
        }
    }
}
