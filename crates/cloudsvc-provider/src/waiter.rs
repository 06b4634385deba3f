//! Change waiter: polls a service until a submitted change settles.
//!
//! The waiter owns the only long wall-clock wait in the controller. Both of
//! its suspension points, the remote `get` and the poll sleep, race the
//! caller's [`CancellationToken`], so cancellation is observed promptly
//! instead of after the next poll.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cloudsvc_api::{RemoteService, ServiceApi};
use cloudsvc_core::{ServiceId, ServiceState};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};

/// Source of time for the waiter. Tests inject a fake clock.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// The change being waited for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Minimum pause between two polls.
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub backoff_factor: f64,
    /// Consecutive not-found observations tolerated before giving up.
    pub not_found_checks: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(30),
            backoff_factor: 1.5,
            not_found_checks: 20,
        }
    }
}

impl PollPolicy {
    fn next_interval(&self, current: Duration) -> Duration {
        current
            .mul_f64(self.backoff_factor.max(1.0))
            .clamp(self.initial_interval, self.max_interval.max(self.initial_interval))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Pending,
    Success,
    Failure,
}

/// Maps a remote state onto the waiter's three outcomes.
pub fn classify(state: ServiceState) -> Classification {
    match state {
        ServiceState::Running => Classification::Success,
        ServiceState::PoweredOff | ServiceState::Deleted => Classification::Failure,
        ServiceState::Provisioning | ServiceState::Rebuilding | ServiceState::Rebalancing => {
            Classification::Pending
        }
        ServiceState::Unknown => {
            warn!("Service reported a state this client does not know, treating it as pending");
            Classification::Pending
        }
    }
}

#[derive(Clone)]
pub struct ChangeWaiter {
    api: Arc<dyn ServiceApi>,
    clock: Arc<dyn Clock>,
    policy: PollPolicy,
}

impl ChangeWaiter {
    pub fn new(api: Arc<dyn ServiceApi>, clock: Arc<dyn Clock>, policy: PollPolicy) -> Self {
        Self { api, clock, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Polls `id` until it is running and returns the final representation.
    ///
    /// Pauses are capped at what is left of `timeout`, so the last poll
    /// happens at the deadline and never after it. A poll that is still in
    /// flight when the budget runs out is abandoned, except the one issued
    /// at the deadline itself, which is bounded by the API client.
    ///
    /// # Errors
    ///
    /// - `OperationFailed` when the service reaches a terminal failure state.
    /// - `OperationTimedOut` when `timeout` elapses while still pending.
    /// - `Cancelled` when `cancel` fires.
    /// - `NotFound` when the service stays invisible for longer than the
    ///   policy tolerates.
    pub async fn wait(
        &self,
        id: &ServiceId,
        operation: Operation,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> ProviderResult<RemoteService> {
        let service = id.encode();
        let cancelled = || ProviderError::Cancelled {
            operation,
            service: id.encode(),
        };
        let timed_out = |polls: u32| {
            warn!(service = %id, %operation, waited = ?timeout, polls, "Gave up waiting for service");
            ProviderError::OperationTimedOut {
                operation,
                service: id.encode(),
                waited: timeout,
            }
        };

        let started = self.clock.now();
        let elapsed = || self.clock.now().saturating_duration_since(started);
        let mut interval = self.policy.initial_interval;
        let mut polls = 0u32;
        let mut missing = 0u32;

        loop {
            let budget = timeout.saturating_sub(elapsed());
            let deadline = async {
                if budget.is_zero() {
                    std::future::pending::<()>().await;
                }
                self.clock.sleep(budget).await;
            };
            let observed = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                result = self.api.get(&id.project, &id.service_name) => result,
                _ = deadline => return Err(timed_out(polls)),
            };
            polls += 1;

            match observed {
                Ok(remote) => {
                    missing = 0;
                    debug!(%service, %operation, state = %remote.state, polls, "Polled service");
                    match classify(remote.state) {
                        Classification::Success => {
                            info!(%service, %operation, polls, "Service is running");
                            return Ok(remote);
                        }
                        Classification::Failure => {
                            let detail = remote.error.clone().unwrap_or_else(|| {
                                format!("service reported {} while waiting for {operation}", remote.state)
                            });
                            return Err(ProviderError::OperationFailed {
                                service,
                                status: remote.state,
                                detail,
                            });
                        }
                        Classification::Pending => {}
                    }
                }
                Err(e) if e.is_not_found() && missing < self.policy.not_found_checks => {
                    missing += 1;
                    debug!(%service, %operation, missing, "Service not visible yet");
                }
                Err(e) => return Err(e.into()),
            }

            let remaining = timeout.saturating_sub(elapsed());
            if remaining.is_zero() {
                return Err(timed_out(polls));
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                _ = self.clock.sleep(interval.min(remaining)) => {}
            }
            interval = self.policy.next_interval(interval);
        }
    }
}
