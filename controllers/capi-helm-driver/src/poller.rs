//! Status poll scheduler
//!
//! Every interval, lists the stored clusters and runs a status pass for each
//! one in an in-progress state. Passes for different clusters run
//! concurrently up to `max_concurrent_syncs`. A tick waits for all of its
//! passes before the next tick starts, so one cluster is never synced twice
//! at once.
//!
//! A failed pass leaves the record as it was and delays that cluster's next
//! pass with a Fibonacci backoff. Errors that cannot succeed on retry wait
//! the full backoff cap. Passes run under the service context, since no user
//! is behind them.

use crate::backoff::FibonacciBackoff;
use crate::config::DriverConfig;
use crate::driver::{ClusterDriver, SyncOutcome};
use crate::error::StoreError;
use crate::store::ClusterStore;
use futures::StreamExt;
use openstack_client::RequestContext;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Backoff state for a cluster
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
    next_attempt: Instant,
}

impl BackoffState {
    fn new(now: Instant) -> Self {
        Self {
            backoff: FibonacciBackoff::default(),
            error_count: 0,
            next_attempt: now,
        }
    }

    fn record_failure(&mut self, now: Instant, retryable: bool) -> Duration {
        self.error_count += 1;
        let delay = if retryable {
            self.backoff.next_backoff()
        } else {
            self.backoff.max_backoff()
        };
        self.next_attempt = now + delay;
        delay
    }

    fn reset(&mut self, now: Instant) {
        self.backoff.reset();
        self.error_count = 0;
        self.next_attempt = now;
    }
}

/// Counts from one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Clusters whose pass ran
    pub synced: usize,
    /// Passes that reached a terminal state
    pub completed: usize,
    /// Passes that failed
    pub failed: usize,
    /// In-progress clusters skipped because they are backing off
    pub deferred: usize,
}

/// Periodic driver of `update_cluster_status`
pub struct Poller {
    driver: Arc<dyn ClusterDriver>,
    store: Arc<dyn ClusterStore>,
    interval: Duration,
    max_concurrent_syncs: usize,
    /// Backoff per in-progress cluster uuid
    backoff_states: Mutex<HashMap<String, BackoffState>>,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("interval", &self.interval)
            .field("max_concurrent_syncs", &self.max_concurrent_syncs)
            .finish_non_exhaustive()
    }
}

impl Poller {
    /// Creates a poller using the interval and concurrency from `config`
    pub fn new(driver: Arc<dyn ClusterDriver>, store: Arc<dyn ClusterStore>, config: &DriverConfig) -> Self {
        Self {
            driver,
            store,
            interval: config.poll_interval,
            max_concurrent_syncs: config.max_concurrent_syncs.max(1),
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    /// Polls until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Polling cluster status every {:?} ({} concurrent passes)",
            self.interval, self.max_concurrent_syncs
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutting down status poller");
                    return;
                }
                _ = ticker.tick() => {
                    match self.poll_once().await {
                        Ok(summary) => debug!("Poll finished: {:?}", summary),
                        Err(e) => error!("Failed to list clusters: {}", e),
                    }
                }
            }
        }
    }

    /// Runs one tick now.
    pub async fn poll_once(&self) -> Result<PollSummary, StoreError> {
        self.poll_at(Instant::now()).await
    }

    /// Runs one tick as if the current time were `now`.
    pub async fn poll_at(&self, now: Instant) -> Result<PollSummary, StoreError> {
        let clusters: Vec<_> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|c| c.status.needs_sync())
            .collect();
        self.prune_backoff(&clusters.iter().map(|c| c.uuid.as_str()).collect());

        let mut summary = PollSummary::default();
        let mut due = Vec::new();
        for cluster in clusters {
            if self.is_backing_off(&cluster.uuid, now) {
                summary.deferred += 1;
            } else {
                due.push(cluster);
            }
        }
        summary.synced = due.len();

        let context = RequestContext::service();
        let context = &context;
        let outcomes: Vec<Option<SyncOutcome>> = futures::stream::iter(due)
            .map(|mut cluster| async move {
                let result = self.driver.update_cluster_status(context, &mut cluster).await;
                self.record(&cluster.uuid, now, result)
            })
            .buffer_unordered(self.max_concurrent_syncs)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                Some(SyncOutcome::Completed(_)) => summary.completed += 1,
                Some(_) => {}
                None => summary.failed += 1,
            }
        }
        Ok(summary)
    }

    /// Drops backoff for clusters that are gone or no longer in progress.
    fn prune_backoff(&self, in_progress: &HashSet<&str>) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.retain(|uuid, _| in_progress.contains(uuid.as_str()));
        }
    }

    fn is_backing_off(&self, uuid: &str, now: Instant) -> bool {
        self.backoff_states
            .lock()
            .map(|states| states.get(uuid).is_some_and(|s| s.next_attempt > now))
            .unwrap_or(false)
    }

    fn record(
        &self,
        uuid: &str,
        now: Instant,
        result: Result<SyncOutcome, crate::error::DriverError>,
    ) -> Option<SyncOutcome> {
        let Ok(mut states) = self.backoff_states.lock() else {
            error!("Backoff state lock poisoned");
            return result.ok();
        };

        match result {
            Ok(outcome) => {
                if let Some(state) = states.get_mut(uuid).filter(|s| s.error_count > 0) {
                    debug!("Cluster {} recovered after {} failures, backoff reset", uuid, state.error_count);
                    state.reset(now);
                }
                Some(outcome)
            }
            Err(e) => {
                let state = states
                    .entry(uuid.to_string())
                    .or_insert_with(|| BackoffState::new(now));
                let delay = state.record_failure(now, e.is_retryable());
                if e.is_retryable() {
                    warn!(
                        "Status pass for cluster {} failed ({} consecutive), retrying in {:?}: {}",
                        uuid, state.error_count, delay, e
                    );
                } else {
                    error!("Status pass for cluster {} cannot succeed on retry: {}", uuid, e);
                }
                None
            }
        }
    }
}
