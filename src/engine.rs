use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::{OverlapPolicy, TargetRegistry};
use crate::models::{Outcome, Status};
use crate::probe::Prober;
use crate::report;
use crate::store::HealthStore;

pub struct Monitor {
    targets: TargetRegistry,
    prober: Prober,
    pub store: HealthStore,
}

impl Monitor {
    pub fn new(targets: TargetRegistry, prober: Prober) -> Self {
        let store = HealthStore::new(targets.all());
        info!("Health store warmed with {} targets", targets.len());
        Self {
            targets,
            prober,
            store,
        }
    }

    /// Probes every target concurrently and folds each outcome into the store
    /// as soon as it arrives. Returns once every target has an outcome.
    pub async fn run_cycle(&self) {
        let start_time = Utc::now();
        let mut probes: FuturesUnordered<_> = self
            .targets
            .all()
            .iter()
            .map(|target| async move { (target, self.prober.probe(target).await) })
            .collect();

        let total = probes.len();
        let mut failures = 0;
        while let Some((target, outcome)) = probes.next().await {
            match &outcome {
                Outcome::Success { response_time_ms, .. } => {
                    debug!(target_id = %target.id, latency_ms = response_time_ms, "Probe succeeded");
                }
                Outcome::Failure { error } => {
                    failures += 1;
                    warn!(target_id = %target.id, url = %target.url, error = %error, "Probe failed");
                }
            }

            if let Some(transition) = self.store.apply(&target.id, &outcome, Utc::now()).await {
                let msg = format!(
                    "[CHANGE] {} ({}) {:?} -> {:?}, uptime {} over {} probes",
                    target.name, target.url, transition.from, transition.to, transition.uptime, transition.total_probes
                );
                if transition.to == Status::Failed { error!("{}", msg); } else { warn!("{}", msg); }
            }
        }

        let duration = Utc::now() - start_time;
        info!(
            "Cycle completed {} probes ({} failed) in {:.2}s.",
            total,
            failures,
            duration.num_milliseconds() as f64 / 1000.0
        );

        report::print(&self.store.snapshot().await);
    }

    /// Runs one cycle immediately, then one per interval, forever.
    pub async fn run(self: Arc<Self>, interval: Duration, policy: OverlapPolicy) {
        info!("Keep-alive monitor active: every {}s, overlap policy {:?}", interval.as_secs(), policy);
        Scheduler::new(interval, policy)
            .run(move || {
                let monitor = Arc::clone(&self);
                async move { monitor.run_cycle().await }
            })
            .await
    }
}

/// Fixed-interval trigger. Ticks are measured from the previous tick's start,
/// and the first tick fires immediately.
pub struct Scheduler {
    interval: Duration,
    policy: OverlapPolicy,
    in_flight: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(interval: Duration, policy: OverlapPolicy) -> Self {
        Self {
            interval,
            policy,
            in_flight: None,
        }
    }

    pub fn is_cycle_running(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub async fn run<F, Fut>(mut self, cycle: F)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.trigger(&cycle);
        }
    }

    /// Spawns a cycle unless the overlap policy says to skip it.
    /// Returns whether a cycle was started.
    fn trigger<F, Fut>(&mut self, cycle: &F) -> bool
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.policy == OverlapPolicy::SkipIfRunning && self.is_cycle_running() {
            warn!("Previous cycle still running; skipping this tick");
            return false;
        }
        if self.is_cycle_running() {
            debug!("Previous cycle still running; starting an overlapping one");
        }
        self.in_flight = Some(tokio::spawn(cycle()));
        true
    }
}
