//! Scheduling of the two detectors. Each detector runs in its own critical
//! task loop: a tick is serialized with itself by construction, while the
//! two loops may overlap each other (they touch disjoint relations).

use std::{future::Future, sync::Arc, time::Duration};

use poolbot_common::lang::Languages;
use poolbot_config::NotifyConfig;
use poolbot_tasks::{ShutdownGuard, TaskExecutor};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::*;

use crate::{
    gateway::Notifier,
    payouts::PayoutsCheck,
    traits::{BackendDirectory, PayoutLedger, WorkerMirror},
    types::TickOutcome,
    workers::WorkersCheck,
    NotifyResult,
};

pub struct NotifyService<S, D, N> {
    workers: Arc<WorkersCheck<S, D, N>>,
    payouts: Arc<PayoutsCheck<S, D, N>>,
    workers_interval: Duration,
    payouts_interval: Duration,
}

impl<S, D, N> NotifyService<S, D, N>
where
    S: WorkerMirror + PayoutLedger,
    D: BackendDirectory,
    N: Notifier,
{
    pub fn new(
        store: Arc<S>,
        directory: Arc<D>,
        notifier: Arc<N>,
        languages: Arc<Languages>,
        config: &NotifyConfig,
    ) -> Self {
        let workers = Arc::new(WorkersCheck::new(
            store.clone(),
            directory.clone(),
            notifier.clone(),
            languages.clone(),
            config.clone(),
        ));
        let payouts = Arc::new(PayoutsCheck::new(
            store,
            directory,
            notifier,
            languages,
            config.clone(),
        ));

        Self {
            workers,
            payouts,
            workers_interval: config.check_intervals.workers_interval(),
            payouts_interval: config.check_intervals.payouts_interval(),
        }
    }

    pub fn with_intervals(mut self, workers: Duration, payouts: Duration) -> Self {
        self.workers_interval = workers;
        self.payouts_interval = payouts;
        self
    }

    /// Spawns the two recurring detector loops. Stopping goes through the
    /// executor's shutdown signal, which cancels in-flight ticks at their
    /// next suspension point.
    pub fn start(&self, executor: &TaskExecutor) {
        let workers = self.workers.clone();
        let interval = self.workers_interval;
        executor.spawn_critical_async_with_shutdown("notify-workers", move |shutdown| {
            tick_loop("workers", interval, shutdown, move |guard| {
                let workers = workers.clone();
                async move { workers.run(&guard).await }
            })
        });

        let payouts = self.payouts.clone();
        let interval = self.payouts_interval;
        executor.spawn_critical_async_with_shutdown("notify-payouts", move |shutdown| {
            tick_loop("payouts", interval, shutdown, move |guard| {
                let payouts = payouts.clone();
                async move { payouts.run(&guard).await }
            })
        });
    }
}

async fn tick_loop<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: ShutdownGuard,
    tick: F,
) -> anyhow::Result<()>
where
    F: Fn(ShutdownGuard) -> Fut,
    Fut: Future<Output = NotifyResult<TickOutcome>>,
{
    info!(%name, ?period, "starting notify loop");
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.wait_for_shutdown() => break,
        }

        let guard = shutdown.clone();
        tokio::select! {
            outcome = tick(guard) => match outcome {
                Ok(outcome) => debug!(%name, ?outcome, "tick finished"),
                Err(err) => error!(%name, %err, "tick failed"),
            },
            _ = shutdown.wait_for_shutdown() => {
                info!(%name, "tick cancelled");
                break;
            }
        }
    }

    info!(%name, "notify loop exiting");
    Ok(())
}

#[cfg(test)]
mod test {
    use std::sync::atomic::Ordering;

    use poolbot_tasks::TaskManager;

    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_loops_run_and_stop_on_signal() {
        let store = Arc::new(MemoryMirror::default());
        let directory = Arc::new(StubDirectory::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let service = NotifyService::new(
            store.clone(),
            directory,
            notifier,
            test_languages(),
            &NotifyConfig::default(),
        )
        .with_intervals(Duration::from_millis(10), Duration::from_millis(10));

        let manager = TaskManager::new(tokio::runtime::Handle::current());
        let executor = manager.executor();
        service.start(&executor);

        tokio::time::sleep(Duration::from_millis(100)).await;
        manager.shutdown_signal().send();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(
            store.recorded.load(Ordering::SeqCst) >= 1,
            "the payout loop should have seeded the watermark at least once"
        );
    }
}
