use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::harness::TaskRegistry;

/// Background task that periodically logs every client task's status.
/// Reads the registry only; its view may lag the tasks themselves.
/// Returns the number of snapshots taken once `stop` fires.
pub async fn run_monitor(registry: Arc<TaskRegistry>, every: Duration, stop: CancellationToken) -> u64 {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut snapshots = 0u64;
    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = interval.tick() => {
                snapshots += 1;
                info!(target: "boxoffice::monitor", "task states: {}", registry.render());
            }
        }
    }
    snapshots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{FixedClock, Inventory};
    use crate::harness::{default_clients, Harness, NoDelay};
    use crate::limits::ACQUIRE_TIMEOUT;
    use crate::model::TimeOfDay;

    #[tokio::test(start_paused = true)]
    async fn monitor_polls_until_stopped() {
        let inventory = Arc::new(Inventory::new(10, ACQUIRE_TIMEOUT).unwrap());
        let h = Harness::new(
            inventory.clone(),
            Arc::new(FixedClock(TimeOfDay::from_hms_opt(12, 0, 0).unwrap())),
            Arc::new(NoDelay),
            default_clients(),
            CancellationToken::new(),
        );
        let stop = CancellationToken::new();
        let monitor = tokio::spawn(run_monitor(h.registry(), Duration::from_millis(100), stop.clone()));

        tokio::time::sleep(Duration::from_millis(450)).await;
        stop.cancel();
        let snapshots = monitor.await.unwrap();

        // Ticks at 0, 100, 200, 300, 400.
        assert_eq!(snapshots, 5);
        assert_eq!(inventory.remaining_capacity(), 10);
    }

    #[tokio::test]
    async fn stopped_before_start_takes_no_snapshot() {
        let stop = CancellationToken::new();
        stop.cancel();
        let snapshots = run_monitor(Arc::new(TaskRegistry::default()), Duration::from_millis(10), stop).await;
        assert_eq!(snapshots, 0);
    }
}
