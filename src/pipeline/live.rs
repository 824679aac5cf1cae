//! Aggregator kept current by change notifications.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::bus::{ChangeBus, ChangeNotice};
use crate::metrics::{DateWindow, Snapshot};
use crate::pipeline::Aggregator;

/// Runs an [`Aggregator`] once and again after every change to a domain it
/// reads.
///
/// Bursts of notices that arrive while a computation runs collapse into a
/// single recomputation. Dropping the handle stops the task and unsubscribes.
#[derive(Debug)]
pub struct LiveAggregator {
    aggregator: Arc<Aggregator>,
    task: Option<JoinHandle<()>>,
}

impl LiveAggregator {
    /// Must be called inside a tokio runtime.
    pub fn spawn(aggregator: Aggregator, bus: &ChangeBus, window: DateWindow) -> Self {
        let aggregator = Arc::new(aggregator);
        let mut subscription = bus.subscribe(aggregator.domains());

        let task = tokio::spawn({
            let aggregator = Arc::clone(&aggregator);
            async move {
                aggregator.compute(window).await;
                while let Some(notice) = subscription.recv().await {
                    let mut pending = 1usize;
                    while subscription.try_recv().is_some() {
                        pending += 1;
                    }
                    match notice {
                        ChangeNotice::Changed(event) => {
                            tracing::debug!(
                                domain = %event.domain,
                                origin = ?event.origin,
                                pending,
                                "recomputing metrics"
                            );
                        }
                        ChangeNotice::Missed(missed) => {
                            tracing::debug!(missed, "recomputing metrics after lag");
                        }
                    }
                    aggregator.compute(window).await;
                }
            }
        });

        Self {
            aggregator,
            task: Some(task),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.aggregator.subscribe()
    }

    pub fn current(&self) -> Snapshot {
        self.aggregator.current()
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop recomputing and wait for the task to end. Later results are
    /// dropped.
    pub async fn shutdown(mut self) {
        self.aggregator.dispose();
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for LiveAggregator {
    fn drop(&mut self) {
        self.aggregator.dispose();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{Kpi, KpiSet, PipelineStatus};
    use crate::records::{Domain, Incident, Ncr, NcrStatus};
    use crate::store::RecordStore;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn january() -> DateWindow {
        DateWindow::new(day(2024, 1, 1), day(2024, 2, 1)).expect("window")
    }

    async fn wait_for(
        receiver: &mut watch::Receiver<Snapshot>,
        ready: impl Fn(&Snapshot) -> bool,
    ) -> Snapshot {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                {
                    let snapshot = receiver.borrow_and_update();
                    if ready(&snapshot) {
                        return snapshot.clone();
                    }
                }
                receiver.changed().await.expect("aggregator alive");
            }
        })
        .await
        .expect("snapshot in time")
    }

    #[tokio::test]
    async fn test_computes_on_spawn_and_on_change() {
        let store = RecordStore::in_memory();
        let aggregator = Aggregator::new(store.clone()).with_as_of(day(2024, 2, 1));
        let live = LiveAggregator::spawn(aggregator, store.bus(), january());
        let mut receiver = live.subscribe();

        let initial = wait_for(&mut receiver, Snapshot::is_ready).await;
        assert_eq!(initial.kpis.total_incidents, 0);

        store
            .append(Incident::new(1u64).with_date(day(2024, 1, 15)))
            .await
            .expect("append");

        let updated =
            wait_for(&mut receiver, |s| s.is_ready() && s.kpis.total_incidents == 1).await;
        assert_eq!(updated.status, PipelineStatus::Ready);
        live.shutdown().await;
    }

    #[tokio::test]
    async fn test_subscribes_only_to_dependencies() {
        let store = RecordStore::in_memory();
        let aggregator = Aggregator::new(store.clone()).with_kpis(KpiSet::only([Kpi::NcrsOpen]));
        let live = LiveAggregator::spawn(aggregator, store.bus(), january());
        let mut receiver = live.subscribe();
        wait_for(&mut receiver, Snapshot::is_ready).await;
        let generation = live.aggregator().generation();

        store
            .append(Incident::new(1u64).with_date(day(2024, 1, 15)))
            .await
            .expect("append");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(live.aggregator().generation(), generation);

        store
            .append(Ncr::new(2u64).with_date(day(2024, 1, 15)).with_status(NcrStatus::Open))
            .await
            .expect("append");
        let updated = wait_for(&mut receiver, |s| s.is_ready() && s.kpis.ncrs_open == 1).await;
        assert_eq!(updated.kpis.ncrs_open, 1);
        live.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_unsubscribes() {
        let store = RecordStore::in_memory();
        let live = LiveAggregator::spawn(Aggregator::new(store.clone()), store.bus(), january());
        assert_eq!(store.bus().subscriber_count(), 1);
        assert!(live.is_running());

        live.shutdown().await;
        assert_eq!(store.bus().subscriber_count(), 0);
        assert_eq!(store.bus().publish(Domain::Incident), 0);
    }
}
