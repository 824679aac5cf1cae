//! End-to-end tests of the file store, watcher and live aggregator.

use std::fs;
use std::time::Duration;

use chrono::NaiveDate;
use hse_pulse::metrics::{DateWindow, Kpi, KpiSet, Snapshot};
use hse_pulse::records::{Domain, Injury};
use hse_pulse::{Aggregator, ChangeBus, FileBackend, LiveAggregator, RecordStore, StoreWatcher};
use tempfile::TempDir;
use tokio::sync::watch;

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
    tokio::time::timeout(Duration::from_secs(5), async {
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
async fn test_external_file_write_triggers_recompute() {
    let temp_dir = TempDir::new().expect("temp dir");
    let backend = FileBackend::new(temp_dir.path()).expect("backend");
    let bus = ChangeBus::new();
    let store = RecordStore::new(backend.clone(), bus.clone());

    let aggregator = Aggregator::new(store)
        .with_kpis(KpiSet::only([Kpi::NcrsOpen]))
        .with_as_of(day(2024, 2, 1));
    let watcher = StoreWatcher::new(backend.clone(), bus.clone(), Duration::from_millis(20))
        .with_domains(aggregator.domains());
    watcher.start().await;

    let live = LiveAggregator::spawn(aggregator, &bus, january());
    let mut receiver = live.subscribe();
    wait_for(&mut receiver, Snapshot::is_ready).await;

    // Another process rewrites the register directly.
    fs::write(
        backend.path_for(Domain::Ncr),
        r#"[{"id": 1, "issuedDate": "2024-01-12", "status": "Open"}]"#,
    )
    .expect("external write");

    let updated = wait_for(&mut receiver, |s| s.is_ready() && s.kpis.ncrs_open == 1).await;
    assert_eq!(updated.kpis.ncrs_open, 1);

    live.shutdown().await;
    watcher.stop().await;
}

#[tokio::test]
async fn test_local_write_round_trips_through_file_store() {
    let temp_dir = TempDir::new().expect("temp dir");
    let backend = FileBackend::new(temp_dir.path()).expect("backend");
    let bus = ChangeBus::new();
    let store = RecordStore::new(backend, bus.clone());

    let live = LiveAggregator::spawn(
        Aggregator::new(store.clone()).with_as_of(day(2024, 2, 1)),
        &bus,
        january(),
    );
    let mut receiver = live.subscribe();
    wait_for(&mut receiver, Snapshot::is_ready).await;

    store
        .append(
            Injury::new(1_704_500_000_000u64)
                .with_date(day(2024, 1, 21))
                .with_lti(true)
                .with_time_off(3),
        )
        .await
        .expect("append");

    let updated = wait_for(&mut receiver, |s| s.is_ready() && s.kpis.lti_count == 1).await;
    assert_eq!(updated.kpis.days_without_lti, 11);
    assert_eq!(updated.kpis.ltisr, 3.0);

    let stored = store.read::<Injury>().await.expect("read back");
    assert_eq!(stored.len(), 1);
    assert!(stored[0].is_lti());

    live.shutdown().await;
}
