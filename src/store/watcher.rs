//! Cross-process change detection for the file store.
//!
//! Another process (a second dashboard, an import script) may rewrite a
//! collection file directly. The watcher polls collection file fingerprints on
//! a fixed interval and publishes [`ChangeOrigin::External`] events for changes
//! this process did not write itself. Local writes are already announced by
//! the [`RecordStore`](crate::store::RecordStore).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::bus::{ChangeBus, ChangeOrigin};
use crate::records::{Domain, DomainSet};
use crate::store::backend::{FileBackend, Fingerprint};

/// Default polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Polls a [`FileBackend`] and feeds external changes into a [`ChangeBus`].
///
/// # Example
///
/// ```ignore
/// let backend = FileBackend::new("/var/lib/hse")?;
/// let bus = ChangeBus::new();
/// let watcher = StoreWatcher::new(backend, bus.clone(), Duration::from_millis(500));
/// watcher.start().await;
/// // ... external writes now arrive on `bus` ...
/// watcher.stop().await;
/// ```
pub struct StoreWatcher {
    backend: FileBackend,
    bus: ChangeBus,
    interval: Duration,
    domains: DomainSet,
    /// Flag to signal the background task to stop.
    stop_flag: Arc<AtomicBool>,
    /// Handle to the background polling task.
    task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl StoreWatcher {
    pub fn new(backend: FileBackend, bus: ChangeBus, interval: Duration) -> Self {
        Self {
            backend,
            bus,
            interval,
            domains: DomainSet::all(),
            stop_flag: Arc::new(AtomicBool::new(false)),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Limit polling to the given domains.
    pub fn with_domains(mut self, domains: DomainSet) -> Self {
        self.domains = domains;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling in the background.
    ///
    /// Fingerprints present at start are the baseline; only later changes are
    /// published. Calling `start` again restarts the task.
    pub async fn start(&self) {
        self.stop().await;
        self.stop_flag.store(false, Ordering::SeqCst);

        let mut baseline: HashMap<Domain, Option<Fingerprint>> = HashMap::new();
        for domain in self.domains.iter() {
            match self.backend.observe(domain).await {
                Ok(observed) => {
                    baseline.insert(domain, observed.fingerprint);
                }
                Err(err) => {
                    tracing::warn!(
                        domain = %domain,
                        error = %err,
                        "could not fingerprint collection"
                    );
                }
            }
        }

        let backend = self.backend.clone();
        let bus = self.bus.clone();
        let domains = self.domains;
        let interval = self.interval.max(Duration::from_millis(1));
        let stop_flag = Arc::clone(&self.stop_flag);

        tracing::info!(
            data_dir = %backend.data_dir().display(),
            interval_ms = interval.as_millis() as u64,
            "store watcher started"
        );

        let handle = tokio::spawn(async move {
            let mut last_seen = baseline;
            loop {
                if stop_flag.load(Ordering::SeqCst) {
                    break;
                }

                tokio::time::sleep(interval).await;

                if stop_flag.load(Ordering::SeqCst) {
                    break;
                }

                for domain in domains.iter() {
                    let observed = match backend.observe(domain).await {
                        Ok(observed) => observed,
                        Err(err) => {
                            tracing::warn!(
                                domain = %domain,
                                error = %err,
                                "could not fingerprint collection"
                            );
                            continue;
                        }
                    };

                    if last_seen.get(&domain) == Some(&observed.fingerprint) {
                        continue;
                    }
                    last_seen.insert(domain, observed.fingerprint);

                    if !observed.own_write {
                        bus.publish_from(domain, ChangeOrigin::External);
                    }
                }
            }
        });

        let mut task = self.task_handle.lock().await;
        *task = Some(handle);
    }

    /// Stop polling and wait for the task to finish.
    pub async fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);

        let handle = {
            let mut task = self.task_handle.lock().await;
            task.take()
        };

        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
            tracing::info!("store watcher stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        let task = self.task_handle.lock().await;
        if let Some(handle) = task.as_ref() {
            !handle.is_finished()
        } else {
            false
        }
    }
}
