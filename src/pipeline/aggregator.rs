//! On-demand KPI aggregation over a record store.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex as StdMutex, PoisonError};

use chrono::{NaiveDate, Utc};
use tokio::sync::{watch, Mutex};

use crate::metrics::{
    compute_kpis, DateWindow, KpiSet, MetricContext, RecordSet, Snapshot, DEFAULT_HOURS_WORKED,
};
use crate::records::{
    DomainRecord, DomainSet, Incident, Injury, Ncr, Observation, Training, Violation,
};
use crate::store::{RecordStore, StoreResult};

/// Computes [`Snapshot`]s for a [`KpiSet`] and publishes them on a `watch`
/// channel.
///
/// Computations run one at a time. Each request takes a generation number
/// when it is made; a result is published only if no newer request arrived
/// meanwhile, and never after [`dispose`](Self::dispose).
///
/// A request whose future is dropped part way (a caller timeout, a losing
/// `select!` branch) puts the last settled snapshot back, so the channel is
/// never left reporting `loading` with nothing running.
pub struct Aggregator {
    store: RecordStore,
    kpis: KpiSet,
    domains: DomainSet,
    hours_worked: f64,
    /// Fixed "today"; the current UTC date when unset.
    as_of: Option<NaiveDate>,
    sender: watch::Sender<Snapshot>,
    /// Last Ready, Error or Idle snapshot published.
    settled: StdMutex<Snapshot>,
    generation: AtomicU64,
    compute_lock: Mutex<()>,
    disposed: AtomicBool,
}

impl Aggregator {
    /// An aggregator over every KPI.
    pub fn new(store: RecordStore) -> Self {
        let kpis = KpiSet::all();
        let (sender, _) = watch::channel(Snapshot::idle());
        Self {
            store,
            domains: kpis.domains(),
            kpis,
            hours_worked: DEFAULT_HOURS_WORKED,
            as_of: None,
            sender,
            settled: StdMutex::new(Snapshot::idle()),
            generation: AtomicU64::new(0),
            compute_lock: Mutex::new(()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Compute only these KPIs, reading only the domains they depend on.
    pub fn with_kpis(mut self, kpis: KpiSet) -> Self {
        self.domains = kpis.domains();
        self.kpis = kpis;
        self
    }

    pub fn with_hours_worked(mut self, hours_worked: f64) -> Self {
        self.hours_worked = hours_worked;
        self
    }

    /// Evaluate elapsed-day KPIs as of a fixed date.
    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    pub fn kpis(&self) -> &KpiSet {
        &self.kpis
    }

    /// Domains this aggregator reads.
    pub fn domains(&self) -> DomainSet {
        self.domains
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.sender.subscribe()
    }

    /// Latest published snapshot.
    pub fn current(&self) -> Snapshot {
        self.sender.borrow().clone()
    }

    /// Number of computations requested so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Stop publishing. Computations still in flight finish but their results
    /// are dropped.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Compute a snapshot for `window`.
    ///
    /// # Arguments
    ///
    /// * `window` - Reporting window the KPIs are computed over
    ///
    /// # Returns
    ///
    /// The snapshot this request produced, whether or not it was published.
    /// A superseded request returns the current snapshot without reading
    /// anything; a failed read returns the previous values with the error.
    pub async fn compute(&self, window: DateWindow) -> Snapshot {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if self.is_disposed() {
            return self.current();
        }

        self.sender
            .send_modify(|snapshot| *snapshot = Snapshot::loading(snapshot));
        let pending = PendingCompute {
            aggregator: self,
            generation,
            finished: false,
        };

        let _guard = self.compute_lock.lock().await;
        if !self.is_latest(generation) {
            tracing::debug!(generation, "superseded before start, skipping");
            return self.current();
        }

        let as_of = self.as_of.unwrap_or_else(|| Utc::now().date_naive());
        let context = MetricContext::new(window, as_of).with_hours_worked(self.hours_worked);

        let result = match self.load().await {
            Ok(records) => Snapshot::ready(compute_kpis(&records, &context, &self.kpis), window),
            Err(err) => {
                tracing::warn!(error = %err, "metrics read failed, keeping previous values");
                Snapshot::failed(&self.settled(), err.to_string())
            }
        };

        let published = self.publish_if_latest(generation, &result);
        if published {
            tracing::debug!(generation, status = ?result.status, "published snapshot");
        } else if self.is_disposed() {
            tracing::debug!(generation, "aggregator disposed, dropping result");
        } else {
            tracing::debug!(generation, "superseded, dropping result");
        }
        pending.finish();

        result
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn settled(&self) -> Snapshot {
        self.settled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the published snapshot when `generation` is still the newest
    /// request and the aggregator is live. The check runs under the channel's
    /// write lock, so a request arriving concurrently either supersedes this
    /// one or publishes its own `loading` state after it.
    fn publish_if_latest(&self, generation: u64, snapshot: &Snapshot) -> bool {
        self.sender.send_if_modified(|current| {
            if self.is_disposed() || !self.is_latest(generation) {
                return false;
            }
            *current = snapshot.clone();
            if !snapshot.loading {
                *self.settled.lock().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
            }
            true
        })
    }

    async fn load(&self) -> StoreResult<RecordSet> {
        let (incidents, injuries, trainings, ncrs, observations, violations) = futures::try_join!(
            self.read_if_needed::<Incident>(),
            self.read_if_needed::<Injury>(),
            self.read_if_needed::<Training>(),
            self.read_if_needed::<Ncr>(),
            self.read_if_needed::<Observation>(),
            self.read_if_needed::<Violation>(),
        )?;
        Ok(RecordSet {
            incidents,
            injuries,
            trainings,
            ncrs,
            observations,
            violations,
        })
    }

    async fn read_if_needed<R: DomainRecord>(&self) -> StoreResult<Vec<R>> {
        if self.domains.contains(R::DOMAIN) {
            self.store.read::<R>().await
        } else {
            Ok(Vec::new())
        }
    }
}

/// Restores the settled snapshot if a request is dropped before it finishes.
struct PendingCompute<'a> {
    aggregator: &'a Aggregator,
    generation: u64,
    finished: bool,
}

impl PendingCompute<'_> {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for PendingCompute<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let settled = self.aggregator.settled();
        if self.aggregator.publish_if_latest(self.generation, &settled) {
            tracing::debug!(generation = self.generation, "request dropped, restored snapshot");
        }
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("kpis", &self.kpis)
            .field("domains", &self.domains)
            .field("hours_worked", &self.hours_worked)
            .field("as_of", &self.as_of)
            .field("generation", &self.generation())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
