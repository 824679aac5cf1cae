//! Critical-incident classification and the live alert feed.
//!
//! The classifier drives notifications only; the KPI snapshot counts critical
//! incidents through [`is_critical`] but never embeds the list.

use std::cmp::Ordering;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::bus::{ChangeBus, ChangeNotice};
use crate::records::{Domain, DomainSet, Incident, Severity};
use crate::store::RecordStore;

const CRITICAL_MARKERS: [&str; 2] = ["fatality", "serious"];

/// High or critical severity, or a fatality/serious marker in the type or
/// description.
pub fn is_critical(incident: &Incident) -> bool {
    if matches!(incident.severity, Some(Severity::High | Severity::Critical)) {
        return true;
    }
    [&incident.incident_type, &incident.description]
        .into_iter()
        .flatten()
        .map(|text| text.to_lowercase())
        .any(|text| CRITICAL_MARKERS.iter().any(|marker| text.contains(marker)))
}

/// Critical incidents, newest first.
///
/// Dated incidents come first, by date descending. Ties and undated incidents
/// fall back to the record id, most recent first.
pub fn classify(incidents: &[Incident]) -> Vec<Incident> {
    let mut critical: Vec<Incident> = incidents
        .iter()
        .filter(|incident| is_critical(incident))
        .cloned()
        .collect();
    critical.sort_by(newest_first);
    critical
}

fn newest_first(a: &Incident, b: &Incident) -> Ordering {
    let by_date = match (a.incident_date, b.incident_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date.then_with(|| b.id.recency_cmp(&a.id))
}

/// Keeps the classified incident list current as the Incident register
/// changes.
///
/// The task stops when the feed is dropped or [`shutdown`](Self::shutdown).
#[derive(Debug)]
pub struct AlertFeed {
    receiver: watch::Receiver<Vec<Incident>>,
    task: Option<JoinHandle<()>>,
}

impl AlertFeed {
    /// Classify once, then again on every Incident change. Must be called
    /// inside a tokio runtime.
    pub fn spawn(store: RecordStore, bus: &ChangeBus) -> Self {
        let (sender, receiver) = watch::channel(Vec::new());
        let mut subscription = bus.subscribe(DomainSet::empty().with(Domain::Incident));

        let task = tokio::spawn(async move {
            refresh(&store, &sender).await;
            while let Some(notice) = subscription.recv().await {
                if let ChangeNotice::Missed(missed) = notice {
                    tracing::debug!(missed, "alert feed resynchronizing");
                }
                refresh(&store, &sender).await;
                if sender.is_closed() {
                    break;
                }
            }
        });

        Self {
            receiver,
            task: Some(task),
        }
    }

    /// Current critical incidents.
    pub fn current(&self) -> Vec<Incident> {
        self.receiver.borrow().clone()
    }

    /// Receiver notified after every refresh that changed the list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Incident>> {
        self.receiver.clone()
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for AlertFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn refresh(store: &RecordStore, sender: &watch::Sender<Vec<Incident>>) {
    match store.read::<Incident>().await {
        Ok(incidents) => {
            let critical = classify(&incidents);
            tracing::debug!(count = critical.len(), "critical incidents refreshed");
            sender.send_if_modified(|current| {
                if *current == critical {
                    return false;
                }
                *current = critical;
                true
            });
        }
        Err(err) => {
            tracing::warn!(error = %err, "could not refresh critical incidents");
        }
    }
}
