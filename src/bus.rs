//! Change notification bus.
//!
//! Every successful collection write publishes a [`ChangeEvent`] naming the
//! domain that changed. Subscribers declare the domains they depend on and
//! only see events for those. Writes made by another process against the same
//! file store arrive through [`crate::store::StoreWatcher`] with
//! [`ChangeOrigin::External`].

use std::future::Future;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;

use crate::records::{Domain, DomainSet};

/// Where a change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrigin {
    /// Written through this process's store.
    Local,
    /// Detected on disk, written by another process.
    External,
}

/// A domain collection was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub domain: Domain,
    pub origin: ChangeOrigin,
}

/// What a subscriber receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeNotice {
    /// A relevant domain changed.
    Changed(ChangeEvent),
    /// The subscriber fell behind and this many events were dropped; treat
    /// every subscribed domain as changed.
    Missed(u64),
}

/// Typed publish/subscribe channel keyed by [`Domain`].
#[derive(Debug, Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    /// Default number of buffered events per subscriber.
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Announce a same-process change. Returns the number of live subscribers.
    pub fn publish(&self, domain: Domain) -> usize {
        self.publish_from(domain, ChangeOrigin::Local)
    }

    /// Announce a change with an explicit origin.
    ///
    /// # Arguments
    ///
    /// * `domain` - The collection that changed
    /// * `origin` - `Local` for writes in this process, `External` for files
    ///   rewritten by someone else
    ///
    /// # Returns
    ///
    /// The number of live subscribers; 0 when nobody is listening, which is
    /// not an error.
    pub fn publish_from(&self, domain: Domain, origin: ChangeOrigin) -> usize {
        let event = ChangeEvent { domain, origin };
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!(domain = %domain, ?origin, receivers, "published change");
                receivers
            }
            Err(_) => 0,
        }
    }

    /// Subscribe to changes of the given domains. Dropping the subscription
    /// unsubscribes.
    pub fn subscribe(&self, domains: DomainSet) -> ChangeSubscription {
        ChangeSubscription {
            domains,
            receiver: self.sender.subscribe(),
        }
    }

    /// Run `handler` on a background task for every relevant notice until the
    /// returned guard is dropped. Must be called inside a tokio runtime.
    pub fn on_change<F, Fut>(&self, domains: DomainSet, mut handler: F) -> Unsubscribe
    where
        F: FnMut(ChangeNotice) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut subscription = self.subscribe(domains);
        let handle = tokio::spawn(async move {
            while let Some(notice) = subscription.recv().await {
                handler(notice).await;
            }
        });
        Unsubscribe {
            handle: Some(handle),
        }
    }

    /// Live subscriptions, including `on_change` tasks.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of a domain-filtered subscription.
#[derive(Debug)]
pub struct ChangeSubscription {
    domains: DomainSet,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl ChangeSubscription {
    pub fn domains(&self) -> DomainSet {
        self.domains
    }

    /// Wait for the next relevant notice. `None` once every publisher is gone.
    pub async fn recv(&mut self) -> Option<ChangeNotice> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.domains.contains(event.domain) => {
                    return Some(ChangeNotice::Changed(event))
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "change subscriber lagged, resynchronizing");
                    return Some(ChangeNotice::Missed(missed));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<ChangeNotice> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.domains.contains(event.domain) => {
                    return Some(ChangeNotice::Changed(event))
                }
                Ok(_) => continue,
                Err(TryRecvError::Lagged(missed)) => return Some(ChangeNotice::Missed(missed)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

/// Guard for a handler registered with [`ChangeBus::on_change`].
#[derive(Debug)]
pub struct Unsubscribe {
    handle: Option<JoinHandle<()>>,
}

impl Unsubscribe {
    /// Stop delivering notices to the handler.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.cancel();
    }
}
