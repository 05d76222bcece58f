//! Observer fan-out.
//!
//! Every subscriber gets its own bounded channel. New subscribers receive a
//! replay of the whole store before they can see any live event, and live
//! events are pushed with a non-blocking send so one slow observer can never
//! hold up the others or the simulation. An observer whose buffer is full or
//! whose receiver is gone is dropped from the registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{debug, info, warn};
use uav_domain::UavEvent;

use crate::error::{Result, SimError};
use crate::store::SharedUavStore;

/// Diagnostic identifier for a subscriber
pub type SubscriberId = u64;

/// Shared broadcaster handle
pub type SharedBroadcaster = Arc<Broadcaster>;

/// Lifecycle of a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    /// Registered, snapshot replay in progress
    Connecting,
    /// Snapshot delivered, receiving live events
    Active,
    /// Terminal; nothing more will be delivered
    Closed,
}

/// Receiving end handed to an observer by [`Broadcaster::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<UavEvent>,
    state: SubscriberState,
}

impl Subscription {
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    pub const fn state(&self) -> SubscriberState {
        self.state
    }

    /// Wait for the next event. `None` once the subscription is closed.
    pub async fn recv(&mut self) -> Option<UavEvent> {
        if self.state == SubscriberState::Closed {
            return None;
        }
        let event = self.rx.recv().await;
        if event.is_none() {
            self.state = SubscriberState::Closed;
        }
        event
    }

    /// Take the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<UavEvent> {
        if self.state == SubscriberState::Closed {
            return None;
        }
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.state = SubscriberState::Closed;
                None
            }
        }
    }

    /// Drain everything currently buffered.
    pub fn drain(&mut self) -> Vec<UavEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Stop receiving. Buffered events are discarded.
    pub fn close(&mut self) {
        self.rx.close();
        self.state = SubscriberState::Closed;
    }
}

/// Registry of observer channels fed from a [`UavStore`](crate::store::UavStore).
#[derive(Debug)]
pub struct Broadcaster {
    store: SharedUavStore,
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<UavEvent>>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl Broadcaster {
    pub fn new(store: SharedUavStore, buffer: usize) -> Self {
        Self {
            store,
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Register a new observer and replay the current store to it.
    ///
    /// The replay happens under the registry write lock, so no live event
    /// can reach the new channel before the snapshot is complete. Events
    /// published between the store mutation and the fan-out may show up
    /// again after the snapshot; both kinds of event are idempotent when
    /// applied in order.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::SnapshotOverflow`] if the store holds more UAVs
    /// than the per-subscriber buffer.
    pub fn subscribe(&self) -> Result<Subscription> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);
        let mut subscription = Subscription {
            id,
            rx,
            state: SubscriberState::Connecting,
        };

        let mut subscribers = self.subscribers.write();
        let snapshot = self.store.all();
        let replayed = snapshot.len();
        for uav in snapshot {
            if tx.try_send(UavEvent::Updated(uav)).is_err() {
                return Err(SimError::SnapshotOverflow {
                    snapshot: replayed,
                    capacity: self.buffer,
                });
            }
        }
        subscribers.insert(id, tx);
        let total = subscribers.len();
        drop(subscribers);

        subscription.state = SubscriberState::Active;
        info!(subscriber = id, replayed, total, "Subscriber registered");
        Ok(subscription)
    }

    /// Remove an observer. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.write().remove(&id).is_some();
        if removed {
            info!(subscriber = id, "Subscriber removed");
        }
        removed
    }

    /// Deliver an event to every registered observer.
    ///
    /// Never blocks and never fails: observers that cannot take the event are
    /// unsubscribed. Returns the number of observers that accepted it.
    pub fn publish(&self, event: &UavEvent) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();

        {
            let subscribers = self.subscribers.read();
            for (&id, tx) in subscribers.iter() {
                match tx.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(
                            subscriber = id,
                            buffer = self.buffer,
                            "Subscriber lagging, dropping"
                        );
                        dead.push(id);
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(subscriber = id, "Subscriber channel closed");
                        dead.push(id);
                    }
                }
            }
        }

        if !dead.is_empty() {
            let mut subscribers = self.subscribers.write();
            for id in dead {
                subscribers.remove(&id);
            }
        }

        delivered
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    #[must_use]
    pub const fn buffer(&self) -> usize {
        self.buffer
    }
}
