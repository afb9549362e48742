use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use nest_types::Representation;

use crate::error::{NotifyError, Result};
use crate::event::{EventKind, ResourceEvent};

/// Receives events for the resources it subscribed to.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &ResourceEvent) -> Result<()>;
}

/// A listener that forwards events into an unbounded tokio channel.
pub struct ChannelListener {
    sender: mpsc::UnboundedSender<ResourceEvent>,
}

impl ChannelListener {
    /// A listener and the receiver its events arrive on.
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<ResourceEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Arc::new(Self { sender }), receiver)
    }
}

impl EventListener for ChannelListener {
    fn on_event(&self, event: &ResourceEvent) -> Result<()> {
        self.sender
            .send(event.clone())
            .map_err(|_| NotifyError::ListenerClosed)
    }
}

/// The listeners registered against one resource.
///
/// Holds weak handles only: a listener whose owner dropped it is skipped at
/// delivery time and swept out on the next subscribe. Once its resource is
/// deleted the set is closed and refuses new registrations.
#[derive(Default)]
pub struct SubscriberSet {
    listeners: Mutex<Vec<Weak<dyn EventListener>>>,
    /// Written only while `listeners` is locked.
    closed: AtomicBool,
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self) -> Vec<Arc<dyn EventListener>> {
        match self.listeners.lock() {
            Ok(listeners) => listeners.iter().filter_map(Weak::upgrade).collect(),
            Err(_) => {
                warn!("subscriber set lock poisoned, skipping delivery");
                Vec::new()
            }
        }
    }

    /// Number of listeners still alive.
    pub fn len(&self) -> usize {
        self.live().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every registration and refuse new ones.
    pub fn close(&self) {
        let mut listeners = match self.listeners.lock() {
            Ok(listeners) => listeners,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.closed.store(true, Ordering::Release);
        listeners.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Registers listeners and fans events out to them.
///
/// One hub serves a whole tree; it owns the event id sequence so ids are
/// strictly increasing across every resource it notifies for.
pub struct SubscriptionHub {
    last_id: AtomicU64,
}

impl SubscriptionHub {
    pub fn new() -> Self {
        Self {
            last_id: AtomicU64::new(0),
        }
    }

    /// Next event id: the current time in nanoseconds, bumped past the
    /// previous id if the clock has not advanced.
    pub fn next_id(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or_default();
        let mut prev = self.last_id.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last_id
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Register `listener` with `set`. Returns `false` if it was already
    /// registered there, `Closed` if the set's resource is gone.
    pub fn subscribe(&self, set: &SubscriberSet, listener: &Arc<dyn EventListener>) -> Result<bool> {
        let weak = Arc::downgrade(listener);
        let mut listeners = set
            .listeners
            .lock()
            .map_err(|_| NotifyError::Poisoned)?;
        if set.is_closed() {
            return Err(NotifyError::Closed);
        }
        listeners.retain(|existing| existing.strong_count() > 0);
        if listeners.iter().any(|existing| Weak::ptr_eq(existing, &weak)) {
            return Ok(false);
        }
        listeners.push(weak);
        debug!(listeners = listeners.len(), "listener subscribed");
        Ok(true)
    }

    /// Deliver `event` to every live listener in `set`. Returns how many
    /// listeners accepted it.
    pub fn deliver(&self, set: &SubscriberSet, event: &ResourceEvent) -> usize {
        let mut delivered = 0;
        for listener in set.live() {
            match listener.on_event(event) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(path = %event.path, kind = %event.kind, error = %e, "event delivery failed"),
            }
        }
        delivered
    }

    /// Stamp and deliver a `kind` event for the resource at `path`.
    ///
    /// Update events need the fresh representation; without one the event
    /// degrades to carrying the path only.
    pub fn notify(
        &self,
        set: &SubscriberSet,
        kind: EventKind,
        path: &str,
        representation: Option<&Representation>,
    ) -> usize {
        if set.is_empty() {
            return 0;
        }
        let id = self.next_id();
        let event = match (kind, representation) {
            (EventKind::Update, Some(rep)) => ResourceEvent::update(id, rep.clone()),
            (EventKind::Update, None) => ResourceEvent {
                id,
                kind,
                path: path.to_string(),
                representation: None,
            },
            (EventKind::Delete, _) => ResourceEvent::delete(id, path),
        };
        self.deliver(set, &event)
    }

    /// Notify `set` that its resource now looks like `representation`.
    pub fn notify_update(&self, set: &SubscriberSet, representation: &Representation) -> usize {
        self.notify(set, EventKind::Update, &representation.path, Some(representation))
    }

    /// Notify `set` that the resource at `path` was deleted.
    pub fn notify_delete(&self, set: &SubscriberSet, path: &str) -> usize {
        self.notify(set, EventKind::Delete, path, None)
    }
}

impl Default for SubscriptionHub {
    fn default() -> Self {
        Self::new()
    }
}
