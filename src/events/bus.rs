//! Topic-keyed event bus with synchronous listeners

use super::{SyncEvent, Topic};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default broadcast channel capacity
const DEFAULT_CAPACITY: usize = 1024;

/// A subscriber callback. Returning `Err` is logged and does not stop
/// delivery to the remaining listeners.
pub type Listener = Arc<dyn Fn(&SyncEvent) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<Topic, Vec<(u64, Listener)>>,
}

/// Event bus that fans out [`SyncEvent`]s to topic listeners.
///
/// Listeners run synchronously, in registration order, on the emitting
/// thread. Every event is also forwarded to a `tokio::sync::broadcast`
/// channel for streaming consumers (WebSocket clients); with no
/// receivers connected the forward is silently dropped.
#[derive(Clone)]
pub struct EventBus {
    registry: Arc<RwLock<Registry>>,
    sender: broadcast::Sender<SyncEvent>,
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    topic: Topic,
    id: u64,
    registry: Weak<RwLock<Registry>>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Remove the listener. Returns false if it was already removed or the
    /// bus is gone. After this returns the listener is never invoked by a
    /// later emit.
    pub fn unsubscribe(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.write();
        let Some(listeners) = registry.listeners.get_mut(&self.topic) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != self.id);
        let removed = listeners.len() != before;
        if listeners.is_empty() {
            registry.listeners.remove(&self.topic);
        }
        removed
    }
}

impl EventBus {
    /// Create a new EventBus with the given broadcast channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
            sender,
        }
    }

    /// Register a listener for a topic
    pub fn subscribe<F>(&self, topic: Topic, listener: F) -> Subscription
    where
        F: Fn(&SyncEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut registry = self.registry.write();
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .listeners
            .entry(topic)
            .or_default()
            .push((id, Arc::new(listener)));

        Subscription {
            topic,
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Receive every emitted event (for WebSocket clients)
    pub fn stream(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }

    /// Number of listeners registered for a topic
    pub fn listener_count(&self, topic: Topic) -> usize {
        self.registry
            .read()
            .listeners
            .get(&topic)
            .map_or(0, Vec::len)
    }

    /// Number of active stream receivers
    pub fn stream_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Deliver an event to the current listeners of its topic.
    ///
    /// Returns the number of listeners that handled it without error.
    pub fn emit(&self, event: SyncEvent) -> usize {
        // Snapshot so listeners may (un)subscribe while being called
        let listeners: Vec<Listener> = self
            .registry
            .read()
            .listeners
            .get(&event.topic)
            .map(|ls| ls.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        let mut delivered = 0;
        for (index, listener) in listeners.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| listener(&event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!(topic = %event.topic, listener = index, "Listener error: {:#}", e);
                }
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    warn!(topic = %event.topic, listener = index, "Listener panicked: {}", reason);
                }
            }
        }

        debug!(
            topic = %event.topic,
            scope = ?event.scope,
            listeners = listeners.len(),
            delivered,
            "SyncEvent emitted"
        );

        // No stream receivers is expected and fine
        let _ = self.sender.send(event);

        delivered
    }

    /// Emit a batch of events in order
    pub fn emit_all(&self, events: impl IntoIterator<Item = SyncEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.read();
        f.debug_struct("EventBus")
            .field("topics", &registry.listeners.len())
            .field("stream_receivers", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn counter_listener(
        counter: &Arc<AtomicUsize>,
    ) -> impl Fn(&SyncEvent) -> anyhow::Result<()> + Send + Sync + 'static {
        let counter = counter.clone();
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_emit_without_listener_no_panic() {
        let bus = EventBus::default();
        let delivered = bus.emit(SyncEvent::new(Topic::JobsUpdated));
        assert_eq!(delivered, 0);
        assert_eq!(bus.listener_count(Topic::JobsUpdated), 0);
    }

    #[test]
    fn test_listeners_called_in_registration_order() {
        let bus = EventBus::default();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            bus.subscribe(Topic::JobAdded, move |_| {
                order.lock().unwrap().push(i);
                Ok(())
            });
        }

        assert_eq!(bus.emit(SyncEvent::new(Topic::JobAdded)), 3);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_only_matching_topic_receives() {
        let bus = EventBus::default();
        let jobs = Arc::new(AtomicUsize::new(0));
        let apps = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Topic::JobsUpdated, counter_listener(&jobs));
        bus.subscribe(Topic::ApplicationsUpdated, counter_listener(&apps));

        bus.emit(SyncEvent::new(Topic::JobsUpdated));

        assert_eq!(jobs.load(Ordering::SeqCst), 1);
        assert_eq!(apps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicUsize::new(0));
        let sub = bus.subscribe(Topic::SyncStarted, counter_listener(&count));

        assert!(sub.unsubscribe());
        bus.emit(SyncEvent::new(Topic::SyncStarted));
        bus.emit(SyncEvent::new(Topic::SyncStarted));

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(bus.listener_count(Topic::SyncStarted), 0);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::default();
        let sub = bus.subscribe(Topic::SyncStarted, |_| Ok(()));
        assert!(sub.unsubscribe());
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_unsubscribe_leaves_other_listeners() {
        let bus = EventBus::default();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let sub_a = bus.subscribe(Topic::JobUpdated, counter_listener(&a));
        bus.subscribe(Topic::JobUpdated, counter_listener(&b));

        sub_a.unsubscribe();
        bus.emit(SyncEvent::new(Topic::JobUpdated));

        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_listener_is_isolated() {
        let bus = EventBus::default();
        let after = Arc::new(AtomicUsize::new(0));

        bus.subscribe(Topic::JobsUpdated, |_| anyhow::bail!("broken listener"));
        bus.subscribe(Topic::JobsUpdated, |_| panic!("panicking listener"));
        bus.subscribe(Topic::JobsUpdated, counter_listener(&after));

        let delivered = bus.emit(SyncEvent::new(Topic::JobsUpdated));

        assert_eq!(delivered, 1);
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_can_unsubscribe_itself() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let sub = {
            let count = count.clone();
            let slot = slot.clone();
            bus.subscribe(Topic::MessageAdded, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                if let Some(sub) = slot.lock().unwrap().as_ref() {
                    sub.unsubscribe();
                }
                Ok(())
            })
        };
        *slot.lock().unwrap() = Some(sub);

        bus.emit(SyncEvent::new(Topic::MessageAdded));
        bus.emit(SyncEvent::new(Topic::MessageAdded));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stream_receives_every_topic() {
        let bus = EventBus::default();
        let mut rx = bus.stream();
        assert_eq!(bus.stream_count(), 1);

        bus.emit(SyncEvent::new(Topic::JobAdded));
        bus.emit(SyncEvent::new(Topic::SyncCompleted).with_scope("all"));

        assert_eq!(rx.try_recv().unwrap().topic, Topic::JobAdded);
        let second = rx.try_recv().unwrap();
        assert_eq!(second.topic, Topic::SyncCompleted);
        assert_eq!(second.scope.as_deref(), Some("all"));
    }

    #[test]
    fn test_clone_shares_registry() {
        let bus = EventBus::default();
        let bus2 = bus.clone();
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Topic::JobDeleted, counter_listener(&count));

        bus2.emit(SyncEvent::new(Topic::JobDeleted));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_after_bus_dropped() {
        let bus = EventBus::default();
        let sub = bus.subscribe(Topic::JobAdded, |_| Ok(()));
        drop(bus);
        assert!(!sub.unsubscribe());
    }
}
