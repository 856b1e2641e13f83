//! Event Bus implementation.
//!
//! Every notifying object (a project, a map settings controller) owns its
//! own bus, so dropping a subscription on one object never affects another.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::rc::Rc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::BusEvent;

/// Subscription handle for unsubscribing from events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new unique subscription ID
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Filter to receive only specific event kinds
#[derive(Debug, Clone)]
pub enum EventFilter<K> {
    /// Receive all events.
    All,
    /// Receive events matching any of these kinds.
    Kinds(Vec<K>),
}

impl<K> Default for EventFilter<K> {
    fn default() -> Self {
        EventFilter::All
    }
}

impl<K: PartialEq> EventFilter<K> {
    /// Check if an event kind matches this filter
    pub fn matches(&self, kind: &K) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Kinds(kinds) => kinds.contains(kind),
        }
    }
}

/// Type alias for event handler functions
type EventHandler<E> = Rc<dyn Fn(&E)>;

/// Events buffered per polling receiver before it starts lagging
const CHANNEL_CAPACITY: usize = 256;

/// Synchronous publish/subscribe hub.
///
/// Handlers run on the publishing thread, in subscription-independent order,
/// after the publisher has finished mutating its state. Handlers are called
/// from a snapshot, so a handler may subscribe or unsubscribe (itself
/// included) without deadlocking; changes take effect from the next publish.
pub struct EventBus<E: BusEvent> {
    /// Broadcast channel sender
    sender: broadcast::Sender<E>,
    /// Registered synchronous handlers
    handlers: RwLock<HashMap<SubscriptionId, (EventFilter<E::Kind>, EventHandler<E>)>>,
}

impl<E: BusEvent> EventBus<E> {
    /// Create a new event bus
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of synchronous handlers that received the event.
    pub fn publish(&self, event: E) -> usize {
        let kind = event.kind();
        let targets: Vec<EventHandler<E>> = self
            .handlers
            .read()
            .values()
            .filter(|(filter, _)| filter.matches(&kind))
            .map(|(_, handler)| handler.clone())
            .collect();

        tracing::trace!(?kind, handlers = targets.len(), "publishing event");
        for handler in &targets {
            handler(&event);
        }

        // Polling receivers are optional; having none is not an error.
        let _ = self.sender.send(event);
        targets.len()
    }

    /// Subscribe to events with a synchronous handler
    pub fn subscribe<F>(&self, filter: EventFilter<E::Kind>, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.write().insert(id, (filter, Rc::new(handler)));
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Get a receiver for manual event polling
    ///
    /// Events published after this call are buffered up to a fixed channel
    /// capacity.
    pub fn receiver(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    /// Unsubscribe from events
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.handlers.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Get the number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::events::{MapSettingsEvent, ProjectEvent, ProjectEventKind};
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_event_bus_creation() {
        let bus: EventBus<ProjectEvent> = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let bus: EventBus<ProjectEvent> = EventBus::new();

        let id = bus.subscribe(EventFilter::All, |_| {});
        assert_eq!(bus.subscriber_count(), 1);

        assert!(bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);

        // Double unsubscribe should return false
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn test_event_delivery() {
        let bus: EventBus<ProjectEvent> = EventBus::new();
        let counter = Rc::new(Cell::new(0));
        let counter_clone = counter.clone();

        bus.subscribe(EventFilter::All, move |_| {
            counter_clone.set(counter_clone.get() + 1);
        });

        assert_eq!(bus.publish(ProjectEvent::CrsChanged), 1);
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_event_filtering() {
        let bus: EventBus<ProjectEvent> = EventBus::new();
        let crs_count = Rc::new(Cell::new(0));
        let other_count = Rc::new(Cell::new(0));

        let cc = crs_count.clone();
        bus.subscribe(
            EventFilter::Kinds(vec![ProjectEventKind::CrsChanged]),
            move |_| cc.set(cc.get() + 1),
        );
        let oc = other_count.clone();
        bus.subscribe(
            EventFilter::Kinds(vec![ProjectEventKind::Cleared]),
            move |_| oc.set(oc.get() + 1),
        );

        bus.publish(ProjectEvent::CrsChanged);
        bus.publish(ProjectEvent::CrsChanged);
        bus.publish(ProjectEvent::Cleared);

        assert_eq!(crs_count.get(), 2);
        assert_eq!(other_count.get(), 1);
    }

    #[test]
    fn test_handler_can_unsubscribe_itself() {
        let bus: Rc<EventBus<MapSettingsEvent>> = Rc::new(EventBus::new());
        let slot: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));
        let calls = Rc::new(Cell::new(0));

        let bus_clone = bus.clone();
        let slot_clone = slot.clone();
        let calls_clone = calls.clone();
        let id = bus.subscribe(EventFilter::All, move |_| {
            calls_clone.set(calls_clone.get() + 1);
            if let Some(id) = slot_clone.get() {
                bus_clone.unsubscribe(id);
            }
        });
        slot.set(Some(id));

        bus.publish(MapSettingsEvent::ExtentChanged);
        bus.publish(MapSettingsEvent::ExtentChanged);
        assert_eq!(calls.get(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_polling_receiver() {
        let bus: EventBus<MapSettingsEvent> = EventBus::new();
        let mut receiver = bus.receiver();

        bus.publish(MapSettingsEvent::RotationChanged);
        bus.publish(MapSettingsEvent::LayersChanged);

        assert_eq!(receiver.try_recv(), Ok(MapSettingsEvent::RotationChanged));
        assert_eq!(receiver.try_recv(), Ok(MapSettingsEvent::LayersChanged));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_handlers_see_event_payload() {
        let bus: EventBus<ProjectEvent> = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        bus.subscribe(EventFilter::All, move |event| {
            if let ProjectEvent::LayersAdded(ids) = event {
                seen_clone.borrow_mut().extend(ids.iter().cloned());
            }
        });

        bus.publish(ProjectEvent::LayersAdded(vec!["a".into(), "b".into()]));
        assert_eq!(*seen.borrow(), vec!["a".to_string(), "b".to_string()]);
    }
}
