//! Typed simulation events with per-kind ring buffers and an observer
//! registry.
//!
//! Components emit events as data while the tick phases run; the engine
//! delivers everything buffered at the end of the tick, in registration
//! order, and also returns the drained events to the caller. Zero
//! subscribers is the common case and costs nothing beyond buffering.

use crate::fixed::Fixed64;
use crate::grid::GridPos;
use crate::id::{CrateId, CurrencyType, ItemDefId, RecipeId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event observed by the UI / analytics layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudioEvent {
    // -- Production --
    ProductionProgress {
        recipe: RecipeId,
        fraction: Fixed64,
    },
    MilestoneReached {
        recipe: RecipeId,
        fraction: Fixed64,
    },
    ProductionCompleted {
        recipe: RecipeId,
    },

    // -- Grid --
    ItemSpawned {
        pos: GridPos,
        item: ItemDefId,
    },
    ItemMerged {
        pos: GridPos,
        item: ItemDefId,
    },
    CrateDepleted {
        crate_id: CrateId,
    },

    // -- Economy --
    CurrencyChanged {
        currency: CurrencyType,
        amount: i64,
    },
    OverflowUpdated {
        stored: u32,
        slots: u32,
    },
    FameLevelChanged {
        level: u32,
    },

    // -- Distribution --
    RecipeQueued {
        recipe: RecipeId,
    },
    RecipeDistributed {
        recipe: RecipeId,
        money: i64,
        fans: i64,
    },
}

/// Discriminant tag for event types, used for subscription and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ProductionProgress,
    MilestoneReached,
    ProductionCompleted,
    ItemSpawned,
    ItemMerged,
    CrateDepleted,
    CurrencyChanged,
    OverflowUpdated,
    FameLevelChanged,
    RecipeQueued,
    RecipeDistributed,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 11;

impl StudioEvent {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            StudioEvent::ProductionProgress { .. } => EventKind::ProductionProgress,
            StudioEvent::MilestoneReached { .. } => EventKind::MilestoneReached,
            StudioEvent::ProductionCompleted { .. } => EventKind::ProductionCompleted,
            StudioEvent::ItemSpawned { .. } => EventKind::ItemSpawned,
            StudioEvent::ItemMerged { .. } => EventKind::ItemMerged,
            StudioEvent::CrateDepleted { .. } => EventKind::CrateDepleted,
            StudioEvent::CurrencyChanged { .. } => EventKind::CurrencyChanged,
            StudioEvent::OverflowUpdated { .. } => EventKind::OverflowUpdated,
            StudioEvent::FameLevelChanged { .. } => EventKind::FameLevelChanged,
            StudioEvent::RecipeQueued { .. } => EventKind::RecipeQueued,
            StudioEvent::RecipeDistributed { .. } => EventKind::RecipeDistributed,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Observers
// ---------------------------------------------------------------------------

/// A registered observer receives events read-only.
pub type Observer = Box<dyn FnMut(&StudioEvent)>;

/// Handle returned by [`EventBus::subscribe`]; pass to
/// [`EventBus::unsubscribe`] to remove the observer. Unsubscribing twice is
/// a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct ObserverEntry {
    id: SubscriberId,
    observer: Observer,
}

impl std::fmt::Debug for ObserverEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverEntry")
            .field("id", &self.id)
            .field("observer", &"<fn>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Buffered event delivery. One pending buffer per event kind; observers
/// per kind, called in registration order during [`EventBus::deliver`].
#[derive(Debug, Default)]
pub struct EventBus {
    pending: [Vec<StudioEvent>; EVENT_KIND_COUNT],
    observers: [Vec<ObserverEntry>; EVENT_KIND_COUNT],
    next_subscriber: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer an event for delivery at the end of the current tick.
    pub fn emit(&mut self, event: StudioEvent) {
        self.pending[event.kind().index()].push(event);
    }

    /// Register an observer for one event kind. Observers are called in
    /// registration order during delivery.
    pub fn subscribe(&mut self, kind: EventKind, observer: Observer) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        self.observers[kind.index()].push(ObserverEntry { id, observer });
        id
    }

    /// Remove an observer. Idempotent: unknown or already-removed ids are
    /// ignored.
    pub fn unsubscribe(&mut self, id: SubscriberId) {
        for list in &mut self.observers {
            list.retain(|entry| entry.id != id);
        }
    }

    /// Deliver everything buffered to the observers and return the drained
    /// events. Safe with zero subscribers.
    ///
    /// Delivery walks kinds in declaration order, events within a kind
    /// oldest first, so a milestone buffered before a completion is always
    /// observed before it.
    pub fn deliver(&mut self) -> Vec<StudioEvent> {
        let mut drained: Vec<StudioEvent> = Vec::new();
        for idx in 0..EVENT_KIND_COUNT {
            if self.pending[idx].is_empty() {
                continue;
            }
            let events = std::mem::take(&mut self.pending[idx]);
            for entry in &mut self.observers[idx] {
                for event in &events {
                    (entry.observer)(event);
                }
            }
            drained.extend(events);
        }
        drained
    }

    /// Number of events currently buffered for a kind.
    pub fn pending_count(&self, kind: EventKind) -> usize {
        self.pending[kind.index()].len()
    }

    pub fn observer_count(&self, kind: EventKind) -> usize {
        self.observers[kind.index()].len()
    }

    /// Drop all buffered events without delivering them.
    pub fn clear_pending(&mut self) {
        for buf in &mut self.pending {
            buf.clear();
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recipe_id() -> RecipeId {
        use slotmap::SlotMap;
        let mut sm = SlotMap::<RecipeId, ()>::with_key();
        sm.insert(())
    }

    #[test]
    fn emit_and_deliver_without_subscribers() {
        let mut bus = EventBus::new();
        bus.emit(StudioEvent::ProductionProgress {
            recipe: recipe_id(),
            fraction: Fixed64::from_num(0.5),
        });
        let events = bus.deliver();
        assert_eq!(events.len(), 1);
        assert_eq!(bus.pending_count(EventKind::ProductionProgress), 0);
    }

    #[test]
    fn observers_called_in_registration_order() {
        let mut bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&order);
        bus.subscribe(
            EventKind::ProductionCompleted,
            Box::new(move |_| first.borrow_mut().push("first")),
        );
        let second = Rc::clone(&order);
        bus.subscribe(
            EventKind::ProductionCompleted,
            Box::new(move |_| second.borrow_mut().push("second")),
        );

        bus.emit(StudioEvent::ProductionCompleted { recipe: recipe_id() });
        bus.deliver();
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn observer_sees_events_oldest_first() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(
            EventKind::CurrencyChanged,
            Box::new(move |event| {
                if let StudioEvent::CurrencyChanged { amount, .. } = event {
                    sink.borrow_mut().push(*amount);
                }
            }),
        );

        for amount in [100, 250, 75] {
            bus.emit(StudioEvent::CurrencyChanged {
                currency: CurrencyType::Money,
                amount,
            });
        }
        bus.deliver();
        assert_eq!(*seen.borrow(), vec![100, 250, 75]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = bus.subscribe(
            EventKind::OverflowUpdated,
            Box::new(move |_| *sink.borrow_mut() += 1),
        );

        bus.emit(StudioEvent::OverflowUpdated { stored: 1, slots: 4 });
        bus.deliver();
        bus.unsubscribe(id);
        bus.emit(StudioEvent::OverflowUpdated { stored: 2, slots: 4 });
        bus.deliver();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let mut bus = EventBus::new();
        let id = bus.subscribe(EventKind::ItemSpawned, Box::new(|_| {}));
        bus.unsubscribe(id);
        bus.unsubscribe(id);
        assert_eq!(bus.observer_count(EventKind::ItemSpawned), 0);
    }

    #[test]
    fn subscription_is_per_kind() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        bus.subscribe(
            EventKind::MilestoneReached,
            Box::new(move |_| *sink.borrow_mut() += 1),
        );

        bus.emit(StudioEvent::ProductionCompleted { recipe: recipe_id() });
        bus.deliver();
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn clear_pending_drops_without_delivery() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        bus.subscribe(
            EventKind::CrateDepleted,
            Box::new(move |_| *sink.borrow_mut() += 1),
        );
        bus.emit(StudioEvent::CrateDepleted {
            crate_id: CrateId::default(),
        });
        bus.clear_pending();
        assert!(bus.deliver().is_empty());
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn every_event_maps_to_its_kind() {
        let recipe = recipe_id();
        let cases = [
            (
                StudioEvent::ProductionProgress { recipe, fraction: Fixed64::ZERO },
                EventKind::ProductionProgress,
            ),
            (
                StudioEvent::MilestoneReached { recipe, fraction: Fixed64::ZERO },
                EventKind::MilestoneReached,
            ),
            (StudioEvent::ProductionCompleted { recipe }, EventKind::ProductionCompleted),
            (
                StudioEvent::ItemSpawned { pos: GridPos::new(0, 0), item: ItemDefId(0) },
                EventKind::ItemSpawned,
            ),
            (
                StudioEvent::ItemMerged { pos: GridPos::new(0, 0), item: ItemDefId(0) },
                EventKind::ItemMerged,
            ),
            (
                StudioEvent::CrateDepleted { crate_id: CrateId::default() },
                EventKind::CrateDepleted,
            ),
            (
                StudioEvent::CurrencyChanged { currency: CurrencyType::Money, amount: 0 },
                EventKind::CurrencyChanged,
            ),
            (StudioEvent::OverflowUpdated { stored: 0, slots: 0 }, EventKind::OverflowUpdated),
            (StudioEvent::FameLevelChanged { level: 1 }, EventKind::FameLevelChanged),
            (StudioEvent::RecipeQueued { recipe }, EventKind::RecipeQueued),
            (
                StudioEvent::RecipeDistributed { recipe, money: 0, fans: 0 },
                EventKind::RecipeDistributed,
            ),
        ];
        for (event, kind) in cases {
            assert_eq!(event.kind(), kind);
        }
    }
}
