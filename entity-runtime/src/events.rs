// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Publish/subscribe event bus
//!
//! The bus decouples whoever notices something (a zone tracker seeing a
//! target arrive) from whoever reacts to it (AI switching to chase, the UI
//! showing a prompt). Listeners subscribe to one [`EventKind`] or to every
//! event, and are called synchronously, in subscription order, when a
//! matching event is published. Kind-specific listeners run before
//! catch-all listeners.
//!
//! All methods take `&self`, so the bus can be shared by reference with
//! every component context. Dispatch works on a snapshot of the listener
//! list, which makes it safe for a listener to subscribe, unsubscribe or
//! publish while being called:
//!
//! - listeners added during dispatch first hear the next publish;
//! - a listener removed during dispatch is not called again, even later in
//!   the same dispatch;
//! - a listener that is already running when a nested publish reaches it is
//!   skipped for that nested event, with a warning.

use crate::ecs::Entity;
use crate::interaction::{ZoneId, ZoneKind};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Discriminant used to subscribe to a family of events
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`EngineEvent::WorldLoaded`]
    WorldLoaded,
    /// [`EngineEvent::CharacterSpoke`]
    CharacterSpoke,
    /// [`EngineEvent::TargetEnteredZone`]
    TargetEnteredZone,
    /// [`EngineEvent::TargetExitedZone`]
    TargetExitedZone,
    /// [`EngineEvent::InteractionTriggered`]
    InteractionTriggered,
    /// [`EngineEvent::Custom`] with the given name
    Custom(String),
}

/// Payload of zone enter and exit events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneEvent {
    /// Entity owning the zone
    pub owner: Entity,
    /// Entity that crossed the zone boundary
    pub target: Entity,
    /// Zone within the owner's tracker
    pub zone: ZoneId,
    /// Type tag of the zone
    pub kind: ZoneKind,
}

/// Everything the runtime publishes
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A level finished loading; fired once per load
    WorldLoaded {
        /// Entities spawned by the load, in spawn order
        entities: Vec<Entity>,
    },
    /// A character said something
    CharacterSpoke {
        /// Who spoke
        speaker: Entity,
        /// What was said
        message: String,
        /// How long the line stays on screen
        duration_secs: f64,
    },
    /// A tracked target moved into a zone
    TargetEnteredZone(ZoneEvent),
    /// A tracked target left a zone
    TargetExitedZone(ZoneEvent),
    /// One entity interacted with another
    InteractionTriggered {
        /// Entity that initiated the interaction
        source: Entity,
        /// Entity interacted with
        target: Entity,
    },
    /// Game-defined event
    Custom {
        /// Event name, used as the subscription key
        name: String,
        /// Entity that published the event, if any
        source: Option<Entity>,
        /// Free-form payload
        payload: Value,
    },
}

impl EngineEvent {
    /// Subscription key of this event
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::WorldLoaded { .. } => EventKind::WorldLoaded,
            EngineEvent::CharacterSpoke { .. } => EventKind::CharacterSpoke,
            EngineEvent::TargetEnteredZone(_) => EventKind::TargetEnteredZone,
            EngineEvent::TargetExitedZone(_) => EventKind::TargetExitedZone,
            EngineEvent::InteractionTriggered { .. } => EventKind::InteractionTriggered,
            EngineEvent::Custom { name, .. } => EventKind::Custom(name.clone()),
        }
    }

    /// Zone payload of enter and exit events
    pub fn zone_event(&self) -> Option<&ZoneEvent> {
        match self {
            EngineEvent::TargetEnteredZone(e) | EngineEvent::TargetExitedZone(e) => Some(e),
            _ => None,
        }
    }
}

/// Handle returned by subscribe, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscription({})", self.0)
    }
}

type Listener = Rc<RefCell<dyn FnMut(&EngineEvent, &EventBus)>>;

struct Subscription {
    id: SubscriptionId,
    /// `None` for catch-all listeners
    filter: Option<EventKind>,
    listener: Listener,
}

/// Synchronous publish/subscribe hub
pub struct EventBus {
    subscriptions: RefCell<Vec<Subscription>>,
    next_id: Cell<u64>,
}

impl EventBus {
    /// Create a bus with no listeners
    pub fn new() -> Self {
        EventBus {
            subscriptions: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Listen for one kind of event
    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&EngineEvent, &EventBus) + 'static,
    {
        self.add(Some(kind), Rc::new(RefCell::new(listener)))
    }

    /// Listen for every event
    pub fn subscribe_to_all<F>(&self, listener: F) -> SubscriptionId
    where
        F: FnMut(&EngineEvent, &EventBus) + 'static,
    {
        self.add(None, Rc::new(RefCell::new(listener)))
    }

    fn add(&self, filter: Option<EventKind>, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscriptions.borrow_mut().push(Subscription {
            id,
            filter,
            listener,
        });
        id
    }

    /// Stop a listener; returns whether it was subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.borrow_mut();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    /// Check whether a subscription is still active
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.subscriptions.borrow().iter().any(|s| s.id == id)
    }

    /// Number of active subscriptions
    pub fn listener_count(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    /// Deliver an event to every matching listener
    ///
    /// Returns the number of listeners called.
    pub fn publish(&self, event: EngineEvent) -> usize {
        let kind = event.kind();
        let snapshot: Vec<(SubscriptionId, Listener)> = {
            let subscriptions = self.subscriptions.borrow();
            let specific = subscriptions
                .iter()
                .filter(|s| s.filter.as_ref() == Some(&kind));
            let catch_all = subscriptions.iter().filter(|s| s.filter.is_none());
            specific
                .chain(catch_all)
                .map(|s| (s.id, Rc::clone(&s.listener)))
                .collect()
        };

        let mut delivered = 0;
        for (id, listener) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            match listener.try_borrow_mut() {
                Ok(mut callback) => {
                    (&mut *callback)(&event, self);
                    delivered += 1;
                }
                Err(_) => {
                    log::warn!("{} is already handling an event; skipping {:?}", id, kind);
                }
            }
        }
        log::trace!("published {:?} to {} listeners", kind, delivered);
        delivered
    }

    /// Drop every subscription
    pub fn reset(&self) {
        self.subscriptions.borrow_mut().clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
