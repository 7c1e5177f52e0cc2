//! # Typed Event Channel
//!
//! Replaces per-callback fan-out (`onQuestionAdded`, `onModified`, ...) with
//! one typed publish/subscribe channel per designer.
//!
//! Delivery contract:
//! - synchronous: `fire` returns after every subscriber has run
//! - in-order: events are observed in the order they were fired, even when a
//!   subscriber fires follow-up events (those are queued, never delivered
//!   reentrantly inside another delivery)
//! - subscribe/unsubscribe from inside a handler takes effect after the
//!   current event finishes delivering

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use formcraft_model::NodeId;

pub type SubscriptionId = u64;

type Handler<T> = Box<dyn Fn(&T)>;

pub struct EventChannel<T> {
    handlers: RefCell<Vec<(SubscriptionId, Handler<T>)>>,
    next_id: Cell<SubscriptionId>,
    queue: RefCell<VecDeque<T>>,
    delivering: Cell<bool>,
    pending_subscribes: RefCell<Vec<(SubscriptionId, Handler<T>)>>,
    pending_unsubscribes: RefCell<Vec<SubscriptionId>>,
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventChannel<T> {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            queue: RefCell::new(VecDeque::new()),
            delivering: Cell::new(false),
            pending_subscribes: RefCell::new(Vec::new()),
            pending_unsubscribes: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        if self.delivering.get() {
            self.pending_subscribes
                .borrow_mut()
                .push((id, Box::new(handler)));
        } else {
            self.handlers.borrow_mut().push((id, Box::new(handler)));
        }
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        if self.delivering.get() {
            self.pending_unsubscribes.borrow_mut().push(id);
        } else {
            self.handlers.borrow_mut().retain(|(hid, _)| *hid != id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    /// Fire an event. If called from inside a handler the event is queued and
    /// delivered after the in-flight event completes.
    pub fn fire(&self, event: T) {
        self.queue.borrow_mut().push_back(event);
        if self.delivering.get() {
            return;
        }
        self.delivering.set(true);
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(event) = next else { break };
            {
                let handlers = self.handlers.borrow();
                for (_, handler) in handlers.iter() {
                    handler(&event);
                }
            }
            self.apply_pending();
        }
        self.delivering.set(false);
    }

    fn apply_pending(&self) {
        let mut handlers = self.handlers.borrow_mut();
        for entry in self.pending_subscribes.borrow_mut().drain(..) {
            handlers.push(entry);
        }
        let removals: Vec<SubscriptionId> =
            self.pending_unsubscribes.borrow_mut().drain(..).collect();
        if !removals.is_empty() {
            handlers.retain(|(id, _)| !removals.contains(id));
        }
    }
}

/// Everything a view layer can observe from the designer.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignerEvent {
    /// The whole document was replaced (new JSON loaded).
    SurveyLoaded,
    /// The current selection changed.
    SelectionChanged { selection: NodeId },
    /// A committed structural or property change; the undo snapshot for it
    /// has already been recorded when subscribers run.
    Modified { kind: ModifiedKind },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModifiedKind {
    PageAdded { name: String },
    ElementAdded { name: String, page: String },
    ElementRemoved { id: NodeId },
    ElementMoved { name: String, page: String },
    PageMoved { from: usize, to: usize },
    PropertyChanged { target: NodeId, property: String },
}
