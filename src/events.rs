//! Change notifications.
//!
//! Mutating calls broadcast a topic so every mounted view can reload and
//! re-render. Delivery is synchronous, at-least-once, and unordered; storage
//! reads are idempotent, so a redundant reload is harmless. Subscriptions
//! are explicit handles tied to a view's mount/unmount lifecycle.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTopic {
    /// The entries collection changed.
    Entries,
    /// The saved-template collection changed.
    SavedEntries,
}

/// Handle returned by [`ChangeBus::subscribe`]; pass it back to
/// [`ChangeBus::unsubscribe`] when the view unmounts.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
}

struct Subscriber {
    id: u64,
    topic: ChangeTopic,
    callback: Rc<dyn Fn()>,
}

/// Single-threaded observable. Callbacks may themselves subscribe or
/// unsubscribe; `notify` snapshots the subscriber list before calling out.
#[derive(Default)]
pub struct ChangeBus {
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<Subscriber>>,
}

impl ChangeBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: ChangeTopic, callback: impl Fn() + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            topic,
            callback: Rc::new(callback),
        });
        Subscription { id }
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        self.subscribers
            .borrow_mut()
            .retain(|s| s.id != subscription.id);
    }

    pub fn notify(&self, topic: ChangeTopic) {
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.topic == topic)
            .map(|s| Rc::clone(&s.callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }
}
