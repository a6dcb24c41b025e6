//! Shared "current selection" state.
//!
//! One `SelectionContext` is shared by every screen that shows or changes
//! the current category and filter. Changes fan out to registered observer
//! callbacks on the owning thread and to channel subscribers, which may live
//! on other threads.

use crate::catalog::model::FilterMetadata;
use crate::pipeline::id::ObserverId;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Current category and filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogState {
    pub current_category: Option<String>,
    pub current_filter: Option<String>,
}

/// Something observable changed in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    CategoryChanged(Option<String>),
    FilterChanged(Option<String>),
    MetadataChanged {
        key: String,
        metadata: FilterMetadata,
    },
    MembershipChanged {
        category: String,
    },
    DefaultsRestored,
}

type Observer = Rc<dyn Fn(&CatalogEvent)>;

#[derive(Default)]
pub struct SelectionContext {
    state: RefCell<CatalogState>,
    observers: RefCell<Vec<(ObserverId, Observer)>>,
    subscribers: RefCell<Vec<Sender<CatalogEvent>>>,
    next_observer: Cell<u32>,
}

impl SelectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CatalogState {
        self.state.borrow().clone()
    }

    pub fn current_category(&self) -> Option<String> {
        self.state.borrow().current_category.clone()
    }

    pub fn current_filter(&self) -> Option<String> {
        self.state.borrow().current_filter.clone()
    }

    /// Set the current category. Returns whether it changed; observers are
    /// only notified on change.
    pub fn set_current_category(&self, category: Option<String>) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if state.current_category == category {
                return false;
            }
            state.current_category = category.clone();
        }
        tracing::debug!("Category set to {:?}", category);
        self.emit(CatalogEvent::CategoryChanged(category));
        true
    }

    /// Set the current filter. Returns whether it changed; observers are
    /// only notified on change.
    pub fn set_current_filter(&self, key: Option<String>) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if state.current_filter == key {
                return false;
            }
            state.current_filter = key.clone();
        }
        tracing::debug!("Filter set to {:?}", key);
        self.emit(CatalogEvent::FilterChanged(key));
        true
    }

    /// Register a callback for every event. Callbacks run on the calling
    /// thread in registration order and may read or change the selection.
    pub fn observe<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&CatalogEvent) + 'static,
    {
        let id = ObserverId(self.next_observer.get());
        self.next_observer.set(id.0.wrapping_add(1));
        self.observers.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    /// Remove a callback. Returns whether it was registered.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(oid, _)| *oid != id);
        observers.len() != before
    }

    /// Receive events over a channel. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<CatalogEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.borrow_mut().push(tx);
        rx
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    pub(crate) fn emit(&self, event: CatalogEvent) {
        // Clone the list so callbacks can register, unregister or emit.
        let observers: Vec<Observer> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in observers {
            callback(&event);
        }

        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl std::fmt::Debug for SelectionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionContext")
            .field("state", &*self.state.borrow())
            .field("observers", &self.observers.borrow().len())
            .finish()
    }
}
