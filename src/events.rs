use std::cell::RefCell;
use std::rc::Rc;

use crate::common::TileIdx;

/// Change notifications broadcast by the stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// Some palette color changed; every rendered image is potentially stale.
    PaletteChanged,
    /// Exactly one tile's pixels changed.
    TileChanged(TileIdx),
    /// The whole tileset was swapped out; per-index reconciliation is not
    /// possible, listeners must drop everything keyed by a tile index.
    TilesetReplaced,
}

pub trait StoreListener {
    /// Called synchronously from inside the mutating store call. The stores
    /// may be mid-mutation, so listeners must not call back into them here.
    fn on_store_event(&mut self, event: &StoreEvent);
}

/// Registry of listeners shared by PaletteStore and TileStore. Everything runs
/// on the one UI thread; `broadcast` returns only after every listener ran, so
/// a read issued after the triggering mutator always observes post-event state.
#[derive(Default)]
pub struct NotificationBus {
    listeners: Vec<Rc<RefCell<dyn StoreListener>>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. Subscribing the same listener twice is a no-op.
    pub fn subscribe(&mut self, listener: Rc<RefCell<dyn StoreListener>>) {
        if !self.listeners.iter().any(|l| Rc::ptr_eq(l, &listener)) {
            self.listeners.push(listener);
        }
    }

    /// Removes a listener; unknown listeners are ignored.
    pub fn unsubscribe(&mut self, listener: &Rc<RefCell<dyn StoreListener>>) {
        self.listeners.retain(|l| !Rc::ptr_eq(l, listener));
    }

    pub fn broadcast(&self, event: &StoreEvent) {
        for listener in &self.listeners {
            listener.borrow_mut().on_store_event(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
