use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    common::{ColorIdx, ColorRGB, PALETTE_SIZE},
    error::EditorError,
    events::{NotificationBus, StoreEvent},
};

/// Source of truth for the 16-color palette and the active color selection.
///
/// Every successful color mutation bumps the version counter by exactly one
/// and broadcasts `PaletteChanged` before returning. There is no diffing:
/// rewriting a color with its current value still counts as a mutation. The
/// version exists only to key the render cache and is never persisted.
pub struct PaletteStore {
    colors: [ColorRGB; PALETTE_SIZE],
    version: u64,
    active: ColorIdx,
    bus: Rc<RefCell<NotificationBus>>,
}

impl PaletteStore {
    pub fn new(bus: Rc<RefCell<NotificationBus>>) -> Self {
        Self {
            colors: [(0, 0, 0); PALETTE_SIZE],
            version: 0,
            active: 0,
            bus,
        }
    }

    /// The full palette, as a value copy.
    pub fn get(&self) -> [ColorRGB; PALETTE_SIZE] {
        self.colors
    }

    pub fn color(&self, index: usize) -> Result<ColorRGB, EditorError> {
        self.colors
            .get(index)
            .copied()
            .ok_or(EditorError::IndexOutOfRange {
                index,
                limit: PALETTE_SIZE,
            })
    }

    pub fn set_entry(&mut self, index: usize, color: ColorRGB) -> Result<(), EditorError> {
        if index >= PALETTE_SIZE {
            return Err(EditorError::IndexOutOfRange {
                index,
                limit: PALETTE_SIZE,
            });
        }
        self.colors[index] = color;
        self.bump_and_notify();
        Ok(())
    }

    pub fn set_all(&mut self, colors: &[ColorRGB]) -> Result<(), EditorError> {
        if colors.len() != PALETTE_SIZE {
            return Err(EditorError::InvalidSize {
                expected: PALETTE_SIZE,
                actual: colors.len(),
            });
        }
        self.colors.copy_from_slice(colors);
        self.bump_and_notify();
        Ok(())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn active(&self) -> ColorIdx {
        self.active
    }

    /// Changing the selection is transient editor state, not palette data:
    /// no version bump, no event.
    pub fn set_active(&mut self, index: ColorIdx) -> Result<(), EditorError> {
        if index as usize >= PALETTE_SIZE {
            return Err(EditorError::IndexOutOfRange {
                index: index as usize,
                limit: PALETTE_SIZE,
            });
        }
        self.active = index;
        Ok(())
    }

    fn bump_and_notify(&mut self) {
        self.version += 1;
        self.bus.borrow().broadcast(&StoreEvent::PaletteChanged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::StoreListener;

    #[derive(Default)]
    struct Counter {
        palette_events: usize,
    }

    impl StoreListener for Counter {
        fn on_store_event(&mut self, event: &StoreEvent) {
            if *event == StoreEvent::PaletteChanged {
                self.palette_events += 1;
            }
        }
    }

    fn store_with_counter() -> (PaletteStore, Rc<RefCell<Counter>>) {
        let bus = Rc::new(RefCell::new(NotificationBus::new()));
        let counter = Rc::new(RefCell::new(Counter::default()));
        bus.borrow_mut().subscribe(counter.clone());
        (PaletteStore::new(bus), counter)
    }

    #[test]
    fn set_entry_bumps_version_and_notifies() {
        let (mut store, counter) = store_with_counter();
        assert_eq!(store.version(), 0);

        store.set_entry(3, (10, 20, 30)).unwrap();
        assert_eq!(store.version(), 1);
        assert_eq!(store.color(3).unwrap(), (10, 20, 30));
        assert_eq!(counter.borrow().palette_events, 1);

        // No diffing: writing the same value again still fires.
        store.set_entry(3, (10, 20, 30)).unwrap();
        assert_eq!(store.version(), 2);
        assert_eq!(counter.borrow().palette_events, 2);
    }

    #[test]
    fn set_all_is_one_mutation() {
        let (mut store, counter) = store_with_counter();
        let pal = [(1, 2, 3); PALETTE_SIZE];
        store.set_all(&pal).unwrap();
        assert_eq!(store.version(), 1);
        assert_eq!(counter.borrow().palette_events, 1);
        assert_eq!(store.get(), pal);
    }

    #[test]
    fn invalid_calls_leave_no_trace() {
        let (mut store, counter) = store_with_counter();
        assert_eq!(
            store.set_entry(16, (1, 1, 1)),
            Err(EditorError::IndexOutOfRange {
                index: 16,
                limit: 16
            })
        );
        assert_eq!(
            store.set_all(&[(0, 0, 0); 15]),
            Err(EditorError::InvalidSize {
                expected: 16,
                actual: 15
            })
        );
        assert_eq!(store.version(), 0);
        assert_eq!(counter.borrow().palette_events, 0);
    }

    #[test]
    fn active_selection_is_not_a_palette_mutation() {
        let (mut store, counter) = store_with_counter();
        store.set_active(5).unwrap();
        assert_eq!(store.active(), 5);
        assert_eq!(store.version(), 0);
        assert_eq!(counter.borrow().palette_events, 0);
        assert!(store.set_active(16).is_err());
    }
}
