//! Document notifications and the listener registry
//!
//! Listeners are plain callbacks registered on the document. Registration
//! returns a generation-checked [`ListenerHandle`]; unregistering is the
//! listener owner's job, and a handle that outlived its slot is rejected
//! instead of removing whoever took the slot over.

use bevy::log::warn;
use ropey::Rope;
use crate::buffer::BufferChange;

/// Fired after the buffer changed and the line cache caught up
#[derive(Clone, Debug)]
pub struct BufferChangedEvent {
    /// Extent of the edit in chars and rows
    pub change: BufferChange,
    /// Buffer text after the edit (cheap clone)
    pub snapshot: Rope,
}

/// Notifications delivered synchronously, in the order they happen
#[derive(Clone, Debug)]
pub enum DocumentEvent {
    BufferChanged(BufferChangedEvent),
    SelectionsChanged {
        /// Selection set version after the change
        version: u64,
    },
    FoldStateChanged {
        /// Number of rows currently hidden
        hidden_rows: usize,
    },
}

/// Callback invoked for each document event
pub type Listener = Box<dyn FnMut(&DocumentEvent)>;

/// Token identifying one registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    listener: Option<Listener>,
}

/// Slot arena of listeners
#[derive(Default)]
pub struct ListenerRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn add(&mut self, listener: Listener) -> ListenerHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.listener = Some(listener);
            return ListenerHandle { index, generation: slot.generation };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, listener: Some(listener) });
        ListenerHandle { index, generation: 0 }
    }

    /// Unregister; returns false for stale or unknown handles
    pub fn remove(&mut self, handle: ListenerHandle) -> bool {
        if !self.contains(handle) {
            warn!("ignoring stale listener handle {:?}", handle);
            return false;
        }
        self.slots[handle.index as usize].listener = None;
        self.free.push(handle.index);
        true
    }

    /// Whether `handle` still names a live registration
    pub fn contains(&self, handle: ListenerHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .is_some_and(|slot| slot.generation == handle.generation && slot.listener.is_some())
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.listener.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every live listener
    pub fn notify(&mut self, event: &DocumentEvent) {
        for slot in &mut self.slots {
            if let Some(listener) = slot.listener.as_mut() {
                listener(event);
            }
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counting(counter: &Rc<RefCell<usize>>) -> Listener {
        let counter = counter.clone();
        Box::new(move |_| *counter.borrow_mut() += 1)
    }

    #[test]
    fn test_notify_reaches_live_listeners() {
        let hits = Rc::new(RefCell::new(0));
        let mut registry = ListenerRegistry::new();
        let a = registry.add(counting(&hits));
        registry.add(counting(&hits));

        registry.notify(&DocumentEvent::SelectionsChanged { version: 1 });
        assert_eq!(*hits.borrow(), 2);

        assert!(registry.remove(a));
        registry.notify(&DocumentEvent::SelectionsChanged { version: 2 });
        assert_eq!(*hits.borrow(), 3);
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let hits = Rc::new(RefCell::new(0));
        let mut registry = ListenerRegistry::new();
        let old = registry.add(counting(&hits));
        assert!(registry.remove(old));

        // slot is reused with a new generation
        let new = registry.add(counting(&hits));
        assert_ne!(old, new);
        assert!(!registry.contains(old));
        assert!(!registry.remove(old));
        assert!(registry.contains(new));
        assert_eq!(registry.len(), 1);
    }
}
