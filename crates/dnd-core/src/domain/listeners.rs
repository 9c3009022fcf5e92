//! Ordered, synchronous listener dispatch over a single mutable event.
//!
//! Listeners run in registration order.  Each receives the same `&mut E`, so a
//! field changed by one listener is what the next listener sees, and what the
//! caller reads back after dispatch.

use std::fmt;

/// A registered listener callback.
pub type Listener<E> = Box<dyn Fn(&mut E) + Send + Sync>;

/// Handle returned on registration, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listeners for one event type, each registered for one event kind `K`.
pub struct ListenerTable<K, E> {
    entries: Vec<(ListenerId, K, Listener<E>)>,
    next_id: u64,
}

impl<K: Copy + PartialEq, E> ListenerTable<K, E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Registers `listener` for events of `kind`.
    pub fn add<F>(&mut self, kind: K, listener: F) -> ListenerId
    where
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, kind, Box::new(listener)));
        id
    }

    /// Removes a listener.  Returns `false` if it was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Runs every listener registered for `kind`, in registration order.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, kind: K, event: &mut E) -> usize {
        let mut invoked = 0;
        for (_, entry_kind, listener) in &self.entries {
            if *entry_kind == kind {
                listener(event);
                invoked += 1;
            }
        }
        invoked
    }

    pub fn has_listeners(&self, kind: K) -> bool {
        self.entries.iter().any(|(_, entry_kind, _)| *entry_kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Copy + PartialEq, E> Default for ListenerTable<K, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> fmt::Debug for ListenerTable<K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerTable")
            .field("listeners", &self.entries.len())
            .finish()
    }
}
