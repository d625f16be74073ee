#![forbid(unsafe_code)]

//! Per-owner listener bookkeeping.
//!
//! A [`ListenerRegistry`] remembers every listener its owner attached so they
//! can be detached together. Entries hold weak element handles: tracking a
//! listener never keeps a discarded element alive.

use crate::dom::{Element, WeakElement};
use crate::event::{Event, ListenerId};

#[derive(Debug, Default)]
pub struct ListenerRegistry {
    entries: Vec<(WeakElement, ListenerId)>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener and record it.
    pub fn listen(
        &mut self,
        el: &Element,
        event: &str,
        handler: impl Fn(&mut Event) + 'static,
    ) -> ListenerId {
        let id = el.add_event_listener(event, handler);
        self.track(el, id);
        id
    }

    /// Record a listener attached elsewhere.
    pub fn track(&mut self, el: &Element, id: ListenerId) {
        self.entries.push((el.downgrade(), id));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Detach every recorded listener. Returns how many were actually removed.
    ///
    /// The registry is drained, so a second call removes nothing.
    pub fn release(&mut self) -> usize {
        self.entries
            .drain(..)
            .filter(|(weak, id)| weak.upgrade().is_some_and(|el| el.remove_event_listener(*id)))
            .count()
    }

    /// Detach the listeners recorded for `el` and its descendants.
    pub fn release_within(&mut self, root: &Element) -> usize {
        let mut removed = 0;
        self.entries.retain(|(weak, id)| match weak.upgrade() {
            Some(el) if root.contains(&el) => {
                removed += usize::from(el.remove_event_listener(*id));
                false
            }
            Some(_) => true,
            // The element is gone; so is its listener.
            None => false,
        });
        removed
    }

    /// Position to hand back to [`ListenerRegistry::release_since`].
    #[must_use]
    pub fn mark(&self) -> usize {
        self.entries.len()
    }

    /// Detach the listeners recorded after `mark` was taken.
    pub fn release_since(&mut self, mark: usize) -> usize {
        if mark >= self.entries.len() {
            return 0;
        }
        self.entries
            .drain(mark..)
            .filter(|(weak, id)| weak.upgrade().is_some_and(|el| el.remove_event_listener(*id)))
            .count()
    }

    /// Ids of the recorded listeners that currently sit under `root`.
    #[must_use]
    pub fn ids_within(&self, root: &Element) -> Vec<ListenerId> {
        self.entries
            .iter()
            .filter(|(weak, _)| weak.upgrade().is_some_and(|el| root.contains(&el)))
            .map(|(_, id)| *id)
            .collect()
    }

    /// Drop entries whose element is gone, and detach those listed in
    /// `inside` that no longer sit under `root`.
    ///
    /// `inside` comes from [`ListenerRegistry::ids_within`] taken before an
    /// in-place edit of `root`; entries recorded after it are kept wherever
    /// they live.
    pub fn prune(&mut self, root: &Element, inside: &[ListenerId]) -> usize {
        let mut removed = 0;
        self.entries.retain(|(weak, id)| match weak.upgrade() {
            Some(el) if inside.contains(id) && !root.contains(&el) => {
                removed += usize::from(el.remove_event_listener(*id));
                false
            }
            Some(_) => true,
            None => false,
        });
        removed
    }
}
