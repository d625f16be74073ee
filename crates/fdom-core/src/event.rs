#![forbid(unsafe_code)]

//! DOM-style events and listener handles.

use std::fmt;
use std::rc::Rc;

use crate::dom::Element;

/// Shared event callback.
pub type EventHandler = Rc<dyn Fn(&mut Event)>;

/// Opaque token returned by listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl ListenerId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// An event travelling from its target up through the ancestors.
pub struct Event {
    kind: String,
    target: Element,
    current_target: Element,
    bubbles: bool,
    propagation_stopped: bool,
    immediate_stopped: bool,
    default_prevented: bool,
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("bubbles", &self.bubbles)
            .field("propagation_stopped", &self.propagation_stopped)
            .field("default_prevented", &self.default_prevented)
            .finish()
    }
}

impl Event {
    /// Create a bubbling event aimed at `target`.
    #[must_use]
    pub fn new(kind: &str, target: Element) -> Self {
        Self {
            kind: kind.to_owned(),
            current_target: target.clone(),
            target,
            bubbles: true,
            propagation_stopped: false,
            immediate_stopped: false,
            default_prevented: false,
        }
    }

    #[must_use]
    pub fn non_bubbling(mut self) -> Self {
        self.bubbles = false;
        self
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn target(&self) -> &Element {
        &self.target
    }

    /// The element whose listeners are currently running.
    #[must_use]
    pub fn current_target(&self) -> &Element {
        &self.current_target
    }

    pub(crate) fn set_current_target(&mut self, el: Element) {
        self.current_target = el;
    }

    #[must_use]
    pub const fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_stopped = true;
    }

    #[must_use]
    pub const fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    #[must_use]
    pub const fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_stopped
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    #[must_use]
    pub const fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn non_bubbling_event_stays_on_target() {
        let parent = Element::new("div");
        let child = Element::new("input");
        parent.append_child(&child).unwrap();
        let seen = Rc::new(Cell::new(false));
        let s = Rc::clone(&seen);
        parent.add_event_listener("focus", move |_| s.set(true));

        let mut ev = Event::new("focus", child.clone()).non_bubbling();
        child.dispatch_event(&mut ev);
        assert!(!seen.get());
    }

    #[test]
    fn immediate_stop_skips_siblings() {
        let el = Element::new("button");
        let count = Rc::new(Cell::new(0));
        el.add_event_listener("click", |ev| ev.stop_immediate_propagation());
        let c = Rc::clone(&count);
        el.add_event_listener("click", move |_| c.set(c.get() + 1));
        let ev = el.click();
        assert_eq!(count.get(), 0);
        assert!(ev.propagation_stopped());
    }

    #[test]
    fn prevent_default_is_reported() {
        let el = Element::new("a");
        el.add_event_listener("click", |ev| ev.prevent_default());
        assert!(el.click().default_prevented());
        assert_eq!(el.click().target(), &el);
    }
}
