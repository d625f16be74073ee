#![forbid(unsafe_code)]

//! Theme store with change notification.
//!
//! A [`ThemeStore`] holds the active theme name for one application (or one
//! test). Instances are explicit and cheap to clone; there is no process-wide
//! singleton, so isolated stores never leak into each other.
//!
//! # Invariants
//!
//! 1. Switching to the already-active theme is a no-op: no version bump, no
//!    notifications.
//! 2. Subscribers are notified in registration order with the new and the
//!    previous theme.
//! 3. Dropping a [`ThemeSubscription`] removes its callback; a callback
//!    removed while a notification is in flight is not invoked afterwards.
//! 4. Callbacks run with no internal borrow held, so they may subscribe,
//!    unsubscribe, or read the store.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use fdom_core::{Element, WeakElement};
use thiserror::Error;

/// Attribute mirroring the active theme on bound root elements.
pub const THEME_ATTR: &str = "data-theme";

pub const DEFAULT_THEME: &str = "light";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThemeError {
    #[error("unknown theme `{name}`; registered themes: [{}]", .known.join(", "))]
    UnknownTheme { name: String, known: Vec<String> },
}

/// Payload delivered to subscribers on every switch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThemeChange {
    pub theme: String,
    pub previous: String,
}

type Callback = dyn Fn(&ThemeChange);

struct StoreInner {
    current: String,
    themes: Vec<String>,
    subscribers: Vec<(u64, Weak<Callback>)>,
    next_id: u64,
    roots: Vec<WeakElement>,
    version: u64,
}

impl StoreInner {
    fn is_subscribed(&self, id: u64) -> bool {
        self.subscribers
            .iter()
            .any(|(sid, weak)| *sid == id && weak.strong_count() > 0)
    }
}

#[derive(Clone)]
pub struct ThemeStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::new(DEFAULT_THEME, [DEFAULT_THEME, "dark"])
    }
}

impl fmt::Debug for ThemeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ThemeStore")
            .field("current", &inner.current)
            .field("themes", &inner.themes)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl ThemeStore {
    /// Create a store. `initial` is registered if `themes` omits it.
    pub fn new<I, S>(initial: &str, themes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut known: Vec<String> = Vec::new();
        for theme in themes.into_iter().map(Into::into) {
            if !known.contains(&theme) {
                known.push(theme);
            }
        }
        if !known.iter().any(|t| t == initial) {
            known.insert(0, initial.to_owned());
        }
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                current: initial.to_owned(),
                themes: known,
                subscribers: Vec::new(),
                next_id: 0,
                roots: Vec::new(),
                version: 0,
            })),
        }
    }

    #[must_use]
    pub fn current(&self) -> String {
        self.inner.borrow().current.clone()
    }

    #[must_use]
    pub fn themes(&self) -> Vec<String> {
        self.inner.borrow().themes.clone()
    }

    /// Number of completed switches.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Make another theme name switchable. Returns `false` if already known.
    pub fn register_theme(&self, name: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.themes.iter().any(|t| t == name) {
            return false;
        }
        inner.themes.push(name.to_owned());
        true
    }

    /// Live subscriber count.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    /// Register a callback for theme switches.
    ///
    /// The callback stays registered for as long as the returned guard lives.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&ThemeChange) + 'static) -> ThemeSubscription {
        let callback: Rc<Callback> = Rc::new(callback);
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Rc::downgrade(&callback)));
        ThemeSubscription {
            id,
            store: Rc::downgrade(&self.inner),
            _callback: callback,
        }
    }

    /// Mirror the active theme into `data-theme` on `root`, now and on every
    /// later switch.
    pub fn bind_root(&self, root: &Element) {
        let mut inner = self.inner.borrow_mut();
        root.set_attribute(THEME_ATTR, inner.current.clone());
        if !inner.roots.iter().any(|w| w.upgrade().as_ref() == Some(root)) {
            inner.roots.push(root.downgrade());
        }
    }

    /// Activate `name` and notify subscribers.
    ///
    /// Returns `Ok(false)` when `name` is already active.
    pub fn switch_theme(&self, name: &str) -> Result<bool, ThemeError> {
        let (change, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.themes.iter().any(|t| t == name) {
                return Err(ThemeError::UnknownTheme {
                    name: name.to_owned(),
                    known: inner.themes.clone(),
                });
            }
            if inner.current == name {
                return Ok(false);
            }
            let previous = std::mem::replace(&mut inner.current, name.to_owned());
            inner.version += 1;

            inner.roots.retain(|w| w.upgrade().is_some());
            for root in inner.roots.iter().filter_map(WeakElement::upgrade) {
                root.set_attribute(THEME_ATTR, name);
            }

            inner.subscribers.retain(|(_, weak)| weak.strong_count() > 0);
            let callbacks: Vec<(u64, Rc<Callback>)> = inner
                .subscribers
                .iter()
                .filter_map(|(id, weak)| weak.upgrade().map(|cb| (*id, cb)))
                .collect();
            (
                ThemeChange {
                    theme: name.to_owned(),
                    previous,
                },
                callbacks,
            )
        };

        tracing::debug!(
            message = "theme.switch",
            from = %change.previous,
            to = %change.theme,
            subscribers = callbacks.len()
        );

        for (id, callback) in callbacks {
            if self.inner.borrow().is_subscribed(id) {
                callback(&change);
            }
        }
        Ok(true)
    }
}

/// RAII guard for a theme callback. Dropping it unsubscribes.
pub struct ThemeSubscription {
    id: u64,
    store: Weak<RefCell<StoreInner>>,
    _callback: Rc<Callback>,
}

impl fmt::Debug for ThemeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeSubscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

impl ThemeSubscription {
    /// Whether the store still exists and holds this callback.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.store
            .upgrade()
            .is_some_and(|store| store.borrow().is_subscribed(self.id))
    }

    /// Explicit form of dropping the guard.
    pub fn unsubscribe(self) {}
}

impl Drop for ThemeSubscription {
    fn drop(&mut self) {
        let Some(store) = self.store.upgrade() else {
            return;
        };
        // If the store is mid-borrow the dead weak entry is pruned on the next switch.
        if let Ok(mut inner) = store.try_borrow_mut() {
            inner.subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tracing_test::traced_test;

    fn recorder(store: &ThemeStore) -> (Rc<RefCell<Vec<ThemeChange>>>, ThemeSubscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let sub = store.subscribe(move |change| sink.borrow_mut().push(change.clone()));
        (log, sub)
    }

    #[test]
    fn default_store_starts_light() {
        let store = ThemeStore::default();
        assert_eq!(store.current(), "light");
        assert_eq!(store.themes(), vec!["light", "dark"]);
    }

    #[test]
    fn switch_notifies_with_previous() {
        let store = ThemeStore::default();
        let (log, _sub) = recorder(&store);
        assert_eq!(store.switch_theme("dark"), Ok(true));
        assert_eq!(
            log.borrow().as_slice(),
            &[ThemeChange {
                theme: "dark".into(),
                previous: "light".into()
            }]
        );
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn same_theme_is_noop() {
        let store = ThemeStore::default();
        let (log, _sub) = recorder(&store);
        assert_eq!(store.switch_theme("light"), Ok(false));
        assert!(log.borrow().is_empty());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn unknown_theme_is_rejected() {
        let store = ThemeStore::default();
        let err = store.switch_theme("neon").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown theme `neon`; registered themes: [light, dark]"
        );
        assert!(store.register_theme("neon"));
        assert!(!store.register_theme("neon"));
        assert_eq!(store.switch_theme("neon"), Ok(true));
    }

    #[test]
    fn initial_theme_is_always_registered() {
        let store = ThemeStore::new("solarized", ["light"]);
        assert_eq!(store.themes(), vec!["solarized", "light"]);
    }

    #[test]
    fn drop_unsubscribes() {
        let store = ThemeStore::default();
        let (log, sub) = recorder(&store);
        assert_eq!(store.subscriber_count(), 1);
        assert!(sub.is_active());
        sub.unsubscribe();
        assert_eq!(store.subscriber_count(), 0);
        store.switch_theme("dark").unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn notification_order_is_registration_order() {
        let store = ThemeStore::default();
        let order = Rc::new(RefCell::new(Vec::new()));
        let subs: Vec<_> = (0..3)
            .map(|i| {
                let order = Rc::clone(&order);
                store.subscribe(move |_| order.borrow_mut().push(i))
            })
            .collect();
        store.switch_theme("dark").unwrap();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        drop(subs);
    }

    #[test]
    fn callback_may_subscribe_and_read() {
        let store = ThemeStore::default();
        let nested: Rc<RefCell<Vec<ThemeSubscription>>> = Rc::default();
        let seen = Rc::new(RefCell::new(String::new()));
        let (store2, nested2, seen2) = (store.clone(), Rc::clone(&nested), Rc::clone(&seen));
        let _sub = store.subscribe(move |_| {
            *seen2.borrow_mut() = store2.current();
            nested2.borrow_mut().push(store2.subscribe(|_| {}));
        });
        store.switch_theme("dark").unwrap();
        assert_eq!(*seen.borrow(), "dark");
        assert_eq!(store.subscriber_count(), 2);
    }

    #[test]
    fn unsubscribed_mid_notification_is_skipped() {
        let store = ThemeStore::default();
        let victim: Rc<RefCell<Option<ThemeSubscription>>> = Rc::default();
        let ran = Rc::new(Cell::new(false));

        let slot = Rc::clone(&victim);
        let _killer = store.subscribe(move |_| {
            slot.borrow_mut().take();
        });
        let flag = Rc::clone(&ran);
        *victim.borrow_mut() = Some(store.subscribe(move |_| flag.set(true)));

        store.switch_theme("dark").unwrap();
        assert!(!ran.get());
    }

    #[test]
    fn bound_root_tracks_theme() {
        let store = ThemeStore::default();
        let root = Element::new("html");
        store.bind_root(&root);
        store.bind_root(&root);
        assert_eq!(root.attribute(THEME_ATTR).as_deref(), Some("light"));
        store.switch_theme("dark").unwrap();
        assert_eq!(root.attribute(THEME_ATTR).as_deref(), Some("dark"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn change_round_trips_through_json() {
        let change = ThemeChange {
            theme: "dark".into(),
            previous: "light".into(),
        };
        let json = serde_json::to_string(&change).unwrap();
        assert_eq!(json, r#"{"theme":"dark","previous":"light"}"#);
        assert_eq!(serde_json::from_str::<ThemeChange>(&json).unwrap(), change);
    }

    #[test]
    fn subscription_outliving_store_is_inert() {
        let sub = {
            let store = ThemeStore::default();
            store.subscribe(|_| {})
        };
        assert!(!sub.is_active());
    }

    #[traced_test]
    #[test]
    fn switch_is_logged() {
        let store = ThemeStore::default();
        store.switch_theme("dark").unwrap();
        assert!(logs_contain("theme.switch"));
    }
}
