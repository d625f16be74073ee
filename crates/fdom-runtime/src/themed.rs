#![forbid(unsafe_code)]

//! Theme-awareness decorator.
//!
//! [`ThemeAware`] wraps any [`Factory`]. Each instance it creates is
//! subscribed to the host's theme store; on every switch the definition's
//! theme hook runs against the current element, or, for definitions without
//! one, the `theme` state key is updated. The subscription is owned by
//! the instance and dropped by `destroy`, so a destroyed instance is never
//! notified and leaves no entry behind in the store.

use fdom_core::Props;

use crate::component::{Factory, Instance};
use crate::error::Result;
use crate::host::Host;

#[derive(Debug, Clone)]
pub struct ThemeAware<F> {
    factory: F,
}

impl<F: Factory> ThemeAware<F> {
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    #[must_use]
    pub fn inner(&self) -> &F {
        &self.factory
    }
}

impl<F: Factory> Factory for ThemeAware<F> {
    fn name(&self) -> &str {
        self.factory.name()
    }

    fn create(&self, host: &Host, props: Props) -> Result<Instance> {
        let instance = self.factory.create(host, props)?;
        let weak = instance.downgrade();
        let subscription = host.themes().subscribe(move |change| {
            if let Some(instance) = weak.upgrade() {
                instance.notify_theme(change);
            }
        });
        if !instance.bind_theme(subscription) {
            tracing::warn!(
                message = "theme.double_subscribe",
                component = self.factory.name(),
                id = instance.id()
            );
        }
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Definition, Reconcile};
    use fdom_core::{el, props};
    use fdom_style::{THEME_ATTR, ThemeStore};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tracing_test::traced_test;

    fn themed_box(log: Rc<RefCell<Vec<(String, String)>>>) -> ThemeAware<Definition> {
        Definition::new("box", |cx, _| {
            Ok(el("div").attr(THEME_ATTR, cx.theme()).build())
        })
        .on_theme_change(move |_, el, change| {
            el.set_attribute(THEME_ATTR, change.theme.clone());
            log.borrow_mut()
                .push((change.theme.clone(), change.previous.clone()));
        })
        .theme_aware()
    }

    #[test]
    fn instances_follow_theme_switches() {
        let host = Host::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let inst = themed_box(Rc::clone(&log)).create(&host, Props::new()).unwrap();
        let element = inst.element().unwrap();
        assert_eq!(element.attribute(THEME_ATTR).as_deref(), Some("light"));
        assert!(inst.is_theme_subscribed());

        host.themes().switch_theme("dark").unwrap();
        assert_eq!(element.attribute(THEME_ATTR).as_deref(), Some("dark"));
        assert_eq!(*log.borrow(), vec![("dark".to_owned(), "light".to_owned())]);
    }

    #[test]
    fn destroy_unsubscribes() {
        let host = Host::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let factory = themed_box(Rc::clone(&log));
        let a = factory.create(&host, Props::new()).unwrap();
        let b = factory.create(&host, Props::new()).unwrap();
        assert_eq!(host.themes().subscriber_count(), 2);

        a.destroy();
        assert_eq!(host.themes().subscriber_count(), 1);
        assert!(!a.is_theme_subscribed());
        host.themes().switch_theme("dark").unwrap();
        assert_eq!(log.borrow().len(), 1);

        b.destroy();
        assert_eq!(host.themes().subscriber_count(), 0);
    }

    #[test]
    fn dropping_every_handle_unsubscribes() {
        let host = Host::new();
        let inst = themed_box(Rc::default()).create(&host, Props::new()).unwrap();
        drop(inst);
        assert_eq!(host.themes().subscriber_count(), 0);
    }

    #[test]
    #[traced_test]
    fn double_wrapping_subscribes_once() {
        let host = Host::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let factory = ThemeAware::new(themed_box(Rc::clone(&log)));
        let inst = factory.create(&host, Props::new()).unwrap();
        assert_eq!(host.themes().subscriber_count(), 1);
        assert!(logs_contain("theme.double_subscribe"));

        host.themes().switch_theme("dark").unwrap();
        assert_eq!(log.borrow().len(), 1);
        inst.destroy();
    }

    #[test]
    fn hook_runs_against_rebuilt_element() {
        let host = Host::with_parts(
            fdom_core::Document::new(),
            ThemeStore::new("light", ["light", "dark", "contrast"]),
            crate::EngineConfig::default(),
        );
        let def = Definition::new("panel", |cx, state| {
            Ok(el("section")
                .attr(THEME_ATTR, cx.theme())
                .text(state.opt_str("title")?.unwrap_or_default())
                .build())
        })
        .reconcile(Reconcile::always_rebuild())
        .on_theme_change(|_, el, change| el.set_attribute(THEME_ATTR, change.theme.clone()));
        let inst = def.theme_aware().create(&host, props!({ "title": "a" })).unwrap();
        inst.update(props!({ "title": "b" })).unwrap();
        host.themes().switch_theme("contrast").unwrap();
        assert_eq!(
            inst.element().unwrap().outer_html(),
            r#"<section data-theme="contrast">b</section>"#
        );
    }

    #[test]
    fn plain_definitions_ignore_theme_switches() {
        let host = Host::new();
        let def = Definition::new("plain", |_, _| Ok(el("p").build()))
            .on_theme_change(|_, el, _| el.set_attribute("touched", "yes"));
        let inst = def.create(&host, Props::new()).unwrap();
        host.themes().switch_theme("dark").unwrap();
        assert!(!inst.element().unwrap().has_attribute("touched"));
        assert_eq!(host.themes().subscriber_count(), 0);
    }

    #[test]
    fn hookless_definitions_track_theme_in_state() {
        let host = Host::new();
        let def = Definition::new("plain", |_, _| Ok(el("p").text("x").build()));
        let inst = def.theme_aware().create(&host, props!({ "n": 1 })).unwrap();
        let element = inst.element().unwrap();
        assert_eq!(inst.prop("theme"), None);

        host.themes().switch_theme("dark").unwrap();
        assert_eq!(inst.prop("theme"), Some(serde_json::Value::from("dark")));
        assert_eq!(inst.prop("n"), Some(serde_json::Value::from(1)));
        assert_eq!(inst.element().unwrap(), element);
        assert_eq!(element.outer_html(), "<p>x</p>");
    }
}
