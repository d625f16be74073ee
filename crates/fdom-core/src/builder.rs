#![forbid(unsafe_code)]

//! Declarative element construction.
//!
//! An [`ElementSpec`] describes one element: tag, classes, attributes, inline
//! style, event handlers, children, and text or markup content. `build`
//! produces a detached element; inserting it is the caller's job.
//!
//! Inputs are accepted leniently. Empty class names and `None` attribute
//! values are skipped (never written as `"null"`), and [`Child::Empty`]
//! entries vanish. Child content the builder cannot place is dropped with a
//! warning.

use std::rc::Rc;

use crate::dom::Element;
use crate::event::{Event, EventHandler};
use crate::listeners::ListenerRegistry;
use crate::logging::log_warn;

/// Anything that can hand out its root element, e.g. a component instance.
pub trait HasElement {
    /// The current root element, or `None` once released.
    fn element(&self) -> Option<Element>;
}

impl HasElement for Element {
    fn element(&self) -> Option<Element> {
        Some(self.clone())
    }
}

/// Child content accepted by the builder.
#[derive(Debug, Clone, Default)]
pub enum Child {
    /// A single text node.
    Text(String),
    Node(Element),
    /// A sequence, flattened in order.
    Nested(Vec<Child>),
    /// Placeholder for conditional content; produces nothing.
    #[default]
    Empty,
}

impl Child {
    /// Child for a component-like value; empty if it has no element.
    pub fn component(source: &impl HasElement) -> Self {
        source.element().map_or(Self::Empty, Self::Node)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Element> for Child {
    fn from(el: Element) -> Self {
        Self::Node(el)
    }
}

impl From<&Element> for Child {
    fn from(el: &Element) -> Self {
        Self::Node(el.clone())
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(items: Vec<T>) -> Self {
        Self::Nested(items.into_iter().map(Into::into).collect())
    }
}

/// Description of a single element.
#[derive(Clone, Default)]
pub struct ElementSpec {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    style: Vec<(String, String)>,
    events: Vec<(String, EventHandler)>,
    children: Vec<Child>,
    text: Option<String>,
    html: Option<String>,
}

impl std::fmt::Debug for ElementSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementSpec")
            .field("tag", &self.tag)
            .field("classes", &self.classes)
            .field("attrs", &self.attrs)
            .field("style", &self.style)
            .field(
                "events",
                &self.events.iter().map(|(e, _)| e).collect::<Vec<_>>(),
            )
            .field("children", &self.children)
            .field("text", &self.text)
            .field("html", &self.html)
            .finish()
    }
}

/// Shorthand for [`ElementSpec::new`].
#[must_use]
pub fn el(tag: &str) -> ElementSpec {
    ElementSpec::new(tag)
}

impl ElementSpec {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            ..Self::default()
        }
    }

    /// Add a class. Empty and whitespace-only names are ignored.
    #[must_use]
    pub fn class(mut self, name: impl AsRef<str>) -> Self {
        for part in name.as_ref().split_whitespace() {
            if !self.classes.iter().any(|c| c == part) {
                self.classes.push(part.to_owned());
            }
        }
        self
    }

    /// Add several classes; `None` entries are skipped.
    #[must_use]
    pub fn classes<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .flatten()
            .fold(self, |spec, name| spec.class(name))
    }

    #[must_use]
    pub fn class_if(self, name: &str, condition: bool) -> Self {
        if condition { self.class(name) } else { self }
    }

    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.attrs.iter().position(|(k, _)| k == name) {
            Some(idx) => self.attrs[idx].1 = value,
            None => self.attrs.push((name.to_owned(), value)),
        }
        self
    }

    /// Set an attribute when a value is present; `None` leaves it unset.
    #[must_use]
    pub fn attr_opt<V: Into<String>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    #[must_use]
    pub fn style(mut self, property: &str, value: impl Into<String>) -> Self {
        self.style.push((property.to_owned(), value.into()));
        self
    }

    /// Attach a handler. A second handler for the same event replaces the first.
    #[must_use]
    pub fn on(mut self, event: &str, handler: impl Fn(&mut Event) + 'static) -> Self {
        let handler: EventHandler = Rc::new(handler);
        match self.events.iter().position(|(e, _)| e == event) {
            Some(idx) => {
                log_warn!(message = "builder.handler_replaced", tag = %self.tag, event);
                self.events[idx].1 = handler;
            }
            None => self.events.push((event.to_owned(), handler)),
        }
        self
    }

    #[must_use]
    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    #[must_use]
    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Child>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Text content, placed before any children.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Raw markup content, placed before any children.
    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Build a detached element.
    #[must_use]
    pub fn build(self) -> Element {
        self.build_inner(None)
    }

    /// Build a detached element, recording its listeners in `registry`.
    pub fn build_tracked(self, registry: &mut ListenerRegistry) -> Element {
        self.build_inner(Some(registry))
    }

    fn build_inner(self, mut registry: Option<&mut ListenerRegistry>) -> Element {
        let el = Element::new(&self.tag);
        if !self.classes.is_empty() {
            el.set_attribute("class", self.classes.join(" "));
        }
        for (name, value) in self.attrs {
            el.set_attribute(&name, value);
        }
        for (property, value) in self.style {
            el.set_style(&property, value);
        }
        for (event, handler) in self.events {
            let id = el.add_event_handler(&event, handler);
            if let Some(registry) = registry.as_deref_mut() {
                registry.track(&el, id);
            }
        }
        if let Some(text) = self.text {
            el.append_text(text);
        }
        if let Some(html) = self.html {
            el.append_html(html);
        }
        for child in self.children {
            append_child(&el, child, false);
        }
        el
    }
}

fn append_child(parent: &Element, child: Child, nested: bool) {
    match child {
        Child::Text(text) if nested && text.is_empty() => {}
        Child::Text(text) => parent.append_text(text),
        Child::Node(node) => {
            if let Err(_err) = parent.append_child(&node) {
                log_warn!(message = "builder.child_skipped", tag = parent.tag(), err = %_err);
            }
        }
        Child::Nested(items) => {
            for item in items {
                append_child(parent, item, true);
            }
        }
        Child::Empty => {}
    }
}
