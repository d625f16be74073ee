#![forbid(unsafe_code)]

//! Host-agnostic document model.
//!
//! Nodes live in reference-counted cells; an [`Element`] is a cheap handle to
//! one of them. Parent links are weak, child links are strong, so releasing
//! the last handle to a detached subtree frees it.
//!
//! # Invariants
//!
//! 1. `Element` equality is identity: two handles compare equal iff they
//!    point at the same node.
//! 2. A node has at most one parent; attaching it elsewhere detaches it first.
//! 3. No node is ever its own ancestor. Tree operations that would create a
//!    cycle fail with [`DomError::HierarchyRequest`].
//! 4. Event handlers are never invoked while any node cell is borrowed, so a
//!    handler may freely mutate the tree.
//!
//! With the `web` feature on `wasm32`, an element may also be bound to a
//! browser node (see `crate::web`). Every mutation below is then forwarded
//! through [`HostOp`]; reads always come from the in-memory tree.

use std::cell::RefCell;
use std::fmt;
use std::fmt::Write as _;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;
use thiserror::Error;

use crate::event::{Event, EventHandler, ListenerId};

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Tree mutation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The insertion would make a node its own ancestor.
    #[error("cannot insert <{child}> into <{parent}>: the node is an ancestor of the target")]
    HierarchyRequest { parent: String, child: String },
    /// The reference node is not a child of the target.
    #[error("<{child}> is not a child of <{parent}>")]
    NotAChild { parent: String, child: String },
    /// The browser host rejected an operation or is unavailable.
    #[error("host DOM operation failed: {0}")]
    Host(String),
}

/// A mutation to replay on the bound host node.
#[cfg_attr(
    not(all(feature = "web", target_arch = "wasm32")),
    allow(dead_code)
)]
pub(crate) enum HostOp<'a> {
    /// Re-read the attribute (`style` included) and write or remove it.
    Attribute(&'a str),
    /// Children were replaced wholesale.
    Content,
    AppendText(&'a str),
    AppendHtml(&'a str),
    Insert {
        child: &'a Element,
        before: Option<&'a Element>,
    },
    Replace {
        new: &'a Element,
        old: &'a Element,
    },
    /// Detach this node from its host parent.
    Detach,
    Listen(ListenerId),
    Unlisten(ListenerId),
}

/// A child slot of an element.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Raw markup, emitted verbatim by serialization and never parsed.
    Html(String),
}

struct Listener {
    id: ListenerId,
    event: Box<str>,
    handler: EventHandler,
}

#[derive(Default)]
struct NodeData {
    parent: Weak<NodeCell>,
    attrs: Vec<(String, String)>,
    style: Vec<(String, String)>,
    children: Vec<Node>,
    listeners: SmallVec<[Listener; 2]>,
}

struct NodeCell {
    tag: Box<str>,
    data: RefCell<NodeData>,
    #[cfg(all(feature = "web", target_arch = "wasm32"))]
    host: RefCell<Option<crate::web::HostNode>>,
}

/// Handle to an element node.
#[derive(Clone)]
pub struct Element(Rc<NodeCell>);

/// Non-owning handle to an element node.
#[derive(Clone, Default)]
pub struct WeakElement(Weak<NodeCell>);

impl WeakElement {
    #[must_use]
    pub fn upgrade(&self) -> Option<Element> {
        self.0.upgrade().map(Element)
    }
}

impl fmt::Debug for WeakElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(el) => write!(f, "WeakElement({el:?})"),
            None => f.write_str("WeakElement(<dropped>)"),
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>@{:p}", self.0.tag, Rc::as_ptr(&self.0))
    }
}

impl Element {
    /// Create a detached element.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self(Rc::new(NodeCell {
            tag: tag.to_ascii_lowercase().into_boxed_str(),
            data: RefCell::new(NodeData::default()),
            #[cfg(all(feature = "web", target_arch = "wasm32"))]
            host: RefCell::new(None),
        }))
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakElement {
        WeakElement(Rc::downgrade(&self.0))
    }

    fn sync(&self, op: HostOp<'_>) {
        #[cfg(all(feature = "web", target_arch = "wasm32"))]
        crate::web::apply(self, &op);
        #[cfg(not(all(feature = "web", target_arch = "wasm32")))]
        let _ = op;
    }

    #[cfg(all(feature = "web", target_arch = "wasm32"))]
    pub(crate) fn host_cell(&self) -> &RefCell<Option<crate::web::HostNode>> {
        &self.0.host
    }

    // ── Attributes ──────────────────────────────────────────────────────

    /// Set an attribute, keeping its original position if it already exists.
    ///
    /// Setting `style` replaces the inline style map.
    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        let value = value.into();
        {
            let mut data = self.0.data.borrow_mut();
            if name == "style" {
                data.style = parse_style(&value);
            } else {
                match data.attrs.iter().position(|(k, _)| k == name) {
                    Some(idx) => data.attrs[idx].1 = value,
                    None => data.attrs.push((name.to_owned(), value)),
                }
            }
        }
        self.sync(HostOp::Attribute(name));
    }

    /// Remove an attribute. Returns whether it was present.
    pub fn remove_attribute(&self, name: &str) -> bool {
        let removed = {
            let mut data = self.0.data.borrow_mut();
            if name == "style" {
                let had = !data.style.is_empty();
                data.style.clear();
                had
            } else {
                let before = data.attrs.len();
                data.attrs.retain(|(k, _)| k != name);
                data.attrs.len() != before
            }
        };
        if removed {
            self.sync(HostOp::Attribute(name));
        }
        removed
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        let data = self.0.data.borrow();
        if name == "style" {
            return (!data.style.is_empty()).then(|| serialize_style(&data.style));
        }
        data.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.0.data.borrow().attrs.iter().any(|(k, _)| k == name)
    }

    /// All attributes in insertion order (inline style excluded).
    #[must_use]
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.0.data.borrow().attrs.clone()
    }

    // ── Class list ──────────────────────────────────────────────────────

    #[must_use]
    pub fn class_list(&self) -> Vec<String> {
        self.attribute("class")
            .map(|c| c.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_class(&self, name: &str) -> bool {
        self.class_list().iter().any(|c| c == name)
    }

    pub fn add_class(&self, name: &str) {
        if name.is_empty() || self.has_class(name) {
            return;
        }
        let mut classes = self.class_list();
        classes.push(name.to_owned());
        self.set_attribute("class", classes.join(" "));
    }

    pub fn remove_class(&self, name: &str) {
        let classes = self.class_list();
        if !classes.iter().any(|c| c == name) {
            return;
        }
        let kept: Vec<_> = classes.into_iter().filter(|c| c != name).collect();
        self.set_attribute("class", kept.join(" "));
    }

    /// Toggle a class, or force it on/off. Returns whether the class is present
    /// afterwards.
    pub fn toggle_class(&self, name: &str, force: Option<bool>) -> bool {
        let present = force.unwrap_or(!self.has_class(name));
        if present {
            self.add_class(name);
        } else {
            self.remove_class(name);
        }
        present
    }

    // ── Inline style ────────────────────────────────────────────────────

    pub fn set_style(&self, property: &str, value: impl Into<String>) {
        let value = value.into();
        {
            let mut data = self.0.data.borrow_mut();
            match data.style.iter().position(|(k, _)| k == property) {
                Some(idx) => data.style[idx].1 = value,
                None => data.style.push((property.to_owned(), value)),
            }
        }
        self.sync(HostOp::Attribute("style"));
    }

    pub fn remove_style(&self, property: &str) {
        self.0.data.borrow_mut().style.retain(|(k, _)| k != property);
        self.sync(HostOp::Attribute("style"));
    }

    #[must_use]
    pub fn style(&self, property: &str) -> Option<String> {
        self.0
            .data
            .borrow()
            .style
            .iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v.clone())
    }

    // ── Content ─────────────────────────────────────────────────────────

    /// Replace all children with a single text node.
    pub fn set_text(&self, text: impl Into<String>) {
        self.replace_content(Node::Text(text.into()));
    }

    /// Replace all children with a raw markup fragment.
    pub fn set_html(&self, html: impl Into<String>) {
        self.replace_content(Node::Html(html.into()));
    }

    fn replace_content(&self, node: Node) {
        let old = std::mem::take(&mut self.0.data.borrow_mut().children);
        for child in &old {
            if let Node::Element(el) = child {
                el.0.data.borrow_mut().parent = Weak::new();
            }
        }
        self.0.data.borrow_mut().children.push(node);
        self.sync(HostOp::Content);
    }

    pub fn append_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.0
            .data
            .borrow_mut()
            .children
            .push(Node::Text(text.clone()));
        self.sync(HostOp::AppendText(&text));
    }

    pub fn append_html(&self, html: impl Into<String>) {
        let html = html.into();
        self.0
            .data
            .borrow_mut()
            .children
            .push(Node::Html(html.clone()));
        self.sync(HostOp::AppendHtml(&html));
    }

    /// Concatenated text of this subtree. Raw markup contributes verbatim.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.0.data.borrow().children {
            match child {
                Node::Element(el) => el.collect_text(out),
                Node::Text(text) | Node::Html(text) => out.push_str(text),
            }
        }
    }

    // ── Tree ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn parent(&self) -> Option<Element> {
        self.0.data.borrow().parent.upgrade().map(Element)
    }

    /// Child nodes of every kind.
    #[must_use]
    pub fn child_nodes(&self) -> Vec<Node> {
        self.0.data.borrow().children.clone()
    }

    /// Element children only.
    #[must_use]
    pub fn children(&self) -> Vec<Element> {
        self.0
            .data
            .borrow()
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Element(el) => Some(el.clone()),
                _ => None,
            })
            .collect()
    }

    /// Position among the parent's child nodes.
    #[must_use]
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.parent()?;
        let data = parent.0.data.borrow();
        data.children
            .iter()
            .position(|n| matches!(n, Node::Element(el) if el == self))
    }

    /// Whether `other` is this element or one of its descendants.
    #[must_use]
    pub fn contains(&self, other: &Element) -> bool {
        let mut cursor = Some(other.clone());
        while let Some(node) = cursor {
            if node == *self {
                return true;
            }
            cursor = node.parent();
        }
        false
    }

    pub fn append_child(&self, child: &Element) -> Result<(), DomError> {
        self.check_hierarchy(child)?;
        child.remove();
        child.0.data.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0
            .data
            .borrow_mut()
            .children
            .push(Node::Element(child.clone()));
        self.sync(HostOp::Insert {
            child,
            before: None,
        });
        Ok(())
    }

    /// Insert `child` before `reference`, or append when `reference` is `None`.
    pub fn insert_before(&self, child: &Element, reference: Option<&Element>) -> Result<(), DomError> {
        let Some(reference) = reference else {
            return self.append_child(child);
        };
        self.check_child(reference)?;
        if child == reference {
            return Ok(());
        }
        self.check_hierarchy(child)?;
        child.remove();
        let idx = self.position_of(reference).unwrap_or(0);
        child.0.data.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0
            .data
            .borrow_mut()
            .children
            .insert(idx, Node::Element(child.clone()));
        self.sync(HostOp::Insert {
            child,
            before: Some(reference),
        });
        Ok(())
    }

    /// Put `new` in the slot occupied by `old`; `old` becomes detached.
    pub fn replace_child(&self, new: &Element, old: &Element) -> Result<(), DomError> {
        self.check_child(old)?;
        if new == old {
            return Ok(());
        }
        self.check_hierarchy(new)?;
        new.remove();
        let Some(idx) = self.position_of(old) else {
            return Err(self.not_a_child(old));
        };
        new.0.data.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.data.borrow_mut().children[idx] = Node::Element(new.clone());
        old.0.data.borrow_mut().parent = Weak::new();
        self.sync(HostOp::Replace { new, old });
        Ok(())
    }

    pub fn remove_child(&self, child: &Element) -> Result<(), DomError> {
        self.check_child(child)?;
        child.remove();
        Ok(())
    }

    /// Detach from the parent, if any. Returns whether a parent was present.
    pub fn remove(&self) -> bool {
        let Some(parent) = self.parent() else {
            return false;
        };
        parent
            .0
            .data
            .borrow_mut()
            .children
            .retain(|n| !matches!(n, Node::Element(el) if el == self));
        self.0.data.borrow_mut().parent = Weak::new();
        self.sync(HostOp::Detach);
        true
    }

    fn position_of(&self, child: &Element) -> Option<usize> {
        self.0
            .data
            .borrow()
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(el) if el == child))
    }

    fn check_child(&self, child: &Element) -> Result<(), DomError> {
        if child.parent().as_ref() == Some(self) {
            Ok(())
        } else {
            Err(self.not_a_child(child))
        }
    }

    fn not_a_child(&self, child: &Element) -> DomError {
        DomError::NotAChild {
            parent: self.tag().to_owned(),
            child: child.tag().to_owned(),
        }
    }

    fn check_hierarchy(&self, child: &Element) -> Result<(), DomError> {
        if child.contains(self) {
            return Err(DomError::HierarchyRequest {
                parent: self.tag().to_owned(),
                child: child.tag().to_owned(),
            });
        }
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Descendant elements in document order, excluding `self`.
    #[must_use]
    pub fn descendants(&self) -> Vec<Element> {
        let mut out = Vec::new();
        let mut stack: Vec<Element> = self.children().into_iter().rev().collect();
        while let Some(el) = stack.pop() {
            stack.extend(el.children().into_iter().rev());
            out.push(el);
        }
        out
    }

    #[must_use]
    pub fn find_all(&self, mut predicate: impl FnMut(&Element) -> bool) -> Vec<Element> {
        self.descendants()
            .into_iter()
            .filter(|el| predicate(el))
            .collect()
    }

    /// Descendants whose attribute `name` equals `value`.
    #[must_use]
    pub fn query_attr(&self, name: &str, value: &str) -> Vec<Element> {
        self.find_all(|el| el.attribute(name).as_deref() == Some(value))
    }

    #[must_use]
    pub fn query_class(&self, class: &str) -> Vec<Element> {
        self.find_all(|el| el.has_class(class))
    }

    // ── Events ──────────────────────────────────────────────────────────

    pub fn add_event_listener(
        &self,
        event: &str,
        handler: impl Fn(&mut Event) + 'static,
    ) -> ListenerId {
        self.add_event_handler(event, Rc::new(handler))
    }

    pub fn add_event_handler(&self, event: &str, handler: EventHandler) -> ListenerId {
        let id = ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed));
        self.0.data.borrow_mut().listeners.push(Listener {
            id,
            event: event.into(),
            handler,
        });
        self.sync(HostOp::Listen(id));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered here.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let removed = {
            let mut data = self.0.data.borrow_mut();
            let before = data.listeners.len();
            data.listeners.retain(|l| l.id != id);
            data.listeners.len() != before
        };
        if removed {
            self.sync(HostOp::Unlisten(id));
        }
        removed
    }

    /// `(id, event type)` of every listener, in registration order.
    #[cfg_attr(
        not(all(feature = "web", target_arch = "wasm32")),
        allow(dead_code)
    )]
    pub(crate) fn listener_kinds(&self) -> Vec<(ListenerId, Box<str>)> {
        self.0
            .data
            .borrow()
            .listeners
            .iter()
            .map(|l| (l.id, l.event.clone()))
            .collect()
    }

    /// Run one listener at this element, outside any borrow.
    #[cfg_attr(
        not(all(feature = "web", target_arch = "wasm32")),
        allow(dead_code)
    )]
    pub(crate) fn invoke_listener(&self, id: ListenerId, event: &mut Event) {
        let handler = self
            .0
            .data
            .borrow()
            .listeners
            .iter()
            .find(|l| l.id == id)
            .map(|l| Rc::clone(&l.handler));
        if let Some(handler) = handler {
            event.set_current_target(self.clone());
            handler(event);
        }
    }

    #[must_use]
    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.0.data.borrow().listeners.iter().any(|l| l.id == id)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.0.data.borrow().listeners.len()
    }

    #[must_use]
    pub fn listener_count_for(&self, event: &str) -> usize {
        self.0
            .data
            .borrow()
            .listeners
            .iter()
            .filter(|l| &*l.event == event)
            .count()
    }

    /// Dispatch a bubbling event at this element.
    pub fn dispatch(&self, event_type: &str) -> Event {
        let mut event = Event::new(event_type, self.clone());
        self.dispatch_event(&mut event);
        event
    }

    pub fn dispatch_event(&self, event: &mut Event) {
        let mut cursor = Some(self.clone());
        while let Some(node) = cursor {
            let handlers: SmallVec<[(ListenerId, EventHandler); 2]> = node
                .0
                .data
                .borrow()
                .listeners
                .iter()
                .filter(|l| &*l.event == event.kind())
                .map(|l| (l.id, Rc::clone(&l.handler)))
                .collect();
            event.set_current_target(node.clone());
            for (id, handler) in handlers {
                // A handler earlier in this pass may have removed a later one.
                if !node.has_listener(id) {
                    continue;
                }
                handler(event);
                if event.immediate_propagation_stopped() {
                    break;
                }
            }
            if !event.bubbles() || event.propagation_stopped() {
                break;
            }
            cursor = node.parent();
        }
    }

    pub fn click(&self) -> Event {
        self.dispatch("click")
    }

    // ── Serialization ───────────────────────────────────────────────────

    #[must_use]
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    #[must_use]
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        self.write_children(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.0.tag);
        {
            let data = self.0.data.borrow();
            for (name, value) in &data.attrs {
                let _ = write!(out, " {name}=\"{}\"", escape(value, true));
            }
            if !data.style.is_empty() {
                let _ = write!(out, " style=\"{}\"", escape(&serialize_style(&data.style), true));
            }
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&&*self.0.tag) {
            return;
        }
        self.write_children(out);
        let _ = write!(out, "</{}>", self.0.tag);
    }

    fn write_children(&self, out: &mut String) {
        for child in &self.0.data.borrow().children {
            match child {
                Node::Element(el) => el.write_html(out),
                Node::Text(text) => out.push_str(&escape(text, false)),
                Node::Html(html) => out.push_str(html),
            }
        }
    }
}

fn parse_style(text: &str) -> Vec<(String, String)> {
    text.split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let (k, v) = (k.trim(), v.trim());
            (!k.is_empty()).then(|| (k.to_owned(), v.to_owned()))
        })
        .collect()
}

fn serialize_style(style: &[(String, String)]) -> String {
    style
        .iter()
        .map(|(k, v)| format!("{k}: {v};"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A document: an `<html>` root holding `<head>` and `<body>`.
#[derive(Clone)]
pub struct Document {
    root: Element,
    head: Element,
    body: Element,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        let root = Element::new("html");
        let head = Element::new("head");
        let body = Element::new("body");
        // Fresh detached nodes: neither insertion can form a cycle.
        let _ = root.append_child(&head);
        let _ = root.append_child(&body);
        Self { root, head, body }
    }

    #[must_use]
    pub fn create_element(&self, tag: &str) -> Element {
        Element::new(tag)
    }

    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    #[must_use]
    pub fn head(&self) -> &Element {
        &self.head
    }

    #[must_use]
    pub fn body(&self) -> &Element {
        &self.body
    }

    /// Whether the element is attached somewhere under this document's root.
    #[must_use]
    pub fn is_connected(&self, el: &Element) -> bool {
        self.root.contains(el)
    }

    #[must_use]
    pub fn outer_html(&self) -> String {
        self.root.outer_html()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn identity_equality() {
        let a = Element::new("div");
        let b = Element::new("div");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn append_moves_between_parents() {
        let p1 = Element::new("div");
        let p2 = Element::new("div");
        let child = Element::new("span");
        p1.append_child(&child).unwrap();
        p2.append_child(&child).unwrap();
        assert!(p1.children().is_empty());
        assert_eq!(p2.children(), vec![child.clone()]);
        assert_eq!(child.parent(), Some(p2));
    }

    #[test]
    fn cycles_are_rejected() {
        let outer = Element::new("div");
        let inner = Element::new("div");
        outer.append_child(&inner).unwrap();
        assert!(matches!(
            inner.append_child(&outer),
            Err(DomError::HierarchyRequest { .. })
        ));
        assert!(outer.append_child(&outer).is_err());
    }

    #[test]
    fn replace_child_keeps_position() {
        let parent = Element::new("ul");
        let items: Vec<_> = (0..3).map(|_| Element::new("li")).collect();
        for item in &items {
            parent.append_child(item).unwrap();
        }
        let fresh = Element::new("li");
        parent.replace_child(&fresh, &items[1]).unwrap();
        assert_eq!(fresh.index_in_parent(), Some(1));
        assert_eq!(items[1].parent(), None);
        assert_eq!(parent.children().len(), 3);
    }

    #[test]
    fn replace_child_requires_membership() {
        let parent = Element::new("div");
        let stranger = Element::new("p");
        let err = parent
            .replace_child(&Element::new("p"), &stranger)
            .unwrap_err();
        assert_eq!(
            err,
            DomError::NotAChild {
                parent: "div".into(),
                child: "p".into()
            }
        );
    }

    #[test]
    fn insert_before_reference() {
        let parent = Element::new("div");
        let a = Element::new("a");
        let b = Element::new("b");
        parent.append_child(&b).unwrap();
        parent.insert_before(&a, Some(&b)).unwrap();
        assert_eq!(parent.children(), vec![a, b]);
    }

    #[test]
    fn class_helpers() {
        let el = Element::new("div");
        el.add_class("x");
        el.add_class("y");
        el.add_class("x");
        assert_eq!(el.attribute("class").as_deref(), Some("x y"));
        assert!(!el.toggle_class("x", None));
        assert!(el.toggle_class("z", Some(true)));
        assert_eq!(el.class_list(), vec!["y", "z"]);
    }

    #[test]
    fn serialization_is_deterministic_and_escaped() {
        let el = Element::new("DIV");
        el.set_attribute("class", "x");
        el.set_attribute("title", "a \"b\"");
        el.set_style("color", "red");
        el.append_text("1 < 2");
        el.append_child(&Element::new("br")).unwrap();
        assert_eq!(
            el.outer_html(),
            r#"<div class="x" title="a &quot;b&quot;" style="color: red;">1 &lt; 2<br></div>"#
        );
    }

    #[test]
    fn style_attribute_round_trips_through_style_map() {
        let el = Element::new("div");
        el.set_attribute("style", "color: red; margin: 0");
        assert_eq!(el.style("margin").as_deref(), Some("0"));
        el.remove_style("color");
        assert_eq!(el.attribute("style").as_deref(), Some("margin: 0;"));
    }

    #[test]
    fn events_bubble_and_stop() {
        let outer = Element::new("div");
        let inner = Element::new("button");
        outer.append_child(&inner).unwrap();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        outer.add_event_listener("click", move |_| h.set(h.get() + 1));
        inner.click();
        assert_eq!(hits.get(), 1);

        inner.add_event_listener("click", |ev| ev.stop_propagation());
        inner.click();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn listener_removed_during_dispatch_is_skipped() {
        let el = Element::new("div");
        let later_ran = Rc::new(Cell::new(false));
        let id_slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let slot = Rc::clone(&id_slot);
        el.add_event_listener("click", move |ev| {
            if let Some(id) = slot.get() {
                ev.current_target().remove_event_listener(id);
            }
        });
        let flag = Rc::clone(&later_ran);
        id_slot.set(Some(el.add_event_listener("click", move |_| flag.set(true))));
        el.click();
        assert!(!later_ran.get());
        assert_eq!(el.listener_count(), 1);
    }

    #[test]
    fn handler_may_mutate_tree() {
        let parent = Element::new("div");
        let button = Element::new("button");
        parent.append_child(&button).unwrap();
        let weak = parent.downgrade();
        button.add_event_listener("click", move |_| {
            if let Some(p) = weak.upgrade() {
                p.set_text("done");
            }
        });
        button.click();
        assert_eq!(parent.text_content(), "done");
        assert_eq!(button.parent(), None);
    }

    #[test]
    fn remove_event_listener_is_not_repeatable() {
        let el = Element::new("div");
        let id = el.add_event_listener("click", |_| {});
        assert!(el.remove_event_listener(id));
        assert!(!el.remove_event_listener(id));
    }

    #[test]
    fn document_shape() {
        let doc = Document::new();
        assert_eq!(
            doc.outer_html(),
            "<html><head></head><body></body></html>"
        );
        let el = doc.create_element("p");
        assert!(!doc.is_connected(&el));
        doc.body().append_child(&el).unwrap();
        assert!(doc.is_connected(&el));
    }

    #[test]
    fn detached_subtree_is_freed() {
        let parent = Element::new("div");
        let weak = {
            let child = Element::new("span");
            parent.append_child(&child).unwrap();
            child.downgrade()
        };
        assert!(weak.upgrade().is_some());
        parent.set_text("");
        assert!(weak.upgrade().is_none());
    }
}
