#![forbid(unsafe_code)]

//! Browser host backend.
//!
//! Binds in-memory elements to real `web_sys` nodes. Once an element is bound,
//! every change made through [`Element`] is replayed on its host node, and
//! elements inserted under a bound parent are created in that parent's
//! document. The in-memory tree stays authoritative: queries and
//! serialization never read the host.
//!
//! Each listener is bridged by one `Closure` registered on the host node. The
//! closure runs exactly that listener, so host bubbling drives in-memory
//! handlers on every ancestor in turn. `Event::target` seen by a handler is
//! the listening element. Bridges are unregistered when the listener is
//! removed or the in-memory node is dropped.
//!
//! ```ignore
//! let document = fdom_core::Document::browser()?;
//! let button = fdom_core::el("button").text("go").build();
//! document.body().append_child(&button)?; // now a real <button> in <body>
//! ```

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;

pub use wasm_bindgen;
pub use web_sys;

use crate::dom::{Document, DomError, Element, HostOp, Node};
use crate::event::{Event, ListenerId};
use crate::logging::{log_debug, log_warn};

type Bridge = Closure<dyn FnMut(web_sys::Event)>;

/// The browser node an element is bound to, with its listener bridges.
pub(crate) struct HostNode {
    node: web_sys::Element,
    bridges: Vec<(ListenerId, Box<str>, Bridge)>,
}

impl HostNode {
    fn unregister(&self, event: &str, bridge: &Bridge) {
        let _ = self
            .node
            .remove_event_listener_with_callback(event, bridge.as_ref().unchecked_ref());
    }
}

impl Drop for HostNode {
    fn drop(&mut self) {
        for (_, event, bridge) in &self.bridges {
            self.unregister(event, bridge);
        }
    }
}

fn host_error(err: &JsValue) -> DomError {
    DomError::Host(format!("{err:?}"))
}

fn owner(node: &web_sys::Element) -> Result<web_sys::Document, JsValue> {
    node.owner_document()
        .ok_or_else(|| JsValue::from_str("node has no owner document"))
}

fn bridge(el: &Element, id: ListenerId) -> Bridge {
    let weak = el.downgrade();
    Closure::new(move |host_event: web_sys::Event| {
        let Some(el) = weak.upgrade() else {
            return;
        };
        let mut event = Event::new(&host_event.type_(), el.clone()).non_bubbling();
        el.invoke_listener(id, &mut event);
        if event.immediate_propagation_stopped() {
            host_event.stop_immediate_propagation();
        } else if event.propagation_stopped() {
            host_event.stop_propagation();
        }
        if event.default_prevented() {
            host_event.prevent_default();
        }
    })
}

fn listen(el: &Element, host: &mut HostNode, id: ListenerId, event: &str) {
    let bridge = bridge(el, id);
    match host
        .node
        .add_event_listener_with_callback(event, bridge.as_ref().unchecked_ref())
    {
        Ok(()) => host.bridges.push((id, event.into(), bridge)),
        Err(_err) => log_warn!(message = "web.listen_failed", event, err = ?_err),
    }
}

fn bind(el: &Element, node: web_sys::Element) {
    let mut host = HostNode {
        node,
        bridges: Vec::new(),
    };
    for (id, event) in el.listener_kinds() {
        listen(el, &mut host, id, &event);
    }
    *el.host_cell().borrow_mut() = Some(host);
}

fn append_host(
    parent: &web_sys::Element,
    child: &Node,
    doc: &web_sys::Document,
) -> Result<(), JsValue> {
    match child {
        Node::Element(el) => {
            let node = materialize(el, doc)?;
            parent.append_child(&node)?;
        }
        Node::Text(text) => {
            parent.append_child(&doc.create_text_node(text))?;
        }
        Node::Html(html) => parent.insert_adjacent_html("beforeend", html)?,
    }
    Ok(())
}

/// Create (or reuse) the host node for `el` and its whole subtree.
fn materialize(el: &Element, doc: &web_sys::Document) -> Result<web_sys::Element, JsValue> {
    if let Some(node) = el.host_node() {
        return Ok(node);
    }
    let node = doc.create_element(el.tag())?;
    for (name, value) in el.attributes() {
        node.set_attribute(&name, &value)?;
    }
    if let Some(style) = el.attribute("style") {
        node.set_attribute("style", &style)?;
    }
    bind(el, node.clone());
    for child in el.child_nodes() {
        append_host(&node, &child, doc)?;
    }
    log_debug!(message = "web.materialize", tag = el.tag());
    Ok(node)
}

fn insert(
    parent: &web_sys::Element,
    child: &Element,
    before: Option<&Element>,
) -> Result<(), JsValue> {
    let node = materialize(child, &owner(parent)?)?;
    let reference = before.and_then(Element::host_node);
    parent.insert_before(&node, reference.as_ref().map(|r| &**r))?;
    Ok(())
}

fn replace(parent: &web_sys::Element, new: &Element, old: &Element) -> Result<(), JsValue> {
    let node = materialize(new, &owner(parent)?)?;
    match old.host_node() {
        Some(old_node) => parent.replace_child(&node, &old_node).map(drop),
        None => parent.append_child(&node).map(drop),
    }
}

/// Replay `op` on the host node bound to `el`. Unbound elements are skipped.
pub(crate) fn apply(el: &Element, op: &HostOp<'_>) {
    let Some(node) = el.host_node() else {
        return;
    };
    let result = match op {
        HostOp::Attribute(name) => match el.attribute(name) {
            Some(value) => node.set_attribute(name, &value),
            None => node.remove_attribute(name),
        },
        HostOp::Content => {
            node.set_text_content(None);
            owner(&node).and_then(|doc| {
                el.child_nodes()
                    .iter()
                    .try_for_each(|child| append_host(&node, child, &doc))
            })
        }
        HostOp::AppendText(text) => owner(&node)
            .and_then(|doc| node.append_child(&doc.create_text_node(text)))
            .map(drop),
        HostOp::AppendHtml(html) => node.insert_adjacent_html("beforeend", html),
        HostOp::Insert { child, before } => insert(&node, child, *before),
        HostOp::Replace { new, old } => replace(&node, new, old),
        HostOp::Detach => {
            node.remove();
            Ok(())
        }
        HostOp::Listen(id) => {
            let kind = el
                .listener_kinds()
                .into_iter()
                .find(|(listener, _)| listener == id)
                .map(|(_, kind)| kind);
            if let (Some(host), Some(kind)) = (el.host_cell().borrow_mut().as_mut(), kind) {
                listen(el, host, *id, &kind);
            }
            Ok(())
        }
        HostOp::Unlisten(id) => {
            if let Some(host) = el.host_cell().borrow_mut().as_mut() {
                if let Some(pos) = host.bridges.iter().position(|(b, ..)| b == id) {
                    let (_, event, bridge) = host.bridges.remove(pos);
                    host.unregister(&event, &bridge);
                }
            }
            Ok(())
        }
    };
    if let Err(_err) = result {
        log_warn!(message = "web.sync_failed", tag = el.tag(), err = ?_err);
    }
}

impl Element {
    /// The browser node this element is bound to, if any.
    #[must_use]
    pub fn host_node(&self) -> Option<web_sys::Element> {
        self.host_cell()
            .borrow()
            .as_ref()
            .map(|host| host.node.clone())
    }

    /// Materialize this subtree in `container`'s document and append it there.
    ///
    /// The element keeps no in-memory parent; use this to mount into a host
    /// container the fdom tree does not own.
    pub fn attach_to_host(&self, container: &web_sys::Element) -> Result<(), DomError> {
        let doc = owner(container).map_err(|err| host_error(&err))?;
        let node = materialize(self, &doc).map_err(|err| host_error(&err))?;
        container
            .append_child(&node)
            .map(drop)
            .map_err(|err| host_error(&err))
    }
}

impl Document {
    /// Bind a fresh document to a browser document's `<html>`, `<head>` and
    /// `<body>`. Existing host content is left alone and is not mirrored.
    pub fn from_web(doc: &web_sys::Document) -> Result<Self, DomError> {
        let root = doc
            .document_element()
            .ok_or_else(|| DomError::Host("document has no root element".into()))?;
        let head: web_sys::Element = doc
            .head()
            .ok_or_else(|| DomError::Host("document has no <head>".into()))?
            .into();
        let body: web_sys::Element = doc
            .body()
            .ok_or_else(|| DomError::Host("document has no <body>".into()))?
            .into();
        let document = Self::new();
        bind(document.root(), root);
        bind(document.head(), head);
        bind(document.body(), body);
        Ok(document)
    }

    /// [`Document::from_web`] on the window's document.
    pub fn browser() -> Result<Self, DomError> {
        let doc = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| DomError::Host("no browser document".into()))?;
        Self::from_web(&doc)
    }
}
