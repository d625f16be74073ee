#![forbid(unsafe_code)]

//! Per-component stylesheet injection.
//!
//! A [`StyleRegistry`] is built once per document. Each component asks it for
//! a [`StyleInjector`] keyed by a tag; the first `inject` call for a tag
//! appends one `<style data-fdom-style="{tag}">` block to `<head>`, and every
//! later call for that tag is a no-op, however many instances exist.
//!
//! A tagged block already present in the head (for example one shipped with
//! prerendered markup) is adopted rather than duplicated.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashSet;
use fdom_core::{Document, Element};

/// Marker attribute carried by injected `<style>` nodes.
pub const STYLE_MARKER_ATTR: &str = "data-fdom-style";

struct RegistryInner {
    document: Document,
    injected: AHashSet<String>,
}

#[derive(Clone)]
pub struct StyleRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl fmt::Debug for StyleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

impl StyleRegistry {
    #[must_use]
    pub fn new(document: &Document) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryInner {
                document: document.clone(),
                injected: AHashSet::new(),
            })),
        }
    }

    #[must_use]
    pub fn injector(&self, tag: &str) -> StyleInjector {
        StyleInjector {
            registry: self.clone(),
            tag: tag.to_owned(),
        }
    }

    /// Inject `css` for `tag` unless a block for `tag` already exists.
    ///
    /// Returns `true` only for the call that inserted the block.
    pub fn inject(&self, tag: &str, css: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.injected.contains(tag) {
            return false;
        }
        let head = inner.document.head().clone();
        if find_tagged(&head, tag).is_some() {
            tracing::debug!(message = "style.adopt", tag);
            inner.injected.insert(tag.to_owned());
            return false;
        }

        let node = Element::new("style");
        node.set_attribute(STYLE_MARKER_ATTR, tag);
        node.set_text(css);
        // A fresh node cannot be an ancestor of the head.
        if let Err(err) = head.append_child(&node) {
            tracing::warn!(message = "style.inject_failed", tag, %err);
            return false;
        }
        inner.injected.insert(tag.to_owned());
        tracing::debug!(message = "style.inject", tag, bytes = css.len());
        true
    }

    #[must_use]
    pub fn is_injected(&self, tag: &str) -> bool {
        self.inner.borrow().injected.contains(tag)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().injected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Injected tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<_> = self.inner.borrow().injected.iter().cloned().collect();
        tags.sort_unstable();
        tags
    }

    /// The `<style>` node for `tag`, if present in the document head.
    #[must_use]
    pub fn style_node(&self, tag: &str) -> Option<Element> {
        find_tagged(self.inner.borrow().document.head(), tag)
    }
}

fn find_tagged(head: &Element, tag: &str) -> Option<Element> {
    head.children()
        .into_iter()
        .find(|el| el.tag() == "style" && el.attribute(STYLE_MARKER_ATTR).as_deref() == Some(tag))
}

/// Injection handle bound to a single tag.
#[derive(Clone)]
pub struct StyleInjector {
    registry: StyleRegistry,
    tag: String,
}

impl fmt::Debug for StyleInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleInjector")
            .field("tag", &self.tag)
            .field("injected", &self.registry.is_injected(&self.tag))
            .finish()
    }
}

impl StyleInjector {
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn inject(&self, css: &str) -> bool {
        self.registry.inject(&self.tag, css)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged_count(doc: &Document, tag: &str) -> usize {
        doc.root().query_attr(STYLE_MARKER_ATTR, tag).len()
    }

    #[test]
    fn first_call_injects_once() {
        let doc = Document::new();
        let registry = StyleRegistry::new(&doc);
        let inject = registry.injector("accordion");
        assert!(inject.inject(".a{}"));
        assert!(!inject.inject(".b{}"));
        assert!(!registry.injector("accordion").inject(".c{}"));
        assert_eq!(tagged_count(&doc, "accordion"), 1);
        assert_eq!(
            registry.style_node("accordion").map(|n| n.text_content()),
            Some(".a{}".to_owned())
        );
    }

    #[test]
    fn tags_are_independent() {
        let doc = Document::new();
        let registry = StyleRegistry::new(&doc);
        assert!(registry.inject("tabs", ""));
        assert!(registry.inject("radio", ""));
        assert_eq!(registry.tags(), vec!["radio", "tabs"]);
        assert_eq!(doc.head().children().len(), 2);
    }

    #[test]
    fn registries_do_not_share_state() {
        let (doc_a, doc_b) = (Document::new(), Document::new());
        let (a, b) = (StyleRegistry::new(&doc_a), StyleRegistry::new(&doc_b));
        assert!(a.inject("form", "x"));
        assert!(b.inject("form", "x"));
        assert!(!b.is_empty());
    }

    #[test]
    fn prerendered_block_is_adopted() {
        let doc = Document::new();
        let existing = Element::new("style");
        existing.set_attribute(STYLE_MARKER_ATTR, "select");
        doc.head().append_child(&existing).unwrap();

        let registry = StyleRegistry::new(&doc);
        assert!(!registry.inject("select", ".s{}"));
        assert!(registry.is_injected("select"));
        assert_eq!(tagged_count(&doc, "select"), 1);
    }
}
