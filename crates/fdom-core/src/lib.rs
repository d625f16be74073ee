#![forbid(unsafe_code)]

//! Core: document model, events, element builder, and prop bags.
//!
//! The document model is in-memory by default. With the `web` feature on
//! `wasm32`, [`web`] binds it to the browser DOM.

pub mod builder;
pub mod dom;
pub mod event;
pub mod listeners;
mod logging;
pub mod props;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

pub use builder::{Child, ElementSpec, HasElement, el};
pub use dom::{Document, DomError, Element, Node, WeakElement};
pub use event::{Event, EventHandler, ListenerId};
pub use listeners::ListenerRegistry;
pub use props::{PropError, Props, value_kind};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
