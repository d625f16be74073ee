#![forbid(unsafe_code)]

//! Runtime: the component lifecycle engine.
//!
//! Widgets describe themselves with a [`Definition`]: a renderer, a
//! [`Reconcile`] strategy, and optionally a [`PropSchema`], a theme hook and a
//! stylesheet. [`Factory::create`] turns props into an [`Instance`] bound to a
//! [`Host`], which then supports `update`, `destroy`, `mount` and `unmount`.
//!
//! # Example
//!
//! ```
//! use fdom_core::{el, props};
//! use fdom_runtime::{Definition, Factory, Host, Reconcile};
//!
//! let badge = Definition::new("badge", |_, state| {
//!     Ok(el("span").class("badge").text(state.str("label")?).build())
//! })
//! .reconcile(Reconcile::patch(|cx, el, _| {
//!     el.set_text(cx.state().str("label")?);
//!     Ok(())
//! }));
//!
//! let host = Host::new();
//! let inst = badge.create(&host, props!({ "label": "new" })).unwrap();
//! let root = inst.element().unwrap();
//! inst.update(props!({ "label": "3" })).unwrap();
//! assert_eq!(inst.element().unwrap(), root);
//! assert_eq!(root.outer_html(), r#"<span class="badge">3</span>"#);
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod host;
pub mod perf;
pub mod themed;
pub mod validate;

pub use component::{
    Definition, Factory, Instance, PatchFn, Phase, PolicyFn, Reconcile, RenderCx, RenderFn,
    ThemeHook, WeakInstance,
};
pub use config::{DEFAULT_SLOW_RENDER_BUDGET, EngineConfig};
pub use error::{ComponentError, RenderError, Result};
pub use host::Host;
pub use perf::{RenderTimer, Throttle};
pub use themed::ThemeAware;
pub use validate::{PropDecl, PropKind, PropSchema};
