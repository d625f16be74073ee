#![forbid(unsafe_code)]

//! FrankenDOM public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.
//!
//! ```
//! use fdom::prelude::*;
//!
//! let host = Host::new();
//! let greeting = Definition::new("greeting", |_, state| {
//!     Ok(el("p").text(format!("hello, {}", state.str("name")?)).build())
//! });
//! let inst = greeting.create(&host, props!({ "name": "dom" })).unwrap();
//! inst.mount(host.document().body()).unwrap();
//! assert_eq!(
//!     host.document().body().inner_html(),
//!     "<p>hello, dom</p>"
//! );
//! inst.destroy();
//! ```

pub use fdom_core::props;

pub mod prelude {
    pub use fdom_core as core;
    pub use fdom_runtime as runtime;
    pub use fdom_style as style;
    #[cfg(feature = "widgets")]
    pub use fdom_widgets as widgets;

    pub use fdom_core::{Child, Document, Element, ElementSpec, HasElement, Props, el, props};
    pub use fdom_runtime::{
        ComponentError, Definition, EngineConfig, Factory, Host, Instance, Reconcile,
        RenderCx, RenderError,
    };
    pub use fdom_style::{StyleRegistry, ThemeStore};
}
