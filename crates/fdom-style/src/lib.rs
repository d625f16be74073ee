#![forbid(unsafe_code)]

//! Style: theme store and per-component stylesheet injection.

pub mod inject;
pub mod theme;

pub use inject::{STYLE_MARKER_ATTR, StyleInjector, StyleRegistry};
pub use theme::{DEFAULT_THEME, THEME_ATTR, ThemeChange, ThemeError, ThemeStore, ThemeSubscription};
