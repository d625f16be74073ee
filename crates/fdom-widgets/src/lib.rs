#![forbid(unsafe_code)]

//! Widgets built on `fdom-runtime`.

pub mod accordion;

pub use accordion::{ACCORDION_CSS, accordion, accordion_themed};
