#![forbid(unsafe_code)]

//! The per-application context handed to every factory.

use std::rc::Rc;

use fdom_core::Document;
use fdom_style::{StyleRegistry, ThemeStore};

use crate::config::EngineConfig;

/// Document, theme store, style registry, and configuration for one
/// application or one test. Cloning shares all four.
#[derive(Debug, Clone)]
pub struct Host {
    document: Document,
    themes: ThemeStore,
    styles: StyleRegistry,
    config: Rc<EngineConfig>,
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

impl Host {
    /// Fresh document, default theme store, default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(Document::new(), ThemeStore::default(), EngineConfig::default())
    }

    #[must_use]
    pub fn with_parts(document: Document, themes: ThemeStore, config: EngineConfig) -> Self {
        let styles = StyleRegistry::new(&document);
        Self {
            document,
            themes,
            styles,
            config: Rc::new(config),
        }
    }

    /// Host bound to the browser window's document.
    #[cfg(all(feature = "web", target_arch = "wasm32"))]
    pub fn browser() -> Result<Self, fdom_core::DomError> {
        Ok(Self::with_parts(
            Document::browser()?,
            ThemeStore::default(),
            EngineConfig::default(),
        ))
    }

    #[must_use]
    pub fn with_config(self, config: EngineConfig) -> Self {
        Self {
            config: Rc::new(config),
            ..self
        }
    }

    #[must_use]
    pub fn with_themes(self, themes: ThemeStore) -> Self {
        Self { themes, ..self }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[must_use]
    pub fn themes(&self) -> &ThemeStore {
        &self.themes
    }

    #[must_use]
    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
