#![forbid(unsafe_code)]

//! Component error taxonomy.
//!
//! Configuration mistakes fail loudly: factories and validated updates return
//! [`ComponentError`] and no instance (or no state change) results. Lifecycle
//! ordering mistakes, such as updating a destroyed instance, are not errors at
//! all; they log a warning and return normally.

use fdom_core::{DomError, PropError};
use fdom_style::ThemeError;
use thiserror::Error;

/// Failure raised by a renderer or patcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error(transparent)]
    Props(#[from] PropError),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("{0}")]
    Message(String),
}

impl RenderError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// Invalid configuration at factory or update time.
    #[error("{component}: {source}")]
    Props {
        component: String,
        #[source]
        source: PropError,
    },
    /// The renderer or a hook failed.
    #[error("{component}: render failed: {source}")]
    Render {
        component: String,
        #[source]
        source: RenderError,
    },
    /// Swapping the rebuilt element into its parent failed.
    #[error("{component}: {source}")]
    Dom {
        component: String,
        #[source]
        source: DomError,
    },
    #[error(transparent)]
    Theme(#[from] ThemeError),
}

impl ComponentError {
    pub fn props(component: &str, source: PropError) -> Self {
        Self::Props {
            component: component.to_owned(),
            source,
        }
    }

    /// Wrap a renderer failure. Prop errors raised through the typed
    /// accessors are reported as [`ComponentError::Props`].
    pub fn render(component: &str, source: RenderError) -> Self {
        match source {
            RenderError::Props(source) => Self::props(component, source),
            source => Self::Render {
                component: component.to_owned(),
                source,
            },
        }
    }

    pub fn dom(component: &str, source: DomError) -> Self {
        Self::Dom {
            component: component.to_owned(),
            source,
        }
    }

    /// Name of the component the error concerns, if any.
    #[must_use]
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::Props { component, .. }
            | Self::Render { component, .. }
            | Self::Dom { component, .. } => Some(component),
            Self::Theme(_) => None,
        }
    }
}

pub type Result<T, E = ComponentError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prop_errors_name_component_and_prop() {
        let err = ComponentError::props(
            "accordion",
            PropError::Missing {
                prop: "items".into(),
            },
        );
        assert_eq!(err.to_string(), "accordion: missing required prop `items`");
        assert_eq!(err.component(), Some("accordion"));
    }

    #[test]
    fn render_errors_wrap_source() {
        let err = ComponentError::render("tabs", RenderError::msg("no panes"));
        assert_eq!(err.to_string(), "tabs: render failed: no panes");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn accessor_failures_surface_as_prop_errors() {
        let err = ComponentError::render(
            "select",
            RenderError::from(PropError::Malformed {
                prop: "options".into(),
                reason: "option 2 has no value".into(),
            }),
        );
        assert!(matches!(err, ComponentError::Props { .. }));
        assert_eq!(
            err.to_string(),
            "select: prop `options` is malformed: option 2 has no value"
        );
    }
}
