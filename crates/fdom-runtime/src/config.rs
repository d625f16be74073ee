#![forbid(unsafe_code)]

//! Engine configuration.

use web_time::Duration;

/// Renders slower than this are reported.
pub const DEFAULT_SLOW_RENDER_BUDGET: Duration = Duration::from_millis(16);

/// Behavior switches for the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Reject props a component's schema does not declare.
    pub strict_props: bool,
    /// Run the schema against every `update` delta.
    pub validate_updates: bool,
    /// Warn when a destroyed instance is updated, mounted, or unmounted.
    pub warn_on_post_destroy: bool,
    pub slow_render_budget: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_props: false,
            validate_updates: true,
            warn_on_post_destroy: true,
            slow_render_budget: DEFAULT_SLOW_RENDER_BUDGET,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn strict_props(mut self, strict: bool) -> Self {
        self.strict_props = strict;
        self
    }

    #[must_use]
    pub fn validate_updates(mut self, validate: bool) -> Self {
        self.validate_updates = validate;
        self
    }

    #[must_use]
    pub fn warn_on_post_destroy(mut self, warn: bool) -> Self {
        self.warn_on_post_destroy = warn;
        self
    }

    #[must_use]
    pub fn slow_render_budget(mut self, budget: Duration) -> Self {
        self.slow_render_budget = budget;
        self
    }
}
