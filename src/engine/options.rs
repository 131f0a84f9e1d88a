//! Validation options.

use crate::constraints::manager::DEFAULT_CACHE_CAPACITY;
use crate::constraints::validator::{ClockProvider, SystemClock};
use crate::engine::interpolator::{MessageInterpolator, VerbatimInterpolator};
use crate::engine::traversable::{AlwaysTraversable, TraversableResolver};
use std::sync::Arc;

/// Options for validation calls.
#[derive(Clone)]
pub struct ValidatorOptions {
    /// Stop at the first recorded violation.
    pub fail_fast: bool,
    /// Decides which properties may be inspected and cascaded into.
    pub traversable_resolver: Arc<dyn TraversableResolver>,
    /// Renders violation messages.
    pub message_interpolator: Arc<dyn MessageInterpolator>,
    /// Time source handed to validators.
    pub clock: Arc<dyn ClockProvider>,
    /// Maximum number of initialized validators kept by a factory.
    pub cache_capacity: usize,
}

impl std::fmt::Debug for ValidatorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorOptions")
            .field("fail_fast", &self.fail_fast)
            .field("traversable_resolver", &"<resolver>")
            .field("message_interpolator", &"<interpolator>")
            .field("clock", &"<clock>")
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            fail_fast: false,
            traversable_resolver: Arc::new(AlwaysTraversable),
            message_interpolator: Arc::new(VerbatimInterpolator),
            clock: Arc::new(SystemClock),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl ValidatorOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable/disable fail-fast.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set the traversable resolver.
    pub fn with_traversable_resolver(mut self, resolver: impl TraversableResolver + 'static) -> Self {
        self.traversable_resolver = Arc::new(resolver);
        self
    }

    /// Set the message interpolator.
    pub fn with_message_interpolator(
        mut self,
        interpolator: impl MessageInterpolator + 'static,
    ) -> Self {
        self.message_interpolator = Arc::new(interpolator);
        self
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: impl ClockProvider + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Set the validator cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}
