use crate::{Behavior, DefaultValue};

/// Per-mock configuration.
///
/// Use the builder methods to customize, or [`Default`] for a loose mock
/// that answers unconfigured calls with empty values.
///
/// # Examples
///
/// ```rust
/// use decoy::{Behavior, DefaultValue, MockConfig};
///
/// let config = MockConfig::default()
///     .with_behavior(Behavior::Strict)       // Reject unmatched calls
///     .with_default_value(DefaultValue::Mock) // Auto-mock capability results
///     .with_call_base(true);                  // Delegate unmatched calls to the base
///
/// assert!(config.behavior().is_strict());
/// assert!(config.call_base());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Strict or loose handling of unmatched calls.
    /// Default: Loose
    behavior: Behavior,

    /// Whether unmatched calls on a loose mock go to the base implementation.
    /// Default: false
    call_base: bool,

    /// Strategy for results nothing was configured for.
    /// Default: Empty
    default_value: DefaultValue,
}

impl MockConfig {
    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    /// Delegate unmatched calls to the mock's
    /// [`BaseImplementation`](crate::BaseImplementation), when one is installed.
    pub fn with_call_base(mut self, call_base: bool) -> Self {
        self.call_base = call_base;
        self
    }

    pub fn call_base(&self) -> bool {
        self.call_base
    }

    pub fn with_default_value(mut self, default_value: DefaultValue) -> Self {
        self.default_value = default_value;
        self
    }

    pub fn default_value(&self) -> &DefaultValue {
        &self.default_value
    }

    /// Configuration handed to auto-created children: same behavior and
    /// default-value strategy, no base delegation.
    pub(crate) fn for_child(&self) -> Self {
        Self {
            behavior: self.behavior,
            call_base: false,
            default_value: self.default_value.clone(),
        }
    }
}
