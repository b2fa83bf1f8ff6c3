/// What the factory does after reporting a [`Severity::Fatal`](crate::Severity::Fatal) event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FatalPolicy {
    /// Panic once the event has been logged and handed to the report callback.
    #[default]
    Panic,
    /// Keep going; the operation that hit the fatal condition yields nothing.
    Report,
}

/// Settings of a [`Factory`](crate::Factory).
///
/// # Examples
///
/// ```rust
/// use factory_registry::{Factory, FactoryConfig, FatalPolicy};
///
/// let factory = Factory::with_config(
///     FactoryConfig::default()
///         .with_debug_on_loop(false)
///         .with_fatal_policy(FatalPolicy::Report),
/// );
/// assert_eq!(factory.config().fatal_policy, FatalPolicy::Report);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryConfig {
    /// Emit the override trace of the request whenever a loop is detected.
    pub debug_on_loop: bool,
    pub fatal_policy: FatalPolicy,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            debug_on_loop: true,
            fatal_policy: FatalPolicy::Panic,
        }
    }
}

impl FactoryConfig {
    #[must_use]
    pub fn with_debug_on_loop(mut self, enabled: bool) -> Self {
        self.debug_on_loop = enabled;
        self
    }

    #[must_use]
    pub fn with_fatal_policy(mut self, policy: FatalPolicy) -> Self {
        self.fatal_policy = policy;
        self
    }
}
