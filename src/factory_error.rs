use thiserror::Error;

/// Typed failures of factory lookups.
///
/// Most misconfiguration is reported as a [`FactoryEvent`](crate::FactoryEvent)
/// and never surfaces as an error; these variants are returned by the
/// operations that have no sensible degraded result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    #[error("type '{name}' is not registered with the factory")]
    NotRegistered { name: String },

    #[error("lazy constructor for '{requested}' produced a type named '{reported}'")]
    NameMismatch { requested: String, reported: String },

    #[error("invalid instance pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
