//! Events reported by the factory.
//!
//! Every event is logged through `tracing` and, when one is installed, handed
//! to the report callback set with
//! [`Factory::set_report_callback`](crate::Factory::set_report_callback).
//! What to do with an event (count it, escalate it, ignore it) is the
//! callback's business; the factory itself only ever escalates
//! [`Severity::Fatal`], according to its [`FatalPolicy`](crate::FatalPolicy).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        })
    }
}

/// What an event is about. [`EventKind::tag`] is the stable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A name was already bound to a different type.
    DuplicateName,
    /// The same handle was registered twice.
    DuplicateRegistration,
    /// An override identical to an existing one, or one not replacing an existing one.
    DuplicateOverride,
    /// A type was overridden with itself.
    SelfOverride,
    /// A name or alias target is unknown to the factory.
    UnregisteredType,
    /// An alias name is already bound.
    AliasConflict,
    /// An instance pattern failed to compile.
    InvalidPattern,
    /// Override resolution came back to a type it already visited.
    OverrideLoop,
    /// An override chain ended on a name with no registered type.
    UnresolvedOverride,
    /// A lazy constructor returned a type with a different name.
    NameMismatch,
    /// The resolved type cannot be constructed the way it was requested.
    CreateFailed,
    /// Rendered output of a debug trace.
    OverrideTrace,
    /// Rendered output of a table dump.
    FactoryDump,
}

impl EventKind {
    pub fn tag(self) -> &'static str {
        match self {
            EventKind::DuplicateName => "TYPE_DUP",
            EventKind::DuplicateRegistration => "TYPE_REREG",
            EventKind::DuplicateOverride => "OVRD_DUP",
            EventKind::SelfOverride => "OVRD_SELF",
            EventKind::UnregisteredType => "TYPE_NOT_REG",
            EventKind::AliasConflict => "ALIAS_DUP",
            EventKind::InvalidPattern => "BAD_PATTERN",
            EventKind::OverrideLoop => "OVRD_LOOP",
            EventKind::UnresolvedOverride => "OVRD_UNRESOLVED",
            EventKind::NameMismatch => "TYPE_NAME_MISMATCH",
            EventKind::CreateFailed => "CREATE_FAILED",
            EventKind::OverrideTrace => "OVRD_TRACE",
            EventKind::FactoryDump => "FACTORY_DUMP",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One report from the factory: `(tag, message, severity)`.
///
/// The `Clone` derive lets callbacks keep events around after the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryEvent {
    pub kind: EventKind,
    pub severity: Severity,
    pub message: String,
}

impl FactoryEvent {
    pub fn new(kind: EventKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }

    pub fn info(kind: EventKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Info, message)
    }

    pub fn warning(kind: EventKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning, message)
    }

    pub fn error(kind: EventKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Error, message)
    }

    pub fn fatal(kind: EventKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Fatal, message)
    }

    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    pub(crate) fn log(&self) {
        let tag = self.tag();
        match self.severity {
            Severity::Info => {
                tracing::info!(target: "factory_registry", tag, "{}", self.message)
            }
            Severity::Warning => {
                tracing::warn!(target: "factory_registry", tag, "{}", self.message)
            }
            Severity::Error => {
                tracing::error!(target: "factory_registry", tag, "{}", self.message)
            }
            Severity::Fatal => {
                tracing::error!(target: "factory_registry", tag, fatal = true, "{}", self.message)
            }
        }
    }
}

impl fmt::Display for FactoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.tag(), self.severity, self.message)
    }
}

/// The user-supplied report callback.
///
/// It runs after the factory state is released, so it may call back into the
/// factory that raised the event.
pub type ReportCallback = dyn Fn(&FactoryEvent) + Send + Sync + 'static;
