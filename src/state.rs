//! The state behind a [`Factory`](crate::Factory) lock and the operations that
//! configure it: registration, overrides and aliases.

use std::sync::Arc;

use crate::alias_table::AliasTable;
use crate::override_table::{InstOverrideOutcome, OverrideTable, TypeOverrideOutcome, TypePair};
use crate::type_registry::{LazyCtor, TypeRegistry};
use crate::{
    EventKind, FactoryConfig, FactoryError, FactoryEvent, ScopePattern, TypeHandle,
};

pub(crate) struct FactoryState {
    pub(crate) types: TypeRegistry,
    pub(crate) aliases: AliasTable,
    pub(crate) overrides: OverrideTable,
    pub(crate) config: FactoryConfig,
    events: Vec<FactoryEvent>,
}

impl FactoryState {
    pub fn new(config: FactoryConfig) -> Self {
        Self {
            types: TypeRegistry::default(),
            aliases: AliasTable::default(),
            overrides: OverrideTable::default(),
            config,
            events: Vec::new(),
        }
    }

    pub fn report(&mut self, event: FactoryEvent) {
        self.events.push(event);
    }

    /// Events raised since the last call, in order.
    pub fn take_events(&mut self) -> Vec<FactoryEvent> {
        std::mem::take(&mut self.events)
    }

    // ---------------------------------------------------------------------------------------------
    // Types
    // ---------------------------------------------------------------------------------------------

    pub fn register(&mut self, handle: &TypeHandle) {
        let registration = self.types.insert(handle);

        if let Some(bound) = &registration.name_taken_by {
            self.report(FactoryEvent::warning(
                EventKind::DuplicateName,
                format!(
                    "type name '{}' is already registered to a different type; lookups by this name keep resolving to the first one ({bound:?})",
                    handle.type_name()
                ),
            ));
        }

        if !registration.is_new {
            self.report(FactoryEvent::warning(
                EventKind::DuplicateRegistration,
                format!("type '{handle}' is already registered"),
            ));
            return;
        }

        if handle.has_lookup_name() && registration.name_taken_by.is_none() {
            let bound = self.overrides.bind_name(handle.type_name(), handle);
            if bound > 0 {
                tracing::debug!(
                    target: "factory_registry",
                    type_name = handle.type_name(),
                    bound,
                    "bound pending override sides"
                );
            }
        }
    }

    pub fn register_lazy(&mut self, name: &str, ctor: Arc<LazyCtor>) {
        if self.types.has_name(name) {
            self.report(FactoryEvent::warning(
                EventKind::DuplicateName,
                format!("type name '{name}' is already registered; lazy constructor ignored"),
            ));
            return;
        }
        self.types.set_lazy(name, ctor);
    }

    pub fn is_type_name_registered(&self, name: &str) -> bool {
        self.types.has_name(name) || self.aliases.has_global(name)
    }

    /// Direct lookup of `name` in the context of `path`: scoped aliases, canonical
    /// names, then global aliases. No overrides are applied and no lazy
    /// constructor runs; the factory realizes those beforehand.
    pub fn lookup_name(&mut self, name: &str, path: &str) -> Result<TypeHandle, FactoryError> {
        if let Some(handle) = self.aliases.scoped_lookup(name, path) {
            return Ok(handle.clone());
        }
        if let Some(handle) = self.types.by_name(name) {
            return Ok(handle.clone());
        }
        if let Some(handle) = self.aliases.global_lookup(name) {
            return Ok(handle.clone());
        }
        Err(FactoryError::NotRegistered {
            name: name.to_string(),
        })
    }

    /// Remove and return the lazy constructor for `name` when nothing else
    /// answers that name. The caller runs it and hands the result to
    /// [`FactoryState::finish_lazy`].
    pub fn take_pending_lazy(&mut self, name: &str) -> Option<Arc<LazyCtor>> {
        if self.types.has_name(name) || self.aliases.has_global(name) {
            return None;
        }
        self.types.take_lazy(name)
    }

    /// Register the handle a lazy constructor produced for `name`.
    pub fn finish_lazy(&mut self, name: &str, handle: TypeHandle) -> Result<TypeHandle, FactoryError> {
        if handle.type_name() != name {
            let err = FactoryError::NameMismatch {
                requested: name.to_string(),
                reported: handle.type_name().to_string(),
            };
            self.report(FactoryEvent::fatal(EventKind::NameMismatch, err.to_string()));
            return Err(err);
        }
        // The constructor may have registered the handle itself.
        self.ensure_registered(&handle);
        Ok(handle)
    }

    /// Pending lazy names that an override chain may need to look up.
    pub fn lazy_replacements(&self) -> Vec<String> {
        self.overrides
            .unresolved_replacements()
            .into_iter()
            .filter(|name| self.types.has_lazy(name))
            .map(str::to_string)
            .collect()
    }

    /// Lookup for the configuration calls: reports unknown names and keeps going.
    fn lookup_for_override(&mut self, name: &str) -> Option<TypeHandle> {
        match self.lookup_name(name, "") {
            Ok(handle) => Some(handle),
            Err(FactoryError::NotRegistered { .. }) => {
                self.report(FactoryEvent::warning(
                    EventKind::UnregisteredType,
                    format!(
                        "type '{name}' is not registered yet; the override binds when it is"
                    ),
                ));
                None
            }
            Err(_) => None,
        }
    }

    fn ensure_registered(&mut self, handle: &TypeHandle) {
        if !self.types.contains(handle) {
            self.register(handle);
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Overrides
    // ---------------------------------------------------------------------------------------------

    pub fn set_type_override_by_type(
        &mut self,
        original: &TypeHandle,
        replacement: &TypeHandle,
        replace: bool,
    ) {
        if original == replacement {
            self.report(FactoryEvent::warning(
                EventKind::SelfOverride,
                format!("type '{original}' is overridden with itself"),
            ));
        }
        self.ensure_registered(original);
        self.ensure_registered(replacement);
        self.apply_type_override(
            TypePair::resolved(original),
            TypePair::resolved(replacement),
            replace,
        );
    }

    pub fn set_type_override_by_name(&mut self, original: &str, replacement: &str, replace: bool) {
        if original == replacement {
            self.report(FactoryEvent::warning(
                EventKind::SelfOverride,
                format!("type name '{original}' is overridden with itself"),
            ));
        }
        let original_handle = self.lookup_for_override(original);
        let replacement_handle = self.lookup_for_override(replacement);
        self.apply_type_override(
            TypePair::named(original, original_handle),
            TypePair::named(replacement, replacement_handle),
            replace,
        );
    }

    fn apply_type_override(&mut self, original: TypePair, replacement: TypePair, replace: bool) {
        let from = original.display_name().to_string();
        let to = replacement.display_name().to_string();
        match self
            .overrides
            .set_type_override(original, replacement, replace)
        {
            TypeOverrideOutcome::Inserted(id) | TypeOverrideOutcome::Replaced(id) => {
                tracing::debug!(target: "factory_registry", %id, from = %from, to = %to, "type override set");
            }
            TypeOverrideOutcome::Kept(id) => {
                self.report(FactoryEvent::info(
                    EventKind::DuplicateOverride,
                    format!(
                        "type '{from}' is already overridden by override {id}; not replacing it with '{to}'"
                    ),
                ));
            }
        }
    }

    pub fn set_inst_override_by_type(
        &mut self,
        original: &TypeHandle,
        replacement: &TypeHandle,
        pattern: &str,
    ) {
        self.ensure_registered(original);
        self.ensure_registered(replacement);
        self.apply_inst_override(
            TypePair::resolved(original),
            TypePair::resolved(replacement),
            pattern,
        );
    }

    pub fn set_inst_override_by_name(&mut self, original: &str, replacement: &str, pattern: &str) {
        let original_handle = self.lookup_for_override(original);
        let replacement_handle = self.lookup_for_override(replacement);
        self.apply_inst_override(
            TypePair::named(original, original_handle),
            TypePair::named(replacement, replacement_handle),
            pattern,
        );
    }

    fn apply_inst_override(&mut self, original: TypePair, replacement: TypePair, pattern: &str) {
        let scope = self.compile_scope(pattern);
        let from = original.display_name().to_string();
        let to = replacement.display_name().to_string();
        match self.overrides.add_inst_override(original, replacement, scope) {
            InstOverrideOutcome::Appended(id) => {
                tracing::debug!(target: "factory_registry", %id, from = %from, to = %to, pattern, "instance override set");
            }
            InstOverrideOutcome::Duplicate(id) => {
                self.report(FactoryEvent::info(
                    EventKind::DuplicateOverride,
                    format!(
                        "instance override of '{from}' with '{to}' for '{pattern}' already exists as {id}"
                    ),
                ));
            }
        }
    }

    /// Compile an instance pattern, falling back to exact matching when malformed.
    pub fn compile_scope(&mut self, pattern: &str) -> ScopePattern {
        match ScopePattern::compile(pattern) {
            Ok(scope) => scope,
            Err(err) => {
                self.report(FactoryEvent::warning(
                    EventKind::InvalidPattern,
                    format!("{err}; matching it literally"),
                ));
                ScopePattern::literal(pattern)
            }
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Aliases
    // ---------------------------------------------------------------------------------------------

    pub fn set_type_alias(&mut self, alias: &str, target: &TypeHandle) {
        if !self.alias_target_registered(alias, target) {
            return;
        }
        if let Some(bound) = self.types.by_name(alias) {
            if bound != target {
                self.report(FactoryEvent::warning(
                    EventKind::AliasConflict,
                    format!("alias '{alias}' is the name of another registered type; ignored"),
                ));
                return;
            }
        }
        if let Err(existing) = self.aliases.bind_global(alias, target) {
            self.report(FactoryEvent::warning(
                EventKind::AliasConflict,
                format!("alias '{alias}' already refers to '{existing}'; not rebinding it to '{target}'"),
            ));
            return;
        }
        self.overrides.bind_name(alias, target);
    }

    pub fn set_inst_alias(&mut self, alias: &str, target: &TypeHandle, pattern: &str) {
        if !self.alias_target_registered(alias, target) {
            return;
        }
        let scope = self.compile_scope(pattern);
        self.overrides.bind_scoped_name(alias, target, &scope);
        self.aliases.bind_scoped(alias, target, scope);
    }

    fn alias_target_registered(&mut self, alias: &str, target: &TypeHandle) -> bool {
        if self.types.contains(target) {
            return true;
        }
        self.report(FactoryEvent::warning(
            EventKind::UnregisteredType,
            format!("cannot alias '{alias}' to '{target}': the target type is not registered"),
        ));
        false
    }
}
