//! Global type overrides and instance-scoped overrides.
//!
//! The two collections never share storage. Type overrides are kept
//! newest-first; instance overrides oldest-first, so the first match in either
//! list is the one with precedence.

use std::fmt;

use crate::{ScopePattern, TypeHandle, UNKNOWN_TYPE_NAME};

/// Stable identifier of an override record, unaffected by insertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverrideId(u64);

impl fmt::Display for OverrideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One side of an override: a handle once known, and the name it was declared under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePair {
    pub handle: Option<TypeHandle>,
    pub name: String,
}

impl TypePair {
    pub fn resolved(handle: &TypeHandle) -> Self {
        Self {
            handle: Some(handle.clone()),
            name: handle.type_name().to_string(),
        }
    }

    pub fn named(name: &str, handle: Option<TypeHandle>) -> Self {
        Self {
            handle,
            name: name.to_string(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.handle.is_some()
    }

    /// The side matches a request if the handles are identical, or if this side
    /// is unresolved and was declared under the requested name.
    pub fn matches(&self, handle: Option<&TypeHandle>, name: &str) -> bool {
        match &self.handle {
            Some(own) => handle == Some(own),
            None => !name.is_empty() && self.name == name,
        }
    }

    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if let Some(handle) = &self.handle {
            handle.display_name()
        } else {
            UNKNOWN_TYPE_NAME
        }
    }

    fn bind(&mut self, name: &str, handle: &TypeHandle) -> bool {
        if self.handle.is_none() && self.name == name {
            self.handle = Some(handle.clone());
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct OverrideRecord {
    pub id: OverrideId,
    pub original: TypePair,
    pub replacement: TypePair,
    /// Global for type overrides.
    pub scope: ScopePattern,
    pub replace: bool,
    pub wildcard: bool,
    pub used: u32,
    /// Set while a debug trace is being rendered, cleared right after.
    pub selected: bool,
}

impl OverrideRecord {
    pub fn is_instance(&self) -> bool {
        !self.scope.is_global()
    }

    /// Original matches the request and, for instance records, the scope matches `path`.
    pub fn applies_to(&self, handle: Option<&TypeHandle>, name: &str, path: &str) -> bool {
        self.original.matches(handle, name) && (!self.is_instance() || self.scope.matches(path))
    }
}

/// Outcome of [`OverrideTable::set_type_override`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeOverrideOutcome {
    Inserted(OverrideId),
    Replaced(OverrideId),
    Kept(OverrideId),
}

/// Outcome of [`OverrideTable::add_inst_override`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InstOverrideOutcome {
    Appended(OverrideId),
    Duplicate(OverrideId),
}

#[derive(Default)]
pub(crate) struct OverrideTable {
    type_overrides: Vec<OverrideRecord>,
    inst_overrides: Vec<OverrideRecord>,
    next_id: u64,
}

impl OverrideTable {
    fn allocate_id(&mut self) -> OverrideId {
        let id = OverrideId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add or update a global override of `original`.
    ///
    /// The scan from the front stops at the first entry whose original side is
    /// still unresolved; past that point a match could be shadowed by an entry
    /// that only binds later, so a new entry is inserted instead.
    pub fn set_type_override(
        &mut self,
        original: TypePair,
        replacement: TypePair,
        replace: bool,
    ) -> TypeOverrideOutcome {
        for record in &mut self.type_overrides {
            if !record.original.is_resolved() {
                break;
            }
            if record
                .original
                .matches(original.handle.as_ref(), &original.name)
            {
                if !replace {
                    return TypeOverrideOutcome::Kept(record.id);
                }
                record.replacement = replacement;
                record.replace = true;
                return TypeOverrideOutcome::Replaced(record.id);
            }
        }

        let id = self.allocate_id();
        self.type_overrides.insert(
            0,
            OverrideRecord {
                id,
                original,
                replacement,
                scope: ScopePattern::global(),
                replace,
                wildcard: false,
                used: 0,
                selected: false,
            },
        );
        TypeOverrideOutcome::Inserted(id)
    }

    pub fn add_inst_override(
        &mut self,
        original: TypePair,
        replacement: TypePair,
        scope: ScopePattern,
    ) -> InstOverrideOutcome {
        if let Some(existing) = self.inst_overrides.iter().find(|record| {
            record.original == original
                && record.replacement == replacement
                && record.scope == scope
        }) {
            return InstOverrideOutcome::Duplicate(existing.id);
        }

        let id = self.allocate_id();
        let wildcard = scope.is_wildcard();
        self.inst_overrides.push(OverrideRecord {
            id,
            original,
            replacement,
            scope,
            replace: true,
            wildcard,
            used: 0,
            selected: false,
        });
        InstOverrideOutcome::Appended(id)
    }

    /// Bind every unresolved side declared under `name` to `handle`.
    pub fn bind_name(&mut self, name: &str, handle: &TypeHandle) -> usize {
        self.type_overrides
            .iter_mut()
            .chain(self.inst_overrides.iter_mut())
            .map(|record| {
                usize::from(record.original.bind(name, handle))
                    + usize::from(record.replacement.bind(name, handle))
            })
            .sum()
    }

    /// Bind unresolved instance-record sides declared under `name` whose scope
    /// falls within `alias_scope`.
    pub fn bind_scoped_name(
        &mut self,
        name: &str,
        handle: &TypeHandle,
        alias_scope: &ScopePattern,
    ) -> usize {
        self.inst_overrides
            .iter_mut()
            .filter(|record| alias_scope.matches(record.scope.as_str()))
            .map(|record| {
                usize::from(record.original.bind(name, handle))
                    + usize::from(record.replacement.bind(name, handle))
            })
            .sum()
    }

    /// Names of replacement sides still waiting for a handle, deduplicated.
    pub fn unresolved_replacements(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .type_overrides
            .iter()
            .chain(self.inst_overrides.iter())
            .filter(|record| !record.replacement.is_resolved())
            .map(|record| record.replacement.name.as_str())
            .filter(|name| !name.is_empty())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn type_overrides(&self) -> &[OverrideRecord] {
        &self.type_overrides
    }

    pub fn inst_overrides(&self) -> &[OverrideRecord] {
        &self.inst_overrides
    }

    pub fn get(&self, id: OverrideId) -> Option<&OverrideRecord> {
        self.type_overrides
            .iter()
            .chain(self.inst_overrides.iter())
            .find(|record| record.id == id)
    }

    pub fn get_mut(&mut self, id: OverrideId) -> Option<&mut OverrideRecord> {
        self.type_overrides
            .iter_mut()
            .chain(self.inst_overrides.iter_mut())
            .find(|record| record.id == id)
    }

    /// Instance records for the request, in precedence order.
    pub fn inst_matches(
        &self,
        handle: Option<&TypeHandle>,
        name: &str,
        path: &str,
    ) -> Vec<OverrideId> {
        self.inst_overrides
            .iter()
            .filter(|record| record.applies_to(handle, name, path))
            .map(|record| record.id)
            .collect()
    }

    /// Type records for the request, front first, with their replace flag.
    pub fn type_matches(&self, handle: Option<&TypeHandle>, name: &str) -> Vec<(OverrideId, bool)> {
        self.type_overrides
            .iter()
            .filter(|record| record.original.matches(handle, name))
            .map(|record| (record.id, record.replace))
            .collect()
    }

    pub fn clear_selected(&mut self) {
        for record in self
            .type_overrides
            .iter_mut()
            .chain(self.inst_overrides.iter_mut())
        {
            record.selected = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(handle: &TypeHandle) -> TypePair {
        TypePair::resolved(handle)
    }

    #[test]
    fn test_type_override_inserted_at_front() {
        let mut table = OverrideTable::default();
        let (a, b, c, d) = (
            TypeHandle::abstract_type("a"),
            TypeHandle::abstract_type("b"),
            TypeHandle::abstract_type("c"),
            TypeHandle::abstract_type("d"),
        );

        table.set_type_override(pair(&a), pair(&b), true);
        table.set_type_override(pair(&c), pair(&d), true);

        let originals: Vec<_> = table
            .type_overrides()
            .iter()
            .map(|r| r.original.name.as_str())
            .collect();
        assert_eq!(originals, vec!["c", "a"]);
    }

    #[test]
    fn test_type_override_replace_flag() {
        let mut table = OverrideTable::default();
        let (a, b, c) = (
            TypeHandle::abstract_type("a"),
            TypeHandle::abstract_type("b"),
            TypeHandle::abstract_type("c"),
        );

        let TypeOverrideOutcome::Inserted(id) = table.set_type_override(pair(&a), pair(&b), true)
        else {
            panic!("expected insertion");
        };

        assert_eq!(
            table.set_type_override(pair(&a), pair(&c), false),
            TypeOverrideOutcome::Kept(id)
        );
        assert_eq!(table.get(id).unwrap().replacement.handle, Some(b.clone()));

        assert_eq!(
            table.set_type_override(pair(&a), pair(&c), true),
            TypeOverrideOutcome::Replaced(id)
        );
        assert_eq!(table.get(id).unwrap().replacement.handle, Some(c));
        assert_eq!(table.type_overrides().len(), 1);
    }

    #[test]
    fn test_scan_stops_at_unresolved_original() {
        let mut table = OverrideTable::default();
        let (a, b, c) = (
            TypeHandle::abstract_type("a"),
            TypeHandle::abstract_type("b"),
            TypeHandle::abstract_type("c"),
        );

        table.set_type_override(pair(&a), pair(&b), true);
        table.set_type_override(TypePair::named("ghost", None), pair(&b), true);

        // `a` is matched behind the unresolved `ghost` entry, so a new entry wins.
        let outcome = table.set_type_override(pair(&a), pair(&c), true);
        assert!(matches!(outcome, TypeOverrideOutcome::Inserted(_)));
        assert_eq!(table.type_overrides().len(), 3);

        // Same for a repeat of the unresolved name itself.
        let outcome = table.set_type_override(TypePair::named("ghost", None), pair(&c), true);
        assert!(matches!(outcome, TypeOverrideOutcome::Inserted(_)));
        assert_eq!(table.type_overrides().len(), 4);
    }

    #[test]
    fn test_inst_override_rejects_exact_duplicate() {
        let mut table = OverrideTable::default();
        let (a, b) = (TypeHandle::abstract_type("a"), TypeHandle::abstract_type("b"));
        let scope = ScopePattern::compile("env.*").unwrap();

        let first = table.add_inst_override(pair(&a), pair(&b), scope.clone());
        let InstOverrideOutcome::Appended(id) = first else {
            panic!("expected append");
        };
        assert_eq!(
            table.add_inst_override(pair(&a), pair(&b), scope),
            InstOverrideOutcome::Duplicate(id)
        );

        let other_scope = ScopePattern::compile("top.*").unwrap();
        assert!(matches!(
            table.add_inst_override(pair(&a), pair(&b), other_scope),
            InstOverrideOutcome::Appended(_)
        ));
        assert_eq!(table.inst_overrides().len(), 2);
        assert!(table.inst_overrides()[0].wildcard);
    }

    #[test]
    fn test_inst_matches_in_registration_order() {
        let mut table = OverrideTable::default();
        let (a, b, c) = (
            TypeHandle::abstract_type("a"),
            TypeHandle::abstract_type("b"),
            TypeHandle::abstract_type("c"),
        );
        table.add_inst_override(pair(&a), pair(&b), ScopePattern::compile("env.*").unwrap());
        table.add_inst_override(pair(&a), pair(&c), ScopePattern::compile("*").unwrap());

        let ids = table.inst_matches(Some(&a), "a", "env.x");
        assert_eq!(ids.len(), 2);
        assert_eq!(table.get(ids[0]).unwrap().replacement.handle, Some(b));

        let ids = table.inst_matches(Some(&a), "a", "top.x");
        assert_eq!(ids.len(), 1);
        assert_eq!(table.get(ids[0]).unwrap().replacement.handle, Some(c));
    }

    #[test]
    fn test_bind_name_resolves_both_sides() {
        let mut table = OverrideTable::default();
        let a = TypeHandle::abstract_type("a");
        table.set_type_override(TypePair::named("late", None), pair(&a), true);
        table.add_inst_override(
            pair(&a),
            TypePair::named("late", None),
            ScopePattern::literal("env"),
        );

        assert_eq!(table.unresolved_replacements(), vec!["late"]);

        let late = TypeHandle::abstract_type("late");
        assert_eq!(table.bind_name("late", &late), 2);
        assert!(table.unresolved_replacements().is_empty());
        assert_eq!(table.bind_name("late", &late), 0);
        assert!(table.type_matches(Some(&late), "late").len() == 1);
    }

    #[test]
    fn test_matching_by_name_only_when_unresolved() {
        let a = TypeHandle::abstract_type("a");
        let resolved = TypePair::resolved(&a);
        let unresolved = TypePair::named("a", None);
        let other = TypeHandle::abstract_type("a");

        assert!(resolved.matches(Some(&a), "a"));
        assert!(!resolved.matches(Some(&other), "a"));
        assert!(!resolved.matches(None, "a"));
        assert!(unresolved.matches(Some(&other), "a"));
        assert!(unresolved.matches(None, "a"));
        assert!(!unresolved.matches(None, ""));
    }
}
