//! Alternate names for registered types, global or scoped to instance paths.

use std::collections::BTreeMap;

use crate::{ScopePattern, TypeHandle};

#[derive(Debug, Clone)]
pub struct AliasRecord {
    pub alias: String,
    pub target: TypeHandle,
    /// `None` for a global alias.
    pub scope: Option<ScopePattern>,
}

#[derive(Default)]
pub(crate) struct AliasTable {
    global: BTreeMap<String, TypeHandle>,
    scoped: Vec<AliasRecord>,
}

impl AliasTable {
    /// Bind a global alias. Returns the existing target if `alias` is taken.
    pub fn bind_global(&mut self, alias: &str, target: &TypeHandle) -> Result<(), TypeHandle> {
        match self.global.get(alias) {
            Some(existing) if existing != target => Err(existing.clone()),
            Some(_) => Ok(()),
            None => {
                self.global.insert(alias.to_string(), target.clone());
                Ok(())
            }
        }
    }

    pub fn bind_scoped(&mut self, alias: &str, target: &TypeHandle, scope: ScopePattern) {
        self.scoped.push(AliasRecord {
            alias: alias.to_string(),
            target: target.clone(),
            scope: Some(scope),
        });
    }

    /// First scoped alias for `name` whose pattern matches `path`.
    pub fn scoped_lookup(&self, name: &str, path: &str) -> Option<&TypeHandle> {
        if path.is_empty() {
            return None;
        }
        self.scoped
            .iter()
            .find(|record| {
                record.alias == name
                    && record
                        .scope
                        .as_ref()
                        .is_some_and(|scope| scope.matches(path))
            })
            .map(|record| &record.target)
    }

    pub fn global_lookup(&self, name: &str) -> Option<&TypeHandle> {
        self.global.get(name)
    }

    pub fn has_global(&self, name: &str) -> bool {
        self.global.contains_key(name)
    }

    /// Every alias, global ones first (sorted), then scoped ones in declaration order.
    pub fn records(&self) -> Vec<AliasRecord> {
        self.global
            .iter()
            .map(|(alias, target)| AliasRecord {
                alias: alias.clone(),
                target: target.clone(),
                scope: None,
            })
            .chain(self.scoped.iter().cloned())
            .collect()
    }
}
