//! Identity and name bookkeeping for creatable types.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::TypeHandle;

/// Produces a handle on first lookup of a name that was never registered.
pub type LazyCtor = dyn Fn() -> TypeHandle + Send + Sync + 'static;

/// Outcome of [`TypeRegistry::insert`].
#[derive(Debug, Default)]
pub(crate) struct Registration {
    /// The handle was not in the type set before.
    pub is_new: bool,
    /// The name was already bound to this other handle.
    pub name_taken_by: Option<TypeHandle>,
}

#[derive(Default)]
pub(crate) struct TypeRegistry {
    types: HashSet<TypeHandle>,
    /// Registration order, for stable dumps.
    order: Vec<TypeHandle>,
    names: BTreeMap<String, TypeHandle>,
    lazy: HashMap<String, Arc<LazyCtor>>,
}

impl TypeRegistry {
    pub fn insert(&mut self, handle: &TypeHandle) -> Registration {
        let mut registration = Registration::default();

        if handle.has_lookup_name() {
            match self.names.get(handle.type_name()) {
                Some(bound) if bound != handle => {
                    registration.name_taken_by = Some(bound.clone());
                }
                Some(_) => {}
                None => {
                    self.names
                        .insert(handle.type_name().to_string(), handle.clone());
                }
            }
        }

        if self.types.insert(handle.clone()) {
            self.order.push(handle.clone());
            registration.is_new = true;
        }
        registration
    }

    pub fn contains(&self, handle: &TypeHandle) -> bool {
        self.types.contains(handle)
    }

    pub fn by_name(&self, name: &str) -> Option<&TypeHandle> {
        self.names.get(name)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn set_lazy(&mut self, name: &str, ctor: Arc<LazyCtor>) {
        self.lazy.insert(name.to_string(), ctor);
    }

    pub fn has_lazy(&self, name: &str) -> bool {
        self.lazy.contains_key(name)
    }

    /// The lazy constructor for `name`, consumed so it runs at most once.
    pub fn take_lazy(&mut self, name: &str) -> Option<Arc<LazyCtor>> {
        self.lazy.remove(name)
    }

    /// Names bound in the canonical table, sorted.
    pub fn named(&self) -> impl Iterator<Item = (&str, &TypeHandle)> {
        self.names.iter().map(|(name, handle)| (name.as_str(), handle))
    }

    /// Every registered handle, in registration order.
    pub fn all(&self) -> &[TypeHandle] {
        &self.order
    }

    /// Lazy names not realized yet, sorted.
    pub fn pending_lazy(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.lazy.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
