//! Override resolution.
//!
//! Both entry points run the same algorithm over the current request:
//!
//! 1. a record already on the visited chain whose original matches the request
//!    closes a loop; the loop is reported and the request itself is returned,
//! 2. with a non-empty path, the first matching instance override is selected,
//! 3. otherwise the first matching type override with `replace` set, or failing
//!    that the first match at all,
//! 4. the selected record's replacement is resolved again in the same path, so
//!    overrides chain,
//! 5. a chain that ends on a name nobody registered is reported and yields
//!    nothing,
//! 6. without any match, by-type yields the request and by-name yields nothing.
//!
//! In trace mode every match is collected; the selection stays the same. A
//! replay is a trace that leaves usage counters alone and reports nothing.

use crate::override_table::{OverrideId, TypePair};
use crate::state::FactoryState;
use crate::{EventKind, FactoryEvent, TypeHandle};

/// Bookkeeping of one top-level resolution.
#[derive(Debug, Default)]
pub(crate) struct Resolution {
    visited: Vec<OverrideId>,
    trace: Option<Vec<OverrideId>>,
    loop_detected: bool,
    quiet: bool,
}

impl Resolution {
    pub fn tracing() -> Self {
        Self {
            trace: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Trace mode without side effects, for re-rendering a request already reported.
    pub fn replay() -> Self {
        Self {
            quiet: true,
            ..Self::tracing()
        }
    }

    pub fn loop_detected(&self) -> bool {
        self.loop_detected
    }

    /// Every record considered, in the order encountered.
    pub fn considered(&self) -> &[OverrideId] {
        self.trace.as_deref().unwrap_or_default()
    }

    fn is_tracing(&self) -> bool {
        self.trace.is_some()
    }

    fn consider(&mut self, ids: impl IntoIterator<Item = OverrideId>) {
        if let Some(trace) = self.trace.as_mut() {
            for id in ids {
                if !trace.contains(&id) {
                    trace.push(id);
                }
            }
        }
    }
}

impl FactoryState {
    pub fn find_override_by_type(
        &mut self,
        requested: &TypeHandle,
        path: &str,
        resolution: &mut Resolution,
    ) -> Option<TypeHandle> {
        self.resolve(
            Some(requested.clone()),
            requested.type_name(),
            path,
            resolution,
            true,
        )
    }

    pub fn find_override_by_name(
        &mut self,
        name: &str,
        path: &str,
        resolution: &mut Resolution,
    ) -> Option<TypeHandle> {
        if name.is_empty() {
            return None;
        }
        let requested = self.lookup_name(name, path).ok();
        self.resolve(requested, name, path, resolution, false)
    }

    fn resolve(
        &mut self,
        requested: Option<TypeHandle>,
        name: &str,
        path: &str,
        resolution: &mut Resolution,
        identity_fallback: bool,
    ) -> Option<TypeHandle> {
        if let Some(closing) = self.loop_closed_by(requested.as_ref(), name, resolution) {
            resolution.loop_detected = true;
            if resolution.quiet {
                return requested;
            }
            if let Some(record) = self.overrides.get_mut(closing) {
                record.used += 1;
            }
            self.report(FactoryEvent::error(
                EventKind::OverrideLoop,
                format!(
                    "recursive override loop detected while resolving '{}' at '{path}'; override {closing} closes it",
                    display(requested.as_ref(), name),
                ),
            ));
            return requested;
        }

        let mut selected = None;
        if !path.is_empty() {
            let matches = self.overrides.inst_matches(requested.as_ref(), name, path);
            selected = matches.first().copied();
            resolution.consider(matches);
        }

        if selected.is_none() || resolution.is_tracing() {
            let matches = self.overrides.type_matches(requested.as_ref(), name);
            if selected.is_none() {
                selected = matches
                    .iter()
                    .find(|(_, replace)| *replace)
                    .or_else(|| matches.first())
                    .map(|(id, _)| *id);
            }
            resolution.consider(matches.into_iter().map(|(id, _)| id));
        }

        let Some(id) = selected else {
            return if identity_fallback { requested } else { None };
        };

        let (tracing, quiet) = (resolution.is_tracing(), resolution.quiet);
        let replacement = {
            let record = self.overrides.get_mut(id)?;
            if !quiet {
                record.used += 1;
            }
            record.selected |= tracing;
            record.replacement.clone()
        };
        resolution.visited.push(id);

        self.follow(requested, name, id, replacement, path, resolution)
    }

    /// Resolve the replacement chosen by `id` in the same path.
    fn follow(
        &mut self,
        requested: Option<TypeHandle>,
        name: &str,
        id: OverrideId,
        replacement: TypePair,
        path: &str,
        resolution: &mut Resolution,
    ) -> Option<TypeHandle> {
        let handle = match replacement.handle {
            Some(handle) => Some(handle),
            None => self.lookup_name(&replacement.name, path).ok(),
        };

        match handle {
            Some(handle) if requested.as_ref() == Some(&handle) => Some(handle),
            Some(handle) => {
                let next_name = if replacement.name.is_empty() {
                    handle.type_name().to_string()
                } else {
                    replacement.name
                };
                self.resolve(Some(handle), &next_name, path, resolution, true)
            }
            None => {
                // A by-name override of a name onto itself has nothing left to follow.
                let resolved = if requested.is_none() && replacement.name == name {
                    None
                } else {
                    self.resolve(None, &replacement.name, path, resolution, false)
                };
                if resolved.is_none() && !resolution.quiet {
                    self.report(FactoryEvent::error(
                        EventKind::UnresolvedOverride,
                        format!(
                            "override {id} replaces '{}' with '{}', which is not a registered type",
                            display(requested.as_ref(), name),
                            replacement.name,
                        ),
                    ));
                }
                resolved
            }
        }
    }

    fn loop_closed_by(
        &self,
        requested: Option<&TypeHandle>,
        name: &str,
        resolution: &Resolution,
    ) -> Option<OverrideId> {
        resolution.visited.iter().copied().find(|id| {
            self.overrides
                .get(*id)
                .is_some_and(|record| record.original.matches(requested, name))
        })
    }
}

fn display<'a>(handle: Option<&'a TypeHandle>, name: &'a str) -> &'a str {
    if !name.is_empty() {
        name
    } else {
        handle.map_or(crate::UNKNOWN_TYPE_NAME, TypeHandle::display_name)
    }
}
