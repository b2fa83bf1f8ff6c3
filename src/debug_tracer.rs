//! Diagnostic rendering: override traces and table dumps.

use std::fmt::Write as _;

use crate::override_table::OverrideRecord;
use crate::resolver::Resolution;
use crate::state::FactoryState;
use crate::{TypeHandle, UNKNOWN_TYPE_NAME};

/// How much [`Factory::print`](crate::Factory::print) shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum PrintDetail {
    /// Instance and type overrides only.
    #[default]
    Overrides,
    /// Overrides plus every named registered type.
    Types,
    /// Everything: overrides, types, aliases, unnamed types and pending lazy names.
    All,
}

impl FactoryState {
    /// Trace the resolution of `requested` at `path` and render what was considered.
    pub fn trace_by_type(&mut self, requested: &TypeHandle, path: &str) -> String {
        self.render_by_type(requested, path, Resolution::tracing())
    }

    pub fn trace_by_name(&mut self, requested: &str, path: &str) -> String {
        self.render_by_name(requested, path, Resolution::tracing())
    }

    /// Like [`FactoryState::trace_by_type`], without counting usage or reporting.
    pub fn replay_by_type(&mut self, requested: &TypeHandle, path: &str) -> String {
        self.render_by_type(requested, path, Resolution::replay())
    }

    pub fn replay_by_name(&mut self, requested: &str, path: &str) -> String {
        self.render_by_name(requested, path, Resolution::replay())
    }

    fn render_by_type(
        &mut self,
        requested: &TypeHandle,
        path: &str,
        mut resolution: Resolution,
    ) -> String {
        let result = self.find_override_by_type(requested, path, &mut resolution);
        let text = self.render_trace(requested.display_name(), path, &resolution, result.as_ref());
        self.overrides.clear_selected();
        text
    }

    fn render_by_name(&mut self, requested: &str, path: &str, mut resolution: Resolution) -> String {
        let result = match self.find_override_by_name(requested, path, &mut resolution) {
            Some(found) => Some(found),
            None => self.lookup_name(requested, path).ok(),
        };
        let text = self.render_trace(requested, path, &resolution, result.as_ref());
        self.overrides.clear_selected();
        text
    }

    fn render_trace(
        &self,
        requested: &str,
        path: &str,
        resolution: &Resolution,
        result: Option<&TypeHandle>,
    ) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Factory override trace (*)");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Request for type '{requested}' at instance path '{path}'."
        );

        let considered = resolution.considered();
        if considered.is_empty() {
            let _ = writeln!(out, "No overrides apply to this request.");
        } else {
            let _ = writeln!(
                out,
                "Overrides considered ('x' marks a match that was ignored):"
            );
            let _ = writeln!(out);
            let rows: Vec<Vec<String>> = considered
                .iter()
                .filter_map(|id| self.overrides.get(*id))
                .map(|record| {
                    vec![
                        if record.selected { " " } else { "x" }.to_string(),
                        record.original.display_name().to_string(),
                        scope_column(record),
                        record.replacement.display_name().to_string(),
                    ]
                })
                .collect();
            render_table(
                &mut out,
                &["", "Original Type", "Instance Path", "Override Type"],
                &rows,
            );
        }

        let _ = writeln!(out);
        match result {
            Some(handle) => {
                let _ = writeln!(
                    out,
                    "Result: the factory produces an object of type '{}'.",
                    handle.display_name()
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "Result: the factory cannot produce an object for this request."
                );
            }
        }
        let _ = writeln!(out);
        footnote(&mut out);
        out
    }

    /// Render the current tables without resolving anything.
    pub fn dump(&self, detail: PrintDetail) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Factory configuration (*)");
        let _ = writeln!(out);

        let inst = self.overrides.inst_overrides();
        let types = self.overrides.type_overrides();
        if inst.is_empty() && types.is_empty() {
            let _ = writeln!(out, "No instance or type overrides are registered.");
            let _ = writeln!(out);
        }

        if !inst.is_empty() {
            let _ = writeln!(out, "Instance overrides:");
            let _ = writeln!(out);
            let rows: Vec<Vec<String>> = inst
                .iter()
                .map(|record| {
                    vec![
                        record.id.to_string(),
                        record.original.display_name().to_string(),
                        record.scope.as_str().to_string(),
                        record.replacement.display_name().to_string(),
                        record.used.to_string(),
                    ]
                })
                .collect();
            render_table(
                &mut out,
                &["Id", "Requested Type", "Override Path", "Override Type", "Used"],
                &rows,
            );
            let _ = writeln!(out);
        }

        if !types.is_empty() {
            let _ = writeln!(out, "Type overrides:");
            let _ = writeln!(out);
            let rows: Vec<Vec<String>> = types
                .iter()
                .map(|record| {
                    vec![
                        record.id.to_string(),
                        record.original.display_name().to_string(),
                        record.replacement.display_name().to_string(),
                        if record.replace { "yes" } else { "no" }.to_string(),
                        record.used.to_string(),
                    ]
                })
                .collect();
            render_table(
                &mut out,
                &["Id", "Requested Type", "Override Type", "Replace", "Used"],
                &rows,
            );
            let _ = writeln!(out);
        }

        if detail >= PrintDetail::Types {
            let named: Vec<Vec<String>> = self
                .types
                .named()
                .map(|(name, _)| vec![name.to_string()])
                .collect();
            let _ = writeln!(out, "Registered types: {} named", named.len());
            if !named.is_empty() {
                let _ = writeln!(out);
                render_table(&mut out, &["Type Name"], &named);
            }
            let _ = writeln!(out);
        }

        if detail >= PrintDetail::All {
            let unnamed = self
                .types
                .all()
                .iter()
                .filter(|handle| !handle.has_lookup_name())
                .count();
            let _ = writeln!(out, "Unnamed types: {unnamed}");
            let _ = writeln!(out);

            let aliases: Vec<Vec<String>> = self
                .aliases
                .records()
                .into_iter()
                .map(|record| {
                    vec![
                        record.alias,
                        record.target.display_name().to_string(),
                        record
                            .scope
                            .map_or_else(|| "<global>".to_string(), |s| s.as_str().to_string()),
                    ]
                })
                .collect();
            if aliases.is_empty() {
                let _ = writeln!(out, "No aliases are registered.");
            } else {
                let _ = writeln!(out, "Aliases:");
                let _ = writeln!(out);
                render_table(&mut out, &["Alias", "Target Type", "Scope"], &aliases);
            }
            let _ = writeln!(out);

            let pending = self.types.pending_lazy();
            if !pending.is_empty() {
                let _ = writeln!(out, "Lazy types not yet constructed: {}", pending.join(", "));
                let _ = writeln!(out);
            }
        }

        footnote(&mut out);
        out
    }

    /// Ids of the records a trace would render as selected; empty outside a trace.
    #[cfg(test)]
    pub(crate) fn selected_records(&self) -> Vec<crate::override_table::OverrideId> {
        self.overrides
            .type_overrides()
            .iter()
            .chain(self.overrides.inst_overrides())
            .filter(|record| record.selected)
            .map(|record| record.id)
            .collect()
    }
}

fn footnote(out: &mut String) {
    let _ = write!(
        out,
        "(*) Types with no associated type name are printed as {UNKNOWN_TYPE_NAME}"
    );
}

fn scope_column(record: &OverrideRecord) -> String {
    if record.is_instance() {
        record.scope.as_str().to_string()
    } else {
        "<type override>".to_string()
    }
}

/// Left-aligned columns, two spaces apart, with a dashed rule under the header.
fn render_table(out: &mut String, headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let mut text = String::new();
        for (i, (cell, &width)) in cells.iter().zip(&widths).enumerate() {
            if i > 0 {
                text.push_str("  ");
            }
            let _ = write!(text, "{cell:<width$}");
        }
        text.trim_end().to_string()
    };

    let _ = writeln!(out, "  {}", line(headers.to_vec()));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "  {}", line(rule.iter().map(String::as_str).collect()));
    for row in rows {
        let _ = writeln!(out, "  {}", line(row.iter().map(String::as_str).collect()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FactoryConfig;

    fn state() -> FactoryState {
        FactoryState::new(FactoryConfig::default())
    }

    #[test]
    fn test_trace_marks_ignored_matches() {
        let mut state = state();
        let a = TypeHandle::abstract_type("a");
        let b = TypeHandle::abstract_type("b");
        let c = TypeHandle::abstract_type("c");
        state.set_inst_override_by_type(&a, &b, "env.agent0.*");
        state.set_type_override_by_type(&a, &c, true);

        let text = state.trace_by_type(&a, "env.agent0.driver0");
        assert!(text.contains("Request for type 'a' at instance path 'env.agent0.driver0'."));
        assert!(text.contains("    a              env.agent0.*     b"));
        assert!(text.contains("x  a              <type override>  c"));
        assert!(text.contains("produces an object of type 'b'"));
        assert!(state.selected_records().is_empty());
    }

    #[test]
    fn test_trace_without_overrides() {
        let mut state = state();
        let a = TypeHandle::abstract_type("a");
        state.register(&a);

        let text = state.trace_by_type(&a, "top");
        assert!(text.contains("No overrides apply to this request."));
        assert!(text.contains("produces an object of type 'a'"));
    }

    #[test]
    fn test_trace_by_name_falls_back_to_registered_type() {
        let mut state = state();
        let a = TypeHandle::abstract_type("a");
        state.register(&a);

        let text = state.trace_by_name("a", "");
        assert!(text.contains("produces an object of type 'a'"));

        let text = state.trace_by_name("nobody", "");
        assert!(text.contains("cannot produce an object"));
    }

    #[test]
    fn test_repeated_traces_are_identical() {
        let mut state = state();
        let a = TypeHandle::abstract_type("a");
        let b = TypeHandle::abstract_type("b");
        state.set_type_override_by_type(&a, &b, true);

        let first = state.trace_by_type(&a, "");
        let second = state.trace_by_type(&a, "");
        assert_eq!(first, second);
        assert!(state.selected_records().is_empty());
    }

    #[test]
    fn test_replay_renders_loop_without_counting() {
        let mut state = state();
        let a = TypeHandle::abstract_type("a");
        let b = TypeHandle::abstract_type("b");
        state.set_type_override_by_type(&a, &b, true);
        state.set_type_override_by_type(&b, &a, true);
        state.take_events();

        let text = state.replay_by_type(&a, "");
        assert!(text.contains("produces an object of type 'a'"));
        assert!(state.take_events().is_empty());
        assert!(state.overrides.type_overrides().iter().all(|r| r.used == 0));

        let traced = state.trace_by_name("a", "");
        assert_eq!(traced, text);
        assert_eq!(state.take_events().len(), 1);
    }

    #[test]
    fn test_dump_levels() {
        let mut state = state();
        let a = TypeHandle::abstract_type("a");
        let b = TypeHandle::abstract_type("b");
        state.set_type_override_by_type(&a, &b, true);
        state.set_inst_override_by_type(&a, &b, "env.*");
        state.register(&TypeHandle::abstract_type(""));
        state.set_type_alias("short", &a);

        let overrides = state.dump(PrintDetail::Overrides);
        assert!(overrides.contains("Instance overrides:"));
        assert!(overrides.contains("Type overrides:"));
        assert!(!overrides.contains("Registered types"));

        let types = state.dump(PrintDetail::Types);
        assert!(types.contains("Registered types: 2 named"));
        assert!(!types.contains("Aliases:"));

        let all = state.dump(PrintDetail::All);
        assert!(all.contains("Unnamed types: 1"));
        assert!(all.contains("Aliases:"));
        assert!(all.contains("short"));
    }

    #[test]
    fn test_dump_empty_factory() {
        let state = state();
        let text = state.dump(PrintDetail::Overrides);
        assert!(text.contains("No instance or type overrides are registered."));
    }

    #[test]
    fn test_render_table_alignment() {
        let mut out = String::new();
        render_table(
            &mut out,
            &["Name", "X"],
            &[vec!["long_name".into(), "1".into()], vec!["s".into(), "22".into()]],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "  Name       X");
        assert_eq!(lines[1], "  ---------  --");
        assert_eq!(lines[2], "  long_name  1");
        assert_eq!(lines[3], "  s          22");
    }
}
