//! Integration tests for event reporting and diagnostics.
//!
//! This test demonstrates how to monitor a factory through the report callback
//! and how to read its override traces and table dumps.

use factory_registry::{
    EventKind, Factory, FactoryConfig, FactoryError, FactoryEvent, FatalPolicy, PrintDetail,
    Severity, TypeHandle,
};
use std::sync::{Arc, Mutex};

fn collect(factory: &Factory) -> Arc<Mutex<Vec<FactoryEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    factory.set_report_callback(move |event| {
        events_clone.lock().unwrap().push(event.clone());
    });
    events
}

#[test]
fn test_event_display_format() {
    let factory = Factory::new();
    let events = collect(&factory);

    let a = TypeHandle::abstract_type("a");
    factory.register(&a);
    factory.register(&a);

    let captured = events.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(
        captured[0].to_string(),
        "[TYPE_REREG] warning: type 'a' is already registered"
    );
}

#[test]
fn test_conflicting_type_name_keeps_first() {
    let factory = Factory::new();
    let events = collect(&factory);

    let first = TypeHandle::abstract_type("dup");
    let second = TypeHandle::abstract_type("dup");
    factory.register(&first);
    factory.register(&second);

    assert!(factory.is_type_registered(&second));
    assert_eq!(factory.find_wrapper_by_name("dup"), Ok(first));
    let captured = events.lock().unwrap();
    assert_eq!(captured[0].kind, EventKind::DuplicateName);
    assert_eq!(captured[0].severity, Severity::Warning);
}

#[test]
fn test_alias_conflict_is_reported() {
    let factory = Factory::new();
    let events = collect(&factory);

    let a = TypeHandle::abstract_type("a");
    let b = TypeHandle::abstract_type("b");
    factory.register(&a);
    factory.register(&b);
    factory.set_type_alias("short", &a);
    factory.set_type_alias("short", &b);

    assert_eq!(factory.find_wrapper_by_name("short"), Ok(a));
    let kinds: Vec<EventKind> = events.lock().unwrap().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::AliasConflict]);
}

#[test]
fn test_debug_create_reports_trace() {
    let factory = Factory::new();
    let events = collect(&factory);

    let a = TypeHandle::abstract_type("a");
    let b = TypeHandle::abstract_type("b");
    let c = TypeHandle::abstract_type("c");
    factory.set_inst_override_by_type(&a, &b, "env.agent0.*");
    factory.set_type_override_by_type(&a, &c, true);

    let text = factory.debug_create_by_type(&a, "env.agent0", "driver0");
    assert!(text.contains("Request for type 'a' at instance path 'env.agent0.driver0'."));
    assert!(text.contains("env.agent0.*"));
    assert!(text.contains("<type override>"));
    assert!(text.contains("produces an object of type 'b'"));

    let by_name = factory.debug_create_by_name("a", "env.agent0", "driver0");
    assert!(by_name.contains("produces an object of type 'b'"));

    let captured = events.lock().unwrap();
    assert_eq!(captured.len(), 2);
    assert!(captured.iter().all(|e| e.kind == EventKind::OverrideTrace));
    assert_eq!(captured[0].message, text);
}

#[test]
fn test_debug_create_unknown_name() {
    let factory = Factory::new();
    let text = factory.debug_create_by_name("nobody", "", "x");
    assert!(text.contains("cannot produce an object for this request"));
    assert!(text.ends_with("printed as <unknown>"));
}

#[test]
fn test_print_counts_usage() {
    let factory = Factory::new();
    let events = collect(&factory);

    let a = TypeHandle::abstract_type("a");
    let b = TypeHandle::abstract_type("b");
    factory.set_type_override_by_type(&a, &b, true);
    factory.find_override_by_type(&a, "");
    factory.find_override_by_type(&a, "");

    assert_eq!(factory.type_overrides()[0].used, 2);

    let text = factory.print(PrintDetail::Types);
    assert!(text.contains("Type overrides:"));
    assert!(text.contains("Registered types: 2 named"));

    let captured = events.lock().unwrap();
    assert_eq!(captured.last().map(|e| e.kind), Some(EventKind::FactoryDump));
}

#[test]
fn test_print_all_lists_aliases_and_lazy_types() {
    let factory = Factory::new();
    let a = TypeHandle::abstract_type("a");
    factory.register(&a);
    factory.set_inst_alias("drv", &a, "env.*");
    factory.register_lazy("late", || TypeHandle::abstract_type("late"));

    let text = factory.print(PrintDetail::All);
    assert!(text.contains("Aliases:"));
    assert!(text.contains("drv"));
    assert!(text.contains("Lazy types not yet constructed: late"));

    factory.find_wrapper_by_name("late").unwrap();
    let text = factory.print(PrintDetail::All);
    assert!(!text.contains("Lazy types not yet constructed"));
}

#[test]
fn test_unresolved_override_is_reported() {
    let factory = Factory::new();
    let events = collect(&factory);

    let a = TypeHandle::abstract_type("a");
    factory.register(&a);
    factory.set_type_override_by_name("a", "missing", true);
    events.lock().unwrap().clear();

    assert!(factory.create_object_by_type(&a, "", "x").is_none());
    let captured = events.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].kind, EventKind::UnresolvedOverride);
    assert_eq!(captured[0].severity, Severity::Error);
}

#[test]
#[should_panic(expected = "TYPE_NAME_MISMATCH")]
fn test_lazy_name_mismatch_panics() {
    let factory = Factory::new();
    factory.register_lazy("late", || TypeHandle::abstract_type("early"));
    let _ = factory.create_object_by_name("late", "", "x");
}

#[test]
fn test_lazy_name_mismatch_reported_under_report_policy() {
    let factory =
        Factory::with_config(FactoryConfig::default().with_fatal_policy(FatalPolicy::Report));
    let events = collect(&factory);
    factory.register_lazy("late", || TypeHandle::abstract_type("early"));

    assert_eq!(
        factory.find_wrapper_by_name("late"),
        Err(FactoryError::NameMismatch {
            requested: "late".into(),
            reported: "early".into(),
        })
    );
    let captured = events.lock().unwrap();
    assert_eq!(captured[0].severity, Severity::Fatal);
    assert_eq!(captured[0].kind, EventKind::NameMismatch);
}

#[test]
fn test_callback_runs_outside_factory_state() {
    let factory = Arc::new(Factory::new());
    let dumps = Arc::new(Mutex::new(Vec::new()));
    let (weak, dumps_clone) = (Arc::downgrade(&factory), dumps.clone());
    factory.set_report_callback(move |event| {
        if event.kind == EventKind::DuplicateRegistration {
            if let Some(factory) = weak.upgrade() {
                dumps_clone
                    .lock()
                    .unwrap()
                    .push(factory.print(PrintDetail::Types));
            }
        }
    });

    let a = TypeHandle::abstract_type("a");
    factory.register(&a);
    factory.register(&a);

    let dumps = dumps.lock().unwrap();
    assert_eq!(dumps.len(), 1);
    assert!(dumps[0].contains("Registered types: 1 named"));
}
