//! Override walkthrough for factory-registry.
//!
//! Demonstrates:
//! - Registering component types that build their own children
//! - Type overrides, instance overrides and override chains
//! - Reading an override trace and a factory dump
//! - Watching reports through the report callback
//!
//! Run with: `cargo run --example override_walkthrough`

use factory_registry::{define_factory, Component, Object, PrintDetail, TypeHandle};
use std::any::Any;

// Create an isolated factory for this demo
define_factory!(tb);

/// A testbench component that only remembers where it sits.
struct Unit {
    name: String,
    kind: &'static str,
    path: String,
    children: Vec<Box<dyn Component>>,
}

impl Object for Unit {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &str {
        self.kind
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Component for Unit {
    fn full_name(&self) -> String {
        self.path.clone()
    }
}

fn unit_type(kind: &'static str, children: &'static [(&'static str, &'static str)]) -> TypeHandle {
    TypeHandle::component(kind, move |name, parent| {
        let path = match parent {
            Some(parent) => format!("{}.{name}", parent.full_name()),
            None => name.to_string(),
        };
        let mut unit = Unit {
            name: name.to_string(),
            kind,
            path,
            children: Vec::new(),
        };
        for (child_kind, child_name) in children {
            let created =
                tb::factory().create_component_by_name(child_kind, &unit.path, child_name, Some(&unit));
            unit.children.extend(created);
        }
        Box::new(unit)
    })
}

fn show(component: &dyn Component, depth: usize) {
    println!(
        "   {}{} ({})",
        "  ".repeat(depth),
        component.full_name(),
        component.type_name()
    );
    if let Some(unit) = component.as_any().downcast_ref::<Unit>() {
        for child in &unit.children {
            show(child.as_ref(), depth + 1);
        }
    }
}

fn main() {
    println!("=== factory-registry: Override Walkthrough ===\n");

    tb::set_report_callback(|event| println!("   report: {event}"));

    // -------------------------------------------------------------------------
    // 1. Register the testbench types
    // -------------------------------------------------------------------------
    println!("1. Registering types...");

    let env = unit_type("env", &[("agent", "agent0"), ("agent", "agent1")]);
    let agent = unit_type("agent", &[("driver", "driver"), ("monitor", "monitor")]);
    let driver = unit_type("driver", &[]);
    let monitor = unit_type("monitor", &[]);
    let error_driver = unit_type("error_driver", &[]);
    let slow_driver = unit_type("slow_driver", &[]);
    let coverage_monitor = unit_type("coverage_monitor", &[]);

    for handle in [
        &env,
        &agent,
        &driver,
        &monitor,
        &error_driver,
        &slow_driver,
        &coverage_monitor,
    ] {
        tb::register(handle);
    }

    println!("   Registered 7 types");

    // -------------------------------------------------------------------------
    // 2. Build without overrides
    // -------------------------------------------------------------------------
    println!("\n2. Building the default testbench...");

    if let Some(top) = tb::factory().create_component_by_type(&env, "", "top", None) {
        show(top.as_ref(), 0);
    }

    // -------------------------------------------------------------------------
    // 3. Override types and instances
    // -------------------------------------------------------------------------
    println!("\n3. Setting overrides...");

    tb::set_type_override("monitor", "coverage_monitor");
    tb::set_inst_override("driver", "error_driver", "top.agent1.*");
    tb::set_type_override("error_driver", "slow_driver");

    println!("   monitor -> coverage_monitor everywhere");
    println!("   driver -> error_driver under top.agent1, chained to slow_driver");

    if let Some(top) = tb::factory().create_component_by_type(&env, "", "top", None) {
        show(top.as_ref(), 0);
    }

    // -------------------------------------------------------------------------
    // 4. Ask the factory why
    // -------------------------------------------------------------------------
    println!("\n4. Tracing one request...\n");

    tb::clear_report_callback();
    println!("{}", tb::factory().debug_create_by_name("driver", "top.agent1", "driver"));

    // -------------------------------------------------------------------------
    // 5. Dump the tables
    // -------------------------------------------------------------------------
    println!("\n5. Dumping the factory...\n");

    println!("{}", tb::factory().print(PrintDetail::All));

    // -------------------------------------------------------------------------
    // 6. A loop is reported and resolution stops
    // -------------------------------------------------------------------------
    println!("\n6. Closing an override loop...");

    tb::set_report_callback(|event| println!("   report: {}", event.tag()));
    tb::set_type_override("slow_driver", "error_driver");
    let found = tb::find_override_by_type(&error_driver, "");
    println!(
        "   error_driver resolves to {}",
        found.as_ref().map_or("nothing", TypeHandle::display_name)
    );

    println!("\n=== Done ===");
}
