//! # Factory Registry
//!
//! A thread-safe creation registry: code asks the factory for an instance of a
//! type at a hierarchical instance path, and the factory decides which concrete
//! type to build. Users substitute types without touching the code that
//! creates them.
//!
//! ## Quick Start
//!
//! ```rust
//! use factory_registry::{Factory, Object, TypeHandle};
//! use std::any::Any;
//!
//! struct Driver {
//!     name: String,
//!     kind: &'static str,
//! }
//!
//! impl Object for Driver {
//!     fn name(&self) -> &str {
//!         &self.name
//!     }
//!     fn type_name(&self) -> &str {
//!         self.kind
//!     }
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//!
//! fn driver_type(kind: &'static str) -> TypeHandle {
//!     TypeHandle::object(kind, move |name| {
//!         Box::new(Driver { name: name.to_string(), kind })
//!     })
//! }
//!
//! let factory = Factory::new();
//! let driver = driver_type("driver");
//! let error_driver = driver_type("error_driver");
//! factory.register(&driver);
//! factory.register(&error_driver);
//!
//! // Only the driver under agent1 injects errors.
//! factory.set_inst_override_by_name("driver", "error_driver", "env.agent1.*");
//!
//! let d0 = factory.create_object_by_type(&driver, "env.agent0", "drv").unwrap();
//! let d1 = factory.create_object_by_type(&driver, "env.agent1", "drv").unwrap();
//! assert_eq!(d0.type_name(), "driver");
//! assert_eq!(d1.type_name(), "error_driver");
//! ```
//!
//! ## Features
//!
//! - **Type overrides**: replace a type everywhere it is created
//! - **Instance overrides**: replace a type only under instance paths matching a glob
//! - **Chaining and loop detection**: overrides of overrides resolve transitively;
//!   a cycle is reported and resolution stops
//! - **Aliases**: extra lookup names, optionally valid only under a path pattern
//! - **Diagnostics**: per-request override traces and table dumps
//! - **Reporting**: every event is logged with `tracing` and handed to an
//!   optional callback
//!
//! ## Main Items
//!
//! - [`Factory`] - the registry and its operations
//! - [`TypeHandle`] - a creatable type and its constructors
//! - [`define_factory!`] - a module wrapping its own process-wide factory
//! - [`FactoryEvent`] - what the factory reports

mod alias_table;
mod config;
mod debug_tracer;
mod factory;
mod factory_error;
mod factory_event;
mod macros;
mod override_table;
mod resolver;
mod scope_pattern;
mod state;
mod type_handle;
mod type_registry;

pub use config::{FactoryConfig, FatalPolicy};
pub use debug_tracer::PrintDetail;
pub use factory::{compose_inst_path, Factory};
pub use factory_error::FactoryError;
pub use factory_event::{EventKind, FactoryEvent, ReportCallback, Severity};
pub use override_table::{OverrideId, OverrideRecord, TypePair};
pub use scope_pattern::ScopePattern;
pub use type_handle::{Component, ComponentCtor, Object, ObjectCtor, TypeHandle, UNKNOWN_TYPE_NAME};
pub use type_registry::LazyCtor;
