//! The factory service.
//!
//! A [`Factory`] is a monitor over its tables: every public operation holds one
//! re-entrant lock for its whole duration. Constructors run while the lock is
//! held, so a constructor that creates its own children through the same
//! factory simply re-enters on the same thread. Lazy constructors run the same
//! way, before the operation that needs their name touches the tables.
//!
//! # Examples
//!
//! ```
//! use factory_registry::{Factory, TypeHandle};
//!
//! let factory = Factory::new();
//! let driver = TypeHandle::abstract_type("driver");
//! let fast_driver = TypeHandle::abstract_type("fast_driver");
//! let slow_driver = TypeHandle::abstract_type("slow_driver");
//!
//! factory.set_inst_override_by_type(&driver, &fast_driver, "env.agent0.*");
//! factory.set_type_override_by_type(&driver, &slow_driver, true);
//!
//! assert_eq!(factory.find_override_by_type(&driver, "env.agent0.driver0"), Some(fast_driver));
//! assert_eq!(factory.find_override_by_type(&driver, "env.agent1.driver0"), Some(slow_driver));
//! ```

use std::cell::RefCell;
use std::sync::{Arc, LazyLock};

use parking_lot::{Mutex, ReentrantMutex};

use crate::override_table::OverrideRecord;
use crate::resolver::Resolution;
use crate::state::FactoryState;
use crate::{
    Component, EventKind, FactoryConfig, FactoryError, FactoryEvent, FatalPolicy, Object,
    PrintDetail, ReportCallback, Severity, TypeHandle,
};

/// Default process-wide factory.
static GLOBAL_FACTORY: LazyLock<Factory> = LazyLock::new(Factory::new);

pub struct Factory {
    state: ReentrantMutex<RefCell<FactoryState>>,
    report_callback: Mutex<Option<Arc<ReportCallback>>>,
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}

impl Factory {
    pub fn new() -> Self {
        Self::with_config(FactoryConfig::default())
    }

    pub fn with_config(config: FactoryConfig) -> Self {
        Self {
            state: ReentrantMutex::new(RefCell::new(FactoryState::new(config))),
            report_callback: Mutex::new(None),
        }
    }

    /// The single default instance, created on first use.
    ///
    /// Prefer handing `&Factory` to the code that needs it over calling this
    /// from deep inside a component tree.
    pub fn global() -> &'static Factory {
        &GLOBAL_FACTORY
    }

    pub fn config(&self) -> FactoryConfig {
        let guard = self.state.lock();
        let config = guard.borrow().config.clone();
        config
    }

    // ---------------------------------------------------------------------------------------------
    // Reporting
    // ---------------------------------------------------------------------------------------------

    /// Set a callback receiving every event this factory reports.
    ///
    /// The callback runs after the factory state is released, so it may use
    /// the factory again. Events are logged through `tracing` either way.
    pub fn set_report_callback(&self, callback: impl Fn(&FactoryEvent) + Send + Sync + 'static) {
        *self.report_callback.lock() = Some(Arc::new(callback));
    }

    pub fn clear_report_callback(&self) {
        *self.report_callback.lock() = None;
    }

    fn dispatch(&self, events: Vec<FactoryEvent>, policy: FatalPolicy) {
        if events.is_empty() {
            return;
        }
        // Cloned out so the callback may replace itself.
        let callback = self.report_callback.lock().clone();
        let mut fatal = None;
        for event in events {
            event.log();
            if let Some(callback) = &callback {
                callback(&event);
            }
            if event.severity == Severity::Fatal && fatal.is_none() {
                fatal = Some(event);
            }
        }
        if let (Some(event), FatalPolicy::Panic) = (fatal, policy) {
            panic!("factory fatal error: {event}");
        }
    }

    /// Run `f` on the locked state, then hand out the events it raised.
    fn with_state<R>(&self, f: impl FnOnce(&mut FactoryState) -> R) -> R {
        let guard = self.state.lock();
        let (result, events, policy) = {
            let mut state = guard.borrow_mut();
            let result = f(&mut state);
            (result, state.take_events(), state.config.fatal_policy)
        };
        self.dispatch(events, policy);
        result
    }

    fn report(&self, event: FactoryEvent) {
        self.with_state(|state| state.report(event));
    }

    /// Run the lazy constructor still pending for `name`, outside the state borrow.
    fn realize_lazy(&self, name: &str) -> Result<(), FactoryError> {
        let _guard = self.state.lock();
        let Some(ctor) = self.with_state(|state| state.take_pending_lazy(name)) else {
            return Ok(());
        };
        let handle = ctor();
        self.with_state(|state| state.finish_lazy(name, handle)).map(|_| ())
    }

    /// Realize `names` and every pending lazy name an override chain may reach.
    ///
    /// Failures were already reported; the lookups that follow simply miss.
    fn realize_for_lookup(&self, names: &[&str]) {
        let _guard = self.state.lock();
        for name in names {
            let _ = self.realize_lazy(name);
        }
        for name in self.with_state(|state| state.lazy_replacements()) {
            let _ = self.realize_lazy(&name);
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------------------------------

    /// Register a type. Registering the same handle again only warns.
    pub fn register(&self, handle: &TypeHandle) {
        self.with_state(|state| state.register(handle));
    }

    /// Register a constructor run the first time `name` is looked up.
    ///
    /// The handle it returns must carry `name`, otherwise the lookup is a fatal
    /// error. The constructor may use the factory, for instance to register the
    /// handle it builds. A lazy name an override refers to is realized before the
    /// next resolution.
    pub fn register_lazy(
        &self,
        name: &str,
        ctor: impl Fn() -> TypeHandle + Send + Sync + 'static,
    ) {
        self.with_state(|state| state.register_lazy(name, Arc::new(ctor)));
    }

    pub fn is_type_registered(&self, handle: &TypeHandle) -> bool {
        self.with_state(|state| state.types.contains(handle))
    }

    /// Whether `name` is a registered type name or a global alias.
    pub fn is_type_name_registered(&self, name: &str) -> bool {
        self.with_state(|state| state.is_type_name_registered(name))
    }

    // ---------------------------------------------------------------------------------------------
    // Overrides and aliases
    // ---------------------------------------------------------------------------------------------

    /// Override `original` with `replacement` wherever it is created.
    ///
    /// With `replace` unset an existing override of `original` is kept.
    pub fn set_type_override_by_type(
        &self,
        original: &TypeHandle,
        replacement: &TypeHandle,
        replace: bool,
    ) {
        self.with_state(|state| state.set_type_override_by_type(original, replacement, replace));
    }

    pub fn set_type_override_by_name(&self, original: &str, replacement: &str, replace: bool) {
        let _guard = self.state.lock();
        self.realize_for_lookup(&[original, replacement]);
        self.with_state(|state| state.set_type_override_by_name(original, replacement, replace));
    }

    /// Override `original` with `replacement` for instance paths matching `pattern`.
    ///
    /// Instance overrides are matched in the order they were set: register the
    /// more specific paths first.
    pub fn set_inst_override_by_type(
        &self,
        original: &TypeHandle,
        replacement: &TypeHandle,
        pattern: &str,
    ) {
        self.with_state(|state| state.set_inst_override_by_type(original, replacement, pattern));
    }

    pub fn set_inst_override_by_name(&self, original: &str, replacement: &str, pattern: &str) {
        let _guard = self.state.lock();
        self.realize_for_lookup(&[original, replacement]);
        self.with_state(|state| state.set_inst_override_by_name(original, replacement, pattern));
    }

    pub fn set_type_alias(&self, alias: &str, target: &TypeHandle) {
        self.with_state(|state| state.set_type_alias(alias, target));
    }

    pub fn set_inst_alias(&self, alias: &str, target: &TypeHandle, pattern: &str) {
        self.with_state(|state| state.set_inst_alias(alias, target, pattern));
    }

    // ---------------------------------------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------------------------------------

    /// The type that would be created for `requested` at `path`.
    ///
    /// Without any applicable override this is `requested` itself; `None` only
    /// when an override chain ends on an unregistered name. A loop is reported
    /// once; with [`FactoryConfig::debug_on_loop`] its trace follows as an
    /// [`EventKind::OverrideTrace`] event.
    pub fn find_override_by_type(&self, requested: &TypeHandle, path: &str) -> Option<TypeHandle> {
        let _guard = self.state.lock();
        self.realize_for_lookup(&[]);
        let mut resolution = Resolution::default();
        let found =
            self.with_state(|state| state.find_override_by_type(requested, path, &mut resolution));
        if resolution.loop_detected() {
            self.trace_loop(|state| state.replay_by_type(requested, path));
        }
        found
    }

    /// The override applying to `name` at `path`, or `None` when no override
    /// applies. Use [`Factory::find_wrapper_by_name`] for the plain type.
    pub fn find_override_by_name(&self, name: &str, path: &str) -> Option<TypeHandle> {
        let _guard = self.state.lock();
        self.realize_for_lookup(&[name]);
        let mut resolution = Resolution::default();
        let found =
            self.with_state(|state| state.find_override_by_name(name, path, &mut resolution));
        if resolution.loop_detected() {
            self.trace_loop(|state| state.replay_by_name(name, path));
        }
        found
    }

    /// Look up `name` without applying overrides, constructing it lazily if needed.
    ///
    /// # Errors
    ///
    /// [`FactoryError::NotRegistered`] for an unknown name and
    /// [`FactoryError::NameMismatch`] when a lazy constructor misbehaves.
    pub fn find_wrapper_by_name(&self, name: &str) -> Result<TypeHandle, FactoryError> {
        let _guard = self.state.lock();
        self.realize_lazy(name)?;
        self.with_state(|state| state.lookup_name(name, ""))
    }

    fn trace_loop(&self, trace: impl FnOnce(&mut FactoryState) -> String) {
        self.with_state(|state| {
            if state.config.debug_on_loop {
                let text = trace(state);
                state.report(FactoryEvent::info(EventKind::OverrideTrace, text));
            }
        });
    }

    // ---------------------------------------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------------------------------------

    pub fn create_object_by_type(
        &self,
        requested: &TypeHandle,
        parent_inst_path: &str,
        name: &str,
    ) -> Option<Box<dyn Object>> {
        let _guard = self.state.lock();
        let path = compose_inst_path(parent_inst_path, name);
        let handle = self.find_override_by_type(requested, &path)?;
        self.build_object(&handle, name)
    }

    pub fn create_object_by_name(
        &self,
        requested: &str,
        parent_inst_path: &str,
        name: &str,
    ) -> Option<Box<dyn Object>> {
        let _guard = self.state.lock();
        let path = compose_inst_path(parent_inst_path, name);
        let handle = self.resolve_for_create(requested, &path)?;
        self.build_object(&handle, name)
    }

    pub fn create_component_by_type(
        &self,
        requested: &TypeHandle,
        parent_inst_path: &str,
        name: &str,
        parent: Option<&dyn Component>,
    ) -> Option<Box<dyn Component>> {
        let _guard = self.state.lock();
        let path = compose_inst_path(parent_inst_path, name);
        let handle = self.find_override_by_type(requested, &path)?;
        self.build_component(&handle, name, parent)
    }

    pub fn create_component_by_name(
        &self,
        requested: &str,
        parent_inst_path: &str,
        name: &str,
        parent: Option<&dyn Component>,
    ) -> Option<Box<dyn Component>> {
        let _guard = self.state.lock();
        let path = compose_inst_path(parent_inst_path, name);
        let handle = self.resolve_for_create(requested, &path)?;
        self.build_component(&handle, name, parent)
    }

    /// By-name resolution falling back to the plain registered type.
    fn resolve_for_create(&self, requested: &str, path: &str) -> Option<TypeHandle> {
        if let Some(found) = self.find_override_by_name(requested, path) {
            return Some(found);
        }
        self.with_state(|state| match state.lookup_name(requested, path) {
            Ok(handle) => Some(handle),
            Err(FactoryError::NotRegistered { .. }) => {
                state.report(FactoryEvent::warning(
                    EventKind::UnregisteredType,
                    format!("cannot create an instance of '{requested}': the type is not registered"),
                ));
                None
            }
            Err(_) => None,
        })
    }

    fn build_object(&self, handle: &TypeHandle, name: &str) -> Option<Box<dyn Object>> {
        let object = handle.create_object(name);
        if object.is_none() {
            self.report(FactoryEvent::error(
                EventKind::CreateFailed,
                format!("type '{handle}' cannot be created as an object (instance '{name}')"),
            ));
        }
        object
    }

    fn build_component(
        &self,
        handle: &TypeHandle,
        name: &str,
        parent: Option<&dyn Component>,
    ) -> Option<Box<dyn Component>> {
        let component = handle.create_component(name, parent);
        if component.is_none() {
            self.report(FactoryEvent::error(
                EventKind::CreateFailed,
                format!("type '{handle}' cannot be created as a component (instance '{name}')"),
            ));
        }
        component
    }

    // ---------------------------------------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------------------------------------

    /// Report which overrides a creation request would consider and which type wins.
    ///
    /// The report is emitted as an [`EventKind::OverrideTrace`] event and returned.
    pub fn debug_create_by_type(
        &self,
        requested: &TypeHandle,
        parent_inst_path: &str,
        name: &str,
    ) -> String {
        let _guard = self.state.lock();
        self.realize_for_lookup(&[]);
        let path = compose_inst_path(parent_inst_path, name);
        self.with_state(|state| {
            let text = state.trace_by_type(requested, &path);
            state.report(FactoryEvent::info(EventKind::OverrideTrace, text.clone()));
            text
        })
    }

    pub fn debug_create_by_name(&self, requested: &str, parent_inst_path: &str, name: &str) -> String {
        let _guard = self.state.lock();
        self.realize_for_lookup(&[requested]);
        let path = compose_inst_path(parent_inst_path, name);
        self.with_state(|state| {
            let text = state.trace_by_name(requested, &path);
            state.report(FactoryEvent::info(EventKind::OverrideTrace, text.clone()));
            text
        })
    }

    /// Dump the registered types and override tables.
    ///
    /// Emitted as an [`EventKind::FactoryDump`] event and returned.
    pub fn print(&self, detail: PrintDetail) -> String {
        self.with_state(|state| {
            let text = state.dump(detail);
            state.report(FactoryEvent::info(EventKind::FactoryDump, text.clone()));
            text
        })
    }

    /// Snapshot of the type overrides, highest precedence first.
    pub fn type_overrides(&self) -> Vec<OverrideRecord> {
        self.with_state(|state| state.overrides.type_overrides().to_vec())
    }

    /// Snapshot of the instance overrides, in match order.
    pub fn inst_overrides(&self) -> Vec<OverrideRecord> {
        self.with_state(|state| state.overrides.inst_overrides().to_vec())
    }
}

/// Instance path of `name` under `parent_inst_path`.
pub fn compose_inst_path(parent_inst_path: &str, name: &str) -> String {
    match (parent_inst_path.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => parent_inst_path.to_string(),
        (false, false) => format!("{parent_inst_path}.{name}"),
    }
}
