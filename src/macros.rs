//! Macros for declaring named factories.

/// Declares a module holding its own process-wide [`Factory`](crate::Factory).
///
/// The generated module contains the hidden factory static, a `factory()`
/// accessor for the full API, and free functions for the common calls.
///
/// # Examples
///
/// ```rust
/// use factory_registry::{define_factory, TypeHandle};
///
/// define_factory!(testbench);
///
/// let monitor = TypeHandle::abstract_type("monitor");
/// let verbose_monitor = TypeHandle::abstract_type("verbose_monitor");
///
/// testbench::register(&monitor);
/// testbench::register(&verbose_monitor);
/// testbench::set_inst_override("monitor", "verbose_monitor", "tb.env.*");
///
/// assert_eq!(
///     testbench::find_override_by_type(&monitor, "tb.env.mon"),
///     Some(verbose_monitor)
/// );
/// assert_eq!(testbench::find_override_by_type(&monitor, "tb.mon"), Some(monitor));
/// ```
///
/// # Multiple Factories
///
/// Each invocation owns separate tables:
///
/// ```rust
/// use factory_registry::{define_factory, TypeHandle};
///
/// define_factory!(block_a);
/// define_factory!(block_b);
///
/// let driver = TypeHandle::abstract_type("driver");
/// block_a::register(&driver);
///
/// assert!(block_a::factory().is_type_name_registered("driver"));
/// assert!(!block_b::factory().is_type_name_registered("driver"));
/// ```
#[macro_export]
macro_rules! define_factory {
    ($name:ident) => {
        pub mod $name {
            use std::sync::LazyLock;

            static FACTORY: LazyLock<$crate::Factory> = LazyLock::new($crate::Factory::new);

            /// The factory behind this module.
            pub fn factory() -> &'static $crate::Factory {
                &FACTORY
            }

            pub fn register(handle: &$crate::TypeHandle) {
                FACTORY.register(handle)
            }

            /// Override by type name, replacing any earlier override of `original`.
            pub fn set_type_override(original: &str, replacement: &str) {
                FACTORY.set_type_override_by_name(original, replacement, true)
            }

            pub fn set_inst_override(original: &str, replacement: &str, pattern: &str) {
                FACTORY.set_inst_override_by_name(original, replacement, pattern)
            }

            pub fn find_override_by_type(
                requested: &$crate::TypeHandle,
                path: &str,
            ) -> Option<$crate::TypeHandle> {
                FACTORY.find_override_by_type(requested, path)
            }

            pub fn find_override_by_name(name: &str, path: &str) -> Option<$crate::TypeHandle> {
                FACTORY.find_override_by_name(name, path)
            }

            pub fn create_object_by_name(
                requested: &str,
                parent_inst_path: &str,
                name: &str,
            ) -> Option<Box<dyn $crate::Object>> {
                FACTORY.create_object_by_name(requested, parent_inst_path, name)
            }

            pub fn set_report_callback(
                callback: impl Fn(&$crate::FactoryEvent) + Send + Sync + 'static,
            ) {
                FACTORY.set_report_callback(callback)
            }

            pub fn clear_report_callback() {
                FACTORY.clear_report_callback()
            }
        }
    };
}
