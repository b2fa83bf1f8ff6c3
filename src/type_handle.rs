//! Type handles: the identity and construction capability of a creatable type.
//!
//! A [`TypeHandle`] is what the factory registers, overrides and finally returns
//! from resolution. Two handles are equal only when they are the same handle;
//! the type name is a secondary lookup key and may be shared, empty, or the
//! [`UNKNOWN_TYPE_NAME`] sentinel.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Name reported for types registered without a usable name.
pub const UNKNOWN_TYPE_NAME: &str = "<unknown>";

/// An object produced by a [`TypeHandle`].
pub trait Object: Any + Send {
    /// Instance name given at creation.
    fn name(&self) -> &str;

    /// Name of the type that produced this object.
    fn type_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

/// A hierarchical object: it knows where it sits under its parent.
pub trait Component: Object {
    /// Dotted instance path of this component.
    fn full_name(&self) -> String;
}

/// Constructor for plain objects, given the instance name.
pub type ObjectCtor = dyn Fn(&str) -> Box<dyn Object> + Send + Sync + 'static;

/// Constructor for components, given the instance name and the parent.
pub type ComponentCtor =
    dyn Fn(&str, Option<&dyn Component>) -> Box<dyn Component> + Send + Sync + 'static;

struct Inner {
    name: String,
    object: Option<Box<ObjectCtor>>,
    component: Option<Box<ComponentCtor>>,
}

/// Cheaply clonable identity of a creatable type.
///
/// # Examples
///
/// ```rust
/// use factory_registry::{Object, TypeHandle};
/// use std::any::Any;
///
/// struct Packet(String);
///
/// impl Object for Packet {
///     fn name(&self) -> &str { &self.0 }
///     fn type_name(&self) -> &str { "packet" }
///     fn as_any(&self) -> &dyn Any { self }
/// }
///
/// let packet = TypeHandle::object("packet", |name| Box::new(Packet(name.to_string())));
/// let created = packet.create_object("pkt0").unwrap();
/// assert_eq!(created.name(), "pkt0");
/// assert_ne!(packet, TypeHandle::object("packet", |name| Box::new(Packet(name.to_string()))));
/// ```
#[derive(Clone)]
pub struct TypeHandle(Arc<Inner>);

impl TypeHandle {
    /// A type that can only be created as a plain object.
    pub fn object(
        name: impl Into<String>,
        ctor: impl Fn(&str) -> Box<dyn Object> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(Inner {
            name: name.into(),
            object: Some(Box::new(ctor)),
            component: None,
        }))
    }

    /// A type that can only be created as a component.
    pub fn component(
        name: impl Into<String>,
        ctor: impl Fn(&str, Option<&dyn Component>) -> Box<dyn Component> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(Inner {
            name: name.into(),
            object: None,
            component: Some(Box::new(ctor)),
        }))
    }

    /// A type that takes part in resolution but cannot be constructed itself.
    ///
    /// Useful for base types that are always expected to be overridden.
    pub fn abstract_type(name: impl Into<String>) -> Self {
        Self(Arc::new(Inner {
            name: name.into(),
            object: None,
            component: None,
        }))
    }

    pub fn type_name(&self) -> &str {
        &self.0.name
    }

    /// The name used in reports: the type name, or [`UNKNOWN_TYPE_NAME`] when empty.
    pub fn display_name(&self) -> &str {
        if self.0.name.is_empty() {
            UNKNOWN_TYPE_NAME
        } else {
            &self.0.name
        }
    }

    /// Whether the name can be used as a lookup key.
    pub(crate) fn has_lookup_name(&self) -> bool {
        !self.0.name.is_empty() && self.0.name != UNKNOWN_TYPE_NAME
    }

    pub fn can_create_object(&self) -> bool {
        self.0.object.is_some()
    }

    pub fn can_create_component(&self) -> bool {
        self.0.component.is_some()
    }

    /// Build a plain object, or `None` if this type has no object constructor.
    pub fn create_object(&self, name: &str) -> Option<Box<dyn Object>> {
        self.0.object.as_ref().map(|ctor| ctor(name))
    }

    /// Build a component, or `None` if this type has no component constructor.
    pub fn create_component(
        &self,
        name: &str,
        parent: Option<&dyn Component>,
    ) -> Option<Box<dyn Component>> {
        self.0.component.as_ref().map(|ctor| ctor(name, parent))
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandle")
            .field("name", &self.display_name())
            .field("object", &self.can_create_object())
            .field("component", &self.can_create_component())
            .finish()
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
