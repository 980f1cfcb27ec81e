//! hostbind
//!
//! Dynamic member binding for script runtimes hosted on a nominal type
//! model. Register host types in a [`TypeRegistry`](hostbind_registry::TypeRegistry),
//! wrap it in an [`Engine`], and resolve member accesses coming from
//! dynamically typed script code:
//!
//! ```
//! use hostbind::prelude::*;
//!
//! let mut registry = TypeRegistry::with_primitives();
//! let counter = TypeBuilder::class("Counter")
//!     .field("Count", DataType::simple(primitives::INT32))
//!     .register(&mut registry)
//!     .unwrap();
//!
//! let engine = Engine::new(registry).unwrap();
//! let obj = Value::object(HostObject::new(counter));
//! engine.set_property(&obj, "Count", Value::Int8(3)).unwrap();
//! assert_eq!(engine.get_property(&obj, "Count").unwrap(), Value::Int32(3));
//! ```

pub mod engine;
pub mod error;

pub use engine::Engine;
pub use error::Result;

pub use hostbind_binder as binder;
pub use hostbind_core as core;
pub use hostbind_registry as registry;

// Re-export main types
pub mod prelude {
    pub use crate::engine::Engine;
    pub use hostbind_binder::{Binder, BoundAccessor, CacheStats, MemberDescriptor, Operation};
    pub use hostbind_core::{
        AccessContext, AccessDeniedReason, BindError, BindFlags, BindSettings, CallContext,
        DataType, EventConnection, EventSource, GenericConstraints, GenericParam, HostBindError,
        HostObject, MemberEntry, MemberKind, MetadataProvider, ModuleId, NativeError, NativeFn,
        Param, PrimitiveKind, RefModifier, RegistrationError, StructValue, TypeEntry, TypeHash,
        TypeKind, Value, ValueCell, Visibility, primitives,
    };
    pub use hostbind_registry::{TypeBuilder, TypeRegistry};
}
