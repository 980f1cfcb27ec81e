//! hostbind core types
//!
//! Shared vocabulary for the hostbind member binder: type identity, the
//! runtime value model, host type metadata, settings and errors.
//!
//! ## Modules
//!
//! - [`type_hash`]: Deterministic hashes for types, members and modules
//! - [`data_type`]: Type references with array/nullable/ref modifiers
//! - [`value`]: Script-side values, host objects, arrays and ref cells
//! - [`native_fn`]: Host callables and their call context
//! - [`event`]: Event sources and connections
//! - [`entries`]: Type and member metadata records
//! - [`metadata`]: The `MetadataProvider` trait the binder consumes
//! - [`settings`]: Access context and per-bind settings
//! - [`error`]: Error types split by phase

pub mod data_type;
pub mod entries;
pub mod error;
pub mod event;
pub mod flags;
pub mod ids;
pub mod metadata;
pub mod native_fn;
pub mod primitive_kind;
pub mod settings;
pub mod type_hash;
pub mod value;
pub mod visibility;

pub use data_type::{DataType, RefModifier};
pub use entries::{
    EnumValue, GenericConstraints, GenericParam, MemberEntry, MemberImpl, MemberKind, Param,
    TypeEntry, TypeKind,
};
pub use error::{AccessDeniedReason, BindError, HostBindError, NativeError, RegistrationError};
pub use event::{EventConnection, EventSource};
pub use flags::BindFlags;
pub use ids::ModuleId;
pub use metadata::MetadataProvider;
pub use native_fn::{CallContext, NativeCallable, NativeFn};
pub use primitive_kind::PrimitiveKind;
pub use settings::{AccessContext, BindSettings};
pub use type_hash::{TypeHash, hash_constants, primitives};
pub use value::{ArrayRef, HostObject, ObjectRef, StructValue, Value, ValueCell};
pub use visibility::Visibility;
