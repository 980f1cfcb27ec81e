//! Type restriction policy.
//!
//! A member result whose declared type is a base class or interface is
//! exposed through that declared type, even when the runtime object is more
//! derived. The exposed type decides which members the next bind sees.

use hostbind_core::{BindSettings, MetadataProvider, TypeHash, Value, primitives};

/// The view a result of `declared` type should carry.
///
/// Returns `None` when the runtime type is exposed unrestricted.
pub fn restrict(
    provider: &dyn MetadataProvider,
    declared: TypeHash,
    runtime: TypeHash,
    expose_runtime_type: bool,
    settings: &BindSettings,
    is_index_access: bool,
) -> Option<TypeHash> {
    if expose_runtime_type
        || settings.disable_type_restriction
        || (is_index_access && settings.disable_list_index_type_restriction)
    {
        return None;
    }
    if declared == primitives::OBJECT || declared == runtime {
        return None;
    }
    provider
        .is_assignable_to(runtime, declared)
        .then_some(declared)
}

/// Apply [`restrict`] to a result value.
///
/// Only object references carry a view; every other value is returned as is.
/// Arrays are restricted element by element when they are indexed.
pub fn restrict_value(
    provider: &dyn MetadataProvider,
    value: Value,
    declared: TypeHash,
    expose_runtime_type: bool,
    settings: &BindSettings,
    is_index_access: bool,
) -> Value {
    match value {
        Value::Object(obj) => {
            let view = restrict(
                provider,
                declared,
                obj.runtime_type(),
                expose_runtime_type,
                settings,
                is_index_access,
            );
            Value::Object(obj.with_view(view))
        }
        other => other,
    }
}
