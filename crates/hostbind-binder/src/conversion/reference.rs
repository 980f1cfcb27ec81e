//! Reference conversions.
//!
//! This module handles conversions that involve the reference hierarchy:
//! - Null to any reference, array or nullable type
//! - Anything to the `object` root
//! - Derived to base class, class to interface
//! - Array covariance for reference element types

use hostbind_core::{DataType, MetadataProvider, TypeHash, TypeKind, primitives};

use super::{Conversion, ConversionKind};

/// Null to a type that accepts it.
pub fn find_null_conversion(
    target: &DataType,
    provider: &dyn MetadataProvider,
) -> Option<Conversion> {
    let accepts_null = target.is_array
        || target.is_nullable
        || target.type_hash == primitives::OBJECT
        || provider.is_reference_type(target.type_hash);
    accepts_null.then(|| Conversion {
        kind: ConversionKind::NullToReference,
        cost: Conversion::COST_NULL,
        is_implicit: true,
    })
}

/// Any non-void value to the `object` root.
pub fn find_object_conversion(
    source: &DataType,
    target: &DataType,
    provider: &dyn MetadataProvider,
) -> Option<Conversion> {
    if target.type_hash != primitives::OBJECT || target.is_array || target.is_nullable {
        return None;
    }
    if source.is_void() {
        return None;
    }

    if source.is_array {
        return Some(reference_cast(primitives::OBJECT, 1));
    }
    if !source.is_nullable && provider.is_reference_type(source.type_hash) {
        let distance = provider
            .inheritance_distance(source.type_hash, primitives::OBJECT)
            .unwrap_or(1);
        return Some(reference_cast(primitives::OBJECT, distance));
    }
    Some(Conversion {
        kind: ConversionKind::Boxing,
        cost: Conversion::COST_BOXING,
        is_implicit: true,
    })
}

/// Array to array. Elements must match exactly unless both are reference
/// types, in which case derived-to-base element conversion is allowed.
pub fn find_array_conversion(
    source: &DataType,
    target: &DataType,
    provider: &dyn MetadataProvider,
) -> Option<Conversion> {
    if !(source.is_array && target.is_array) {
        return None;
    }
    let from = source.type_hash;
    let to = target.type_hash;
    if from == to {
        return Some(Conversion::identity());
    }
    if !provider.is_reference_type(from) {
        return None;
    }
    let distance = provider.inheritance_distance(from, to).or_else(|| {
        (to == primitives::OBJECT).then_some(1)
    })?;
    Some(reference_cast(to, distance))
}

/// Derived to base class or interface, and value type to an implemented
/// interface (boxing).
pub fn find_hierarchy_conversion(
    source: TypeHash,
    target: TypeHash,
    provider: &dyn MetadataProvider,
) -> Option<Conversion> {
    let source_kind = provider.type_kind(source)?;
    let target_kind = provider.type_kind(target)?;
    if !matches!(target_kind, TypeKind::Class | TypeKind::Interface) {
        return None;
    }

    let distance = provider.inheritance_distance(source, target)?;
    if source_kind.is_reference_type() {
        Some(reference_cast(target, distance))
    } else {
        Some(Conversion {
            kind: ConversionKind::Boxing,
            cost: Conversion::COST_BOXING,
            is_implicit: true,
        })
    }
}

fn reference_cast(target: TypeHash, distance: u32) -> Conversion {
    Conversion {
        kind: ConversionKind::ReferenceCast { target },
        cost: Conversion::COST_REFERENCE_CAST + distance.min(Conversion::MAX_CAST_DISTANCE),
        is_implicit: true,
    }
}
