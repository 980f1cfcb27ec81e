//! Shape-level type conversions.
//!
//! This module decides whether an argument of one runtime type shape can be
//! passed to a parameter of another, and at what cost. It drives overload
//! ranking; the value-level work (range checks, boxing, write-back) happens in
//! [`crate::coercion`].
//!
//! ## Lookup order
//!
//! The first rule that applies wins: same type, `null`, the `object` root,
//! nullable wrapping, enums, primitive numerics, the reference hierarchy and
//! finally a host `op_Implicit` operator.

use hostbind_core::{DataType, MetadataProvider, TypeHash};

mod primitive;
mod reference;
mod user_defined;

pub use primitive::find_primitive_conversion;
pub use reference::{
    find_array_conversion, find_hierarchy_conversion, find_null_conversion, find_object_conversion,
};
pub use user_defined::{IMPLICIT_OPERATOR, find_user_conversion};

/// How an argument reaches a parameter type, and what that costs a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Conversion {
    pub kind: ConversionKind,
    /// Lower is better. Summed across arguments during ranking.
    pub cost: u32,
    /// Whether the conversion never loses information.
    pub is_implicit: bool,
}

/// Which rule produced a [`Conversion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    /// Argument already has the parameter type.
    Identity,

    /// Null to a reference, array or nullable type.
    NullToReference,

    /// Value to the nullable form of its type.
    NullableWrap,

    /// Between two numeric primitives.
    Primitive { from: TypeHash, to: TypeHash },

    /// Enum to a numeric type through its underlying value.
    EnumToNumber,

    /// Number to enum. Only zero survives coercion.
    NumberToEnum { enum_type: TypeHash },

    /// Derived reference to base class or interface.
    ReferenceCast { target: TypeHash },

    /// Value type to `object` or to an interface it implements.
    Boxing,

    /// Static `op_Implicit` method on the source or target type.
    UserImplicit {
        declaring_type: TypeHash,
        method: TypeHash,
    },
}

impl Conversion {
    // Everything lossless sits below the user operators, and everything that
    // needs a range check at coercion time sits above them.
    pub const COST_EXACT: u32 = 0;
    pub const COST_NULL: u32 = 1;
    pub const COST_NULLABLE_WRAP: u32 = 1;
    /// Enum to an integer of its underlying width.
    pub const COST_ENUM_SAME_SIZE: u32 = 2;
    pub const COST_ENUM_DIFF_SIZE: u32 = 3;
    /// `int8 -> int`, `float -> double` and the like.
    pub const COST_PRIMITIVE_WIDENING: u32 = 4;
    pub const COST_INT_TO_FLOAT: u32 = 5;
    /// Derived to base; the inheritance distance is added on top.
    pub const COST_REFERENCE_CAST: u32 = 10;
    pub const MAX_CAST_DISTANCE: u32 = 9;
    pub const COST_BOXING: u32 = 20;
    pub const COST_USER_IMPLICIT: u32 = 30;
    /// `int -> int8`, `double -> float` and the like.
    pub const COST_PRIMITIVE_NARROWING: u32 = 40;
    pub const COST_SIGNED_TO_UNSIGNED: u32 = 41;
    pub const COST_UNSIGNED_TO_SIGNED: u32 = 42;
    pub const COST_FLOAT_TO_INT: u32 = 43;
    /// Only a zero survives coercion.
    pub const COST_NUMBER_TO_ENUM: u32 = 44;

    pub fn identity() -> Self {
        Self {
            kind: ConversionKind::Identity,
            cost: Self::COST_EXACT,
            is_implicit: true,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self.kind, ConversionKind::Identity)
    }

    /// Whether the conversion never loses information.
    pub fn is_implicit(&self) -> bool {
        self.is_implicit
    }
}

/// Find the cheapest conversion from `source` to `target`.
///
/// Reference modifiers are ignored; the caller pairs by-ref arguments with
/// by-ref parameters before asking. Returns `None` when no conversion exists.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn find_conversion(
    source: &DataType,
    target: &DataType,
    provider: &dyn MetadataProvider,
) -> Option<Conversion> {
    let source = source.without_ref();
    let target = target.without_ref();

    if source == target {
        return Some(Conversion::identity());
    }

    if source.type_hash == hostbind_core::primitives::NULL && !source.is_array {
        return find_null_conversion(&target, provider);
    }

    if let Some(conv) = find_object_conversion(&source, &target, provider) {
        return Some(conv);
    }

    if source.is_array || target.is_array {
        return find_array_conversion(&source, &target, provider);
    }

    if target.is_nullable {
        if source.is_nullable {
            return None;
        }
        let inner = find_conversion(&source, &DataType::simple(target.type_hash), provider)?;
        if !inner.is_implicit {
            return None;
        }
        return Some(Conversion {
            kind: ConversionKind::NullableWrap,
            cost: inner.cost + Conversion::COST_NULLABLE_WRAP,
            is_implicit: true,
        });
    }

    if source.is_nullable {
        return None;
    }

    if let Some(conv) = find_enum_conversion(source.type_hash, target.type_hash, provider) {
        return Some(conv);
    }

    if let Some(conv) = find_primitive_conversion(source.type_hash, target.type_hash) {
        return Some(conv);
    }

    if let Some(conv) = find_hierarchy_conversion(source.type_hash, target.type_hash, provider) {
        return Some(conv);
    }

    find_user_conversion(source.type_hash, target.type_hash, provider)
}

/// Conversions between enums and numbers.
fn find_enum_conversion(
    source: TypeHash,
    target: TypeHash,
    provider: &dyn MetadataProvider,
) -> Option<Conversion> {
    use hostbind_core::PrimitiveKind;

    let source_enum = provider
        .type_entry(source)
        .and_then(|e| e.enum_underlying());
    let target_enum = provider
        .type_entry(target)
        .and_then(|e| e.enum_underlying());

    match (source_enum, target_enum) {
        (Some(underlying), None) => {
            let to = PrimitiveKind::from_hash(target).filter(|k| k.is_numeric())?;
            let (cost, is_implicit) = if underlying == to {
                (Conversion::COST_ENUM_SAME_SIZE, true)
            } else if underlying.widens_to(to) {
                (Conversion::COST_ENUM_DIFF_SIZE, true)
            } else {
                (Conversion::COST_PRIMITIVE_NARROWING, false)
            };
            Some(Conversion {
                kind: ConversionKind::EnumToNumber,
                cost,
                is_implicit,
            })
        }
        (None, Some(_)) => {
            PrimitiveKind::from_hash(source).filter(|k| k.is_numeric())?;
            Some(Conversion {
                kind: ConversionKind::NumberToEnum { enum_type: target },
                cost: Conversion::COST_NUMBER_TO_ENUM,
                is_implicit: false,
            })
        }
        _ => None,
    }
}
