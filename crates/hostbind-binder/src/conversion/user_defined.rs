//! User-defined conversions.
//!
//! A type may declare a static `op_Implicit` method taking one parameter and
//! returning another type. Either the source or the target type can declare it.

use hostbind_core::{MemberKind, MetadataProvider, TypeHash};

use super::{Conversion, ConversionKind};

/// Name of the implicit conversion operator.
pub const IMPLICIT_OPERATOR: &str = "op_Implicit";

/// Find an `op_Implicit` conversion on the source or target type.
pub fn find_user_conversion(
    source: TypeHash,
    target: TypeHash,
    provider: &dyn MetadataProvider,
) -> Option<Conversion> {
    [source, target].into_iter().find_map(|declaring_type| {
        find_implicit_operator(declaring_type, source, target, provider).map(|method| Conversion {
            kind: ConversionKind::UserImplicit {
                declaring_type,
                method,
            },
            cost: Conversion::COST_USER_IMPLICIT,
            is_implicit: true,
        })
    })
}

fn find_implicit_operator(
    declaring_type: TypeHash,
    source: TypeHash,
    target: TypeHash,
    provider: &dyn MetadataProvider,
) -> Option<TypeHash> {
    let members = provider.declared_members(declaring_type)?;
    members
        .iter()
        .find(|m| {
            m.kind == MemberKind::Method
                && m.is_static
                && m.name == IMPLICIT_OPERATOR
                && m.params.len() == 1
                && m.params[0].data_type.type_hash == source
                && !m.params[0].data_type.is_array
                && m.data_type.type_hash == target
                && !m.data_type.is_array
        })
        .map(|m| m.member_hash(declaring_type))
}
