//! Primitive type conversions.
//!
//! Conversions between the numeric primitives. `bool` only converts to
//! itself. Lossy conversions are allowed here at a higher cost; the value is
//! range-checked when it is actually coerced.

use hostbind_core::{PrimitiveKind, TypeHash};

use super::{Conversion, ConversionKind};

/// Find a conversion between two primitive types.
pub fn find_primitive_conversion(from: TypeHash, to: TypeHash) -> Option<Conversion> {
    let from_kind = PrimitiveKind::from_hash(from)?;
    let to_kind = PrimitiveKind::from_hash(to)?;

    if from_kind == to_kind {
        return Some(Conversion::identity());
    }
    if !from_kind.is_numeric() || !to_kind.is_numeric() {
        return None;
    }

    let (cost, is_implicit) = primitive_cost(from_kind, to_kind);
    Some(Conversion {
        kind: ConversionKind::Primitive { from, to },
        cost,
        is_implicit,
    })
}

fn primitive_cost(from: PrimitiveKind, to: PrimitiveKind) -> (u32, bool) {
    match (from.is_float(), to.is_float()) {
        (false, true) => (Conversion::COST_INT_TO_FLOAT, true),
        (true, false) => (Conversion::COST_FLOAT_TO_INT, false),
        (true, true) if from.widens_to(to) => (Conversion::COST_PRIMITIVE_WIDENING, true),
        (true, true) => (Conversion::COST_PRIMITIVE_NARROWING, false),
        (false, false) if from.widens_to(to) => (Conversion::COST_PRIMITIVE_WIDENING, true),
        (false, false) if to.size() < from.size() => (Conversion::COST_PRIMITIVE_NARROWING, false),
        (false, false) if from.is_signed() => (Conversion::COST_SIGNED_TO_UNSIGNED, false),
        (false, false) => (Conversion::COST_UNSIGNED_TO_SIGNED, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbind_core::primitives;

    fn cost(from: TypeHash, to: TypeHash) -> Option<u32> {
        find_primitive_conversion(from, to).map(|c| c.cost)
    }

    #[test]
    fn identity() {
        let conv = find_primitive_conversion(primitives::INT32, primitives::INT32).unwrap();
        assert!(conv.is_exact());
    }

    #[test]
    fn integer_widening() {
        assert_eq!(
            cost(primitives::INT8, primitives::INT64),
            Some(Conversion::COST_PRIMITIVE_WIDENING)
        );
        assert_eq!(
            cost(primitives::UINT8, primitives::INT16),
            Some(Conversion::COST_PRIMITIVE_WIDENING)
        );
    }

    #[test]
    fn integer_narrowing_is_not_implicit() {
        let conv = find_primitive_conversion(primitives::INT32, primitives::UINT8).unwrap();
        assert_eq!(conv.cost, Conversion::COST_PRIMITIVE_NARROWING);
        assert!(!conv.is_implicit());
    }

    #[test]
    fn sign_changes() {
        assert_eq!(
            cost(primitives::INT32, primitives::UINT32),
            Some(Conversion::COST_SIGNED_TO_UNSIGNED)
        );
        assert_eq!(
            cost(primitives::INT32, primitives::UINT64),
            Some(Conversion::COST_SIGNED_TO_UNSIGNED)
        );
        assert_eq!(
            cost(primitives::UINT32, primitives::INT32),
            Some(Conversion::COST_UNSIGNED_TO_SIGNED)
        );
    }

    #[test]
    fn floats() {
        assert_eq!(
            cost(primitives::INT32, primitives::DOUBLE),
            Some(Conversion::COST_INT_TO_FLOAT)
        );
        assert_eq!(
            cost(primitives::FLOAT, primitives::DOUBLE),
            Some(Conversion::COST_PRIMITIVE_WIDENING)
        );
        assert_eq!(
            cost(primitives::DOUBLE, primitives::FLOAT),
            Some(Conversion::COST_PRIMITIVE_NARROWING)
        );
        assert_eq!(
            cost(primitives::DOUBLE, primitives::INT32),
            Some(Conversion::COST_FLOAT_TO_INT)
        );
    }

    #[test]
    fn bool_is_isolated() {
        assert_eq!(cost(primitives::BOOL, primitives::INT32), None);
        assert_eq!(cost(primitives::INT32, primitives::BOOL), None);
        assert_eq!(
            cost(primitives::BOOL, primitives::BOOL),
            Some(Conversion::COST_EXACT)
        );
    }

    #[test]
    fn non_primitives_are_ignored() {
        assert_eq!(cost(primitives::STRING, primitives::INT32), None);
    }
}
