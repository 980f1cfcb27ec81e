//! Access enforcement on resolved members.

use hostbind_core::{AccessDeniedReason, BindError, BindSettings};

use crate::catalog::MemberDescriptor;

/// Reject reads of members without a getter.
pub fn enforce_read(member: &MemberDescriptor) -> Result<(), BindError> {
    if member.can_read() {
        Ok(())
    } else {
        Err(BindError::AccessDenied {
            member: member.name().to_string(),
            reason: AccessDeniedReason::WriteOnly,
        })
    }
}

/// Reject writes to read-only members.
pub fn enforce_write(member: &MemberDescriptor) -> Result<(), BindError> {
    if member.can_write() {
        Ok(())
    } else {
        Err(BindError::ReadOnlyViolation {
            member: member.name().to_string(),
        })
    }
}

/// Block reflective members unless reflection is allowed.
///
/// Applies to every access path, including objects reached through other
/// member results.
pub fn enforce_invoke(member: &MemberDescriptor, settings: &BindSettings) -> Result<(), BindError> {
    if member.is_reflective() && !settings.allow_reflection {
        return Err(BindError::AccessDenied {
            member: member.name().to_string(),
            reason: AccessDeniedReason::Reflection,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbind_core::{
        CallContext, DataType, MemberEntry, NativeFn, TypeEntry, TypeKind, Value, primitives,
    };

    use crate::catalog::MemberOrigin;

    fn describe(entry: MemberEntry) -> MemberDescriptor {
        MemberDescriptor::new(
            entry,
            &TypeEntry::new("Widget", TypeKind::Class),
            MemberOrigin::Own,
            0,
        )
    }

    fn noop() -> NativeFn {
        NativeFn::new(|_: &mut CallContext| Ok(Value::Void))
    }

    #[test]
    fn read_only_rejects_writes() {
        let id = MemberEntry::field("Id", DataType::simple(primitives::INT32)).read_only();
        let member = describe(id);
        assert!(enforce_read(&member).is_ok());
        assert_eq!(
            enforce_write(&member).unwrap_err().to_string(),
            "'Id' is read-only"
        );
    }

    #[test]
    fn write_only_rejects_reads() {
        let member = describe(MemberEntry::property(
            "Secret",
            DataType::simple(primitives::STRING),
            None,
            Some(noop()),
        ));
        assert!(enforce_write(&member).is_ok());
        assert!(matches!(
            enforce_read(&member),
            Err(BindError::AccessDenied {
                reason: AccessDeniedReason::WriteOnly,
                ..
            })
        ));
    }

    #[test]
    fn reflection_needs_permission() {
        let type_of = DataType::simple(primitives::TYPE);
        let get_type = MemberEntry::method("GetType", vec![], type_of, noop());
        let member = describe(get_type.as_reflective());
        let blocked = BindSettings::new();
        let err = enforce_invoke(&member, &blocked).unwrap_err();
        assert_eq!(err.to_string(), "reflection is not allowed: 'GetType'");

        let allowed = blocked.with_allow_reflection(true);
        assert!(enforce_invoke(&member, &allowed).is_ok());
    }
}
