//! Binding flags describing what a dynamic call site wants.

use bitflags::bitflags;

bitflags! {
    /// Operation and lookup options for a bind call.
    ///
    /// When neither `INSTANCE` nor `STATIC` is set, the side is inferred from
    /// the target: a host type value binds static members, anything else binds
    /// instance members.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BindFlags: u8 {
        /// Read a field, property, event, nested type or indexer.
        const GET_MEMBER = 1 << 0;
        /// Write a field, property or indexer.
        const SET_MEMBER = 1 << 1;
        /// Call a method.
        const INVOKE_METHOD = 1 << 2;
        /// Bind instance members.
        const INSTANCE = 1 << 3;
        /// Bind static members.
        const STATIC = 1 << 4;
        /// Match member names case-insensitively.
        const IGNORE_CASE = 1 << 5;
    }
}

impl BindFlags {
    /// Flags that select the operation.
    pub const OPERATIONS: BindFlags = BindFlags::GET_MEMBER
        .union(BindFlags::SET_MEMBER)
        .union(BindFlags::INVOKE_METHOD);

    /// Check that exactly one operation is requested.
    pub fn has_single_operation(self) -> bool {
        self.intersection(Self::OPERATIONS).bits().count_ones() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_operation() {
        assert!(BindFlags::GET_MEMBER.has_single_operation());
        assert!((BindFlags::INVOKE_METHOD | BindFlags::IGNORE_CASE).has_single_operation());
        assert!(!(BindFlags::GET_MEMBER | BindFlags::SET_MEMBER).has_single_operation());
        assert!(!BindFlags::INSTANCE.has_single_operation());
    }
}
