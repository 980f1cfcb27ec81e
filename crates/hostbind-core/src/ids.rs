//! Identifier types for host modules.
//!
//! Module-internal visibility is decided by comparing the module of a member's
//! declaring type with the module of the access context, so modules only need
//! an opaque identity compared by equality.

use std::fmt;

use crate::TypeHash;

/// Identifies the module (assembly, crate, package) a host type belongs to.
///
/// # Example
///
/// ```
/// use hostbind_core::ModuleId;
///
/// let a = ModuleId::named("game.core");
/// assert_eq!(a, ModuleId::named("game.core"));
/// assert_ne!(a, ModuleId::GLOBAL);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(TypeHash);

impl ModuleId {
    /// The module every type belongs to unless registered elsewhere.
    pub const GLOBAL: ModuleId = ModuleId(TypeHash::EMPTY);

    /// Module identity derived from a module name.
    #[inline]
    pub fn named(name: &str) -> Self {
        Self(TypeHash::from_module(name))
    }

    /// Get the underlying hash.
    #[inline]
    pub const fn hash(self) -> TypeHash {
        self.0
    }
}

impl Default for ModuleId {
    fn default() -> Self {
        Self::GLOBAL
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::GLOBAL {
            write!(f, "module_global")
        } else {
            write!(f, "module_{}", self.0)
        }
    }
}
