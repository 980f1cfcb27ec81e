//! Visibility levels for host members and nested types.

use std::fmt;

/// Nominal visibility of a declared member.
///
/// `Internal` is scoped to the declaring type's [`ModuleId`](crate::ModuleId).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Protected,
    ProtectedOrInternal,
    Private,
}

impl Visibility {
    /// Check if this is public visibility.
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Internal => write!(f, "internal"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::ProtectedOrInternal => write!(f, "protected internal"),
            Visibility::Private => write!(f, "private"),
        }
    }
}
