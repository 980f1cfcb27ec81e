//! Metadata entries handed out by a [`MetadataProvider`](crate::MetadataProvider).
//!
//! - [`TypeEntry`] - one host type, with its declared members
//! - [`MemberEntry`] - one declared field, property, indexer, event, method
//!   or nested type
//!
//! Supporting types:
//! - [`Param`], [`GenericParam`], [`GenericConstraints`] - method signatures
//! - [`EnumValue`] - named enum constants

mod member;
mod type_entry;

pub use member::{
    GenericConstraints, GenericParam, MemberEntry, MemberImpl, MemberKind, Param,
};
pub use type_entry::{EnumValue, TypeEntry, TypeKind};
