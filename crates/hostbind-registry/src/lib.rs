//! hostbind registry
//!
//! The [`TypeRegistry`] stores host type metadata and implements
//! [`MetadataProvider`](hostbind_core::MetadataProvider) for the binder.
//! [`TypeBuilder`] assembles type entries fluently.

mod builder;
mod registry;

pub use builder::TypeBuilder;
pub use registry::TypeRegistry;
