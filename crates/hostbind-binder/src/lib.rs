//! hostbind binder
//!
//! Run-time member binding between dynamically typed script values and a
//! nominal host type model. Given a target value, a member name, optional
//! explicit type arguments and the runtime types of the arguments, the
//! binder selects the member a statically typed compiler would have chosen,
//! then executes it with coerced arguments.
//!
//! ## Modules
//!
//! - [`catalog`]: Per-type member catalogs flattened over the hierarchy
//! - [`access`]: Visibility filtering under an access context
//! - [`candidates`]: Same-named candidate selection, explicit and extension members
//! - [`conversion`]: Implicit conversion discovery and cost model
//! - [`generics`]: Type marker planning, type argument inference and constraints
//! - [`overload`]: Overload resolution and ranking
//! - [`coercion`]: Argument and value coercion at call time
//! - [`restriction`]: Declared-type restriction of results
//! - [`enforcer`]: Read, write and reflection checks
//! - [`cache`]: Bind signatures and the shared bind cache
//! - [`binder`]: The [`Binder`] facade

pub mod access;
pub mod binder;
pub mod cache;
pub mod candidates;
pub mod catalog;
pub mod coercion;
pub mod conversion;
pub mod enforcer;
pub mod generics;
pub mod overload;
pub mod restriction;

pub use access::{VisibleMemberSet, is_visible};
pub use binder::{ARRAY_LENGTH, Binder, Binding, BoundAccessor, INDEXER_NAME, Operation};
pub use cache::{ArgShape, BindCache, BindSignature, CacheStats, TargetShape};
pub use catalog::{CatalogCache, MemberCatalog, MemberDescriptor, MemberOrigin};
pub use coercion::{PreparedArgs, coerce, default_value, prepare_arguments};
pub use conversion::{Conversion, ConversionKind, IMPLICIT_OPERATOR, find_conversion};
pub use overload::{OverloadMatch, resolve_overload};
pub use restriction::{restrict, restrict_value};
