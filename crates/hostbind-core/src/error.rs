//! Error types for hostbind.
//!
//! Errors are split by phase: building type metadata and member catalogs,
//! binding a call site, and running host callables.
//!
//! ## Error Hierarchy
//!
//! ```text
//! HostBindError (top-level wrapper)
//! ├── RegistrationError - Malformed or conflicting type metadata
//! ├── BindError         - Member lookup, overload resolution, coercion, access
//! └── NativeError       - Failures raised by host callables
//! ```
//!
//! Every error is `Clone` so resolution failures can be cached and shared
//! between concurrent callers.

use std::fmt;

use thiserror::Error;

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors in type metadata, found at registration, validation or catalog
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A referenced type was not found.
    #[error("type not found: {0}")]
    TypeNotFound(String),

    /// A type with this name already exists.
    #[error("duplicate type: {0}")]
    DuplicateType(String),

    /// Two members of one type conflict.
    #[error("duplicate member '{member}' in type '{type_name}'")]
    DuplicateMember {
        /// The declaring type.
        type_name: String,
        /// The conflicting member, with its parameter list for overloads.
        member: String,
    },

    /// A type is its own ancestor.
    #[error("circular inheritance involving '{0}'")]
    CircularInheritance(String),

    /// An extension scope is not a registered type.
    #[error("invalid extension scope: {0}")]
    InvalidExtensionScope(String),

    /// A member declaration is malformed.
    #[error("invalid member '{member}' in type '{type_name}': {reason}")]
    InvalidMember {
        type_name: String,
        member: String,
        reason: String,
    },
}

// ============================================================================
// Native Errors
// ============================================================================

/// Errors raised by host callables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NativeError {
    /// The receiver was missing or not the expected kind of value.
    #[error("invalid 'this' for native call")]
    InvalidThis,

    /// An argument was missing or of the wrong kind.
    #[error("argument {index}: expected {expected}")]
    InvalidArgument { index: usize, expected: String },

    /// An index was outside the valid range.
    #[error("index {index} out of range (length {length})")]
    IndexOutOfRange { index: i64, length: usize },

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl NativeError {
    pub fn other(message: impl Into<String>) -> Self {
        NativeError::Other(message.into())
    }
}

// ============================================================================
// Bind Errors
// ============================================================================

/// Why access to a member was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessDeniedReason {
    /// No visible member with that name (also used for invisible members).
    NotFound,
    /// Reflective member blocked by settings.
    Reflection,
    /// Read of a member without a getter.
    WriteOnly,
}

impl fmt::Display for AccessDeniedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessDeniedReason::NotFound => write!(f, "member not found"),
            AccessDeniedReason::Reflection => write!(f, "reflection is not allowed"),
            AccessDeniedReason::WriteOnly => write!(f, "member is write-only"),
        }
    }
}

/// Errors binding or executing a dynamic member access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    /// No candidate accepts the argument list.
    #[error("no matching overload for '{name}({args})'")]
    NoMatchingOverload { name: String, args: String },

    /// More than one candidate is equally good.
    #[error("ambiguous call to '{name}': could be {}", candidates.join(" or "))]
    AmbiguousOverload {
        name: String,
        candidates: Vec<String>,
    },

    /// A generic parameter could be neither inferred nor taken from explicit
    /// type arguments.
    #[error("cannot determine type argument '{parameter}' of '{method}'")]
    MissingTypeArgument { method: String, parameter: String },

    /// Inference produced two different types for one generic parameter.
    #[error("conflicting type arguments for '{parameter}' of '{method}': {first} and {second}")]
    TypeArgumentConflict {
        method: String,
        parameter: String,
        first: String,
        second: String,
    },

    /// A type argument does not satisfy its constraints.
    #[error("type '{type_arg}' does not satisfy constraint '{constraint}' on '{parameter}' of '{method}'")]
    TypeArgumentConstraintViolation {
        method: String,
        parameter: String,
        type_arg: String,
        constraint: String,
    },

    /// A redundant leading type marker disagrees with the explicit type arguments.
    #[error("type argument marker '{found}' does not match '{expected}' in call to '{method}'")]
    TypeArgumentMismatch {
        method: String,
        expected: String,
        found: String,
    },

    /// A numeric value does not fit the target type.
    #[error("value {value} is out of range for '{target}'")]
    NumericOverflow { value: String, target: String },

    /// A value is of the wrong type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Write to a read-only member.
    #[error("'{member}' is read-only")]
    ReadOnlyViolation { member: String },

    /// The member is absent, invisible, or blocked.
    #[error("{reason}: '{member}'")]
    AccessDenied {
        member: String,
        reason: AccessDeniedReason,
    },

    /// The target or accessor cannot be used for this operation.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// The target type's metadata is malformed.
    #[error(transparent)]
    Catalog(#[from] RegistrationError),

    /// The host callable failed.
    #[error(transparent)]
    Native(#[from] NativeError),
}

impl BindError {
    /// Shorthand for a not-found access denial.
    pub fn not_found(member: impl Into<String>) -> Self {
        BindError::AccessDenied {
            member: member.into(),
            reason: AccessDeniedReason::NotFound,
        }
    }

    /// Check if this is a not-found access denial.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BindError::AccessDenied {
                reason: AccessDeniedReason::NotFound,
                ..
            }
        )
    }

    /// Check if this error came out of overload resolution or generic
    /// argument resolution.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            BindError::NoMatchingOverload { .. }
                | BindError::AmbiguousOverload { .. }
                | BindError::MissingTypeArgument { .. }
                | BindError::TypeArgumentConflict { .. }
                | BindError::TypeArgumentConstraintViolation { .. }
                | BindError::TypeArgumentMismatch { .. }
        )
    }

    /// Check if this error came out of argument coercion.
    pub fn is_coercion_failure(&self) -> bool {
        matches!(
            self,
            BindError::NumericOverflow { .. } | BindError::TypeMismatch { .. }
        )
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Top-level error wrapping every phase.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostBindError {
    /// A registration error.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A bind error.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// A native error.
    #[error(transparent)]
    Native(#[from] NativeError),
}

impl HostBindError {
    /// Check if this is a registration error.
    pub fn is_registration(&self) -> bool {
        matches!(self, HostBindError::Registration(_))
    }

    /// Check if this is a bind error.
    pub fn is_bind(&self) -> bool {
        matches!(self, HostBindError::Bind(_))
    }

    /// Check if this is a native error.
    pub fn is_native(&self) -> bool {
        matches!(self, HostBindError::Native(_))
    }

    /// The bind error, if this is one.
    pub fn as_bind(&self) -> Option<&BindError> {
        match self {
            HostBindError::Bind(e) => Some(e),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
