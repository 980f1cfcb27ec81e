//! DataType - a type reference with the modifiers the binder cares about.
//!
//! This is distinct from `TypeHash`, which only identifies the base type.
//!
//! # Example
//!
//! ```
//! use hostbind_core::{DataType, RefModifier, primitives};
//!
//! let int_type = DataType::simple(primitives::INT32);
//! let int_array = DataType::array_of(primitives::INT32);
//! assert_eq!(int_array.element(), int_type);
//!
//! let out_int = DataType::simple(primitives::INT32).with_ref(RefModifier::Out);
//! assert!(out_int.is_by_ref());
//! ```

use std::fmt::{self, Display, Formatter};

use crate::TypeHash;

/// How a parameter is passed.
///
/// - `Ref`: read-write reference, the argument value is passed in and the
///   updated value is written back
/// - `Out`: write-only reference, the argument value is ignored on entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RefModifier {
    #[default]
    None,
    Ref,
    Out,
}

impl Display for RefModifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RefModifier::None => Ok(()),
            RefModifier::Ref => write!(f, "ref "),
            RefModifier::Out => write!(f, "out "),
        }
    }
}

/// A complete type reference.
///
/// `Copy` so it can be passed around and hashed into bind signatures without
/// allocation. Arrays are single-dimensional; `type_hash` is then the element
/// type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataType {
    /// The base type hash (element type for arrays).
    pub type_hash: TypeHash,
    /// Single-dimensional array of `type_hash`.
    pub is_array: bool,
    /// Nullable value type (`int?`).
    pub is_nullable: bool,
    /// Parameter passing mode.
    pub ref_modifier: RefModifier,
}

impl DataType {
    /// Plain `type_hash`: not nullable, not an array, passed by value.
    #[inline]
    pub const fn simple(type_hash: TypeHash) -> Self {
        Self {
            type_hash,
            is_array: false,
            is_nullable: false,
            ref_modifier: RefModifier::None,
        }
    }

    /// The `void` type.
    #[inline]
    pub const fn void() -> Self {
        Self::simple(crate::primitives::VOID)
    }

    /// An array whose elements are `element`.
    #[inline]
    pub const fn array_of(element: TypeHash) -> Self {
        Self {
            type_hash: element,
            is_array: true,
            is_nullable: false,
            ref_modifier: RefModifier::None,
        }
    }

    /// A nullable value type.
    #[inline]
    pub const fn nullable(type_hash: TypeHash) -> Self {
        Self {
            type_hash,
            is_array: false,
            is_nullable: true,
            ref_modifier: RefModifier::None,
        }
    }

    /// Placeholder for the generic method parameter at `position`.
    #[inline]
    pub const fn generic(position: u8) -> Self {
        Self::simple(TypeHash::generic_param(position))
    }

    /// Return a copy with the given reference modifier.
    #[inline]
    pub const fn with_ref(mut self, modifier: RefModifier) -> Self {
        self.ref_modifier = modifier;
        self
    }

    /// Return a copy without any reference modifier.
    #[inline]
    pub const fn without_ref(self) -> Self {
        self.with_ref(RefModifier::None)
    }

    /// Element type of an array type (the type itself otherwise).
    #[inline]
    pub const fn element(self) -> Self {
        Self::simple(self.type_hash)
    }

    /// Check if this is passed by reference (`ref` or `out`).
    #[inline]
    pub const fn is_by_ref(&self) -> bool {
        !matches!(self.ref_modifier, RefModifier::None)
    }

    /// Check if this is the `void` type.
    #[inline]
    pub fn is_void(&self) -> bool {
        !self.is_array && self.type_hash == crate::primitives::VOID
    }

    /// Check if this type mentions a generic method parameter.
    #[inline]
    pub const fn is_generic(&self) -> bool {
        self.type_hash.is_generic_param()
    }

    /// Structural hash of this type including its modifiers.
    ///
    /// Used to build overload signatures, where `int`, `int[]` and `ref int`
    /// are distinct parameter shapes.
    pub fn shape_hash(&self) -> TypeHash {
        let mut bits = self.type_hash.0;
        if self.is_array {
            bits = bits.rotate_left(7) ^ 0xa5a5_a5a5_a5a5_a5a5;
        }
        if self.is_nullable {
            bits = bits.rotate_left(13) ^ 0x5a5a_5a5a_5a5a_5a5a;
        }
        match self.ref_modifier {
            RefModifier::None => {}
            RefModifier::Ref => bits = bits.rotate_left(19) ^ 0x3c3c_3c3c_3c3c_3c3c,
            RefModifier::Out => bits = bits.rotate_left(23) ^ 0xc3c3_c3c3_c3c3_c3c3,
        }
        TypeHash(bits)
    }

    /// Replace generic parameter placeholders with concrete type arguments.
    ///
    /// Placeholders without a corresponding argument are left untouched.
    pub fn substitute(self, type_args: &[TypeHash]) -> Self {
        match self.type_hash.generic_position() {
            Some(position) => match type_args.get(position) {
                Some(&concrete) => Self {
                    type_hash: concrete,
                    ..self
                },
                None => self,
            },
            None => self,
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ref_modifier)?;
        match self.type_hash.generic_position() {
            Some(position) => write!(f, "T{}", position)?,
            None => write!(f, "{}", self.type_hash)?,
        }
        if self.is_nullable {
            write!(f, "?")?;
        }
        if self.is_array {
            write!(f, "[]")?;
        }
        Ok(())
    }
}
