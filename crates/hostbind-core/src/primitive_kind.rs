//! Primitive type kinds for the host's built-in numeric and boolean types.

use std::fmt;

use crate::TypeHash;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
}

impl PrimitiveKind {
    /// All primitive kinds, in registration order.
    pub const ALL: [PrimitiveKind; 11] = [
        PrimitiveKind::Bool,
        PrimitiveKind::Int8,
        PrimitiveKind::Int16,
        PrimitiveKind::Int32,
        PrimitiveKind::Int64,
        PrimitiveKind::Uint8,
        PrimitiveKind::Uint16,
        PrimitiveKind::Uint32,
        PrimitiveKind::Uint64,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    /// Identity of this primitive in the registry.
    pub const fn type_hash(self) -> TypeHash {
        use crate::primitives;
        match self {
            PrimitiveKind::Bool => primitives::BOOL,
            PrimitiveKind::Int8 => primitives::INT8,
            PrimitiveKind::Int16 => primitives::INT16,
            PrimitiveKind::Int32 => primitives::INT32,
            PrimitiveKind::Int64 => primitives::INT64,
            PrimitiveKind::Uint8 => primitives::UINT8,
            PrimitiveKind::Uint16 => primitives::UINT16,
            PrimitiveKind::Uint32 => primitives::UINT32,
            PrimitiveKind::Uint64 => primitives::UINT64,
            PrimitiveKind::Float => primitives::FLOAT,
            PrimitiveKind::Double => primitives::DOUBLE,
        }
    }

    /// Look up the primitive kind for a type hash.
    pub fn from_hash(hash: TypeHash) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_hash() == hash)
    }

    /// Script-facing name, as used in signatures and messages.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int8 => "int8",
            PrimitiveKind::Int16 => "int16",
            PrimitiveKind::Int32 => "int",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::Uint8 => "uint8",
            PrimitiveKind::Uint16 => "uint16",
            PrimitiveKind::Uint32 => "uint",
            PrimitiveKind::Uint64 => "uint64",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Integer kinds (signed or unsigned).
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int8
                | PrimitiveKind::Int16
                | PrimitiveKind::Int32
                | PrimitiveKind::Int64
                | PrimitiveKind::Uint8
                | PrimitiveKind::Uint16
                | PrimitiveKind::Uint32
                | PrimitiveKind::Uint64
        )
    }

    /// Floating point kinds.
    pub const fn is_float(self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }

    /// Numeric kinds (everything except `bool`).
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Signed integer kinds.
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int8 | PrimitiveKind::Int16 | PrimitiveKind::Int32 | PrimitiveKind::Int64
        )
    }

    /// Size in bytes.
    pub const fn size(self) -> u8 {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::Int8 | PrimitiveKind::Uint8 => 1,
            PrimitiveKind::Int16 | PrimitiveKind::Uint16 => 2,
            PrimitiveKind::Int32 | PrimitiveKind::Uint32 | PrimitiveKind::Float => 4,
            PrimitiveKind::Int64 | PrimitiveKind::Uint64 | PrimitiveKind::Double => 8,
        }
    }

    /// Inclusive value range for integer kinds.
    pub const fn integer_range(self) -> Option<(i128, i128)> {
        match self {
            PrimitiveKind::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            PrimitiveKind::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            PrimitiveKind::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            PrimitiveKind::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            PrimitiveKind::Uint8 => Some((0, u8::MAX as i128)),
            PrimitiveKind::Uint16 => Some((0, u16::MAX as i128)),
            PrimitiveKind::Uint32 => Some((0, u32::MAX as i128)),
            PrimitiveKind::Uint64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }

    /// Check if every value of `self` is representable in `target` without
    /// loss of magnitude.
    pub fn widens_to(self, target: PrimitiveKind) -> bool {
        if self == target {
            return true;
        }
        match (self.integer_range(), target.integer_range()) {
            (Some((from_min, from_max)), Some((to_min, to_max))) => {
                from_min >= to_min && from_max <= to_max
            }
            // Any integer fits a double's magnitude; float only holds up to 32-bit ints exactly,
            // but magnitude never overflows so it still counts as widening.
            (Some(_), None) => target.is_float(),
            (None, None) => self == PrimitiveKind::Float && target == PrimitiveKind::Double,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
