//! Stable 64-bit identities for host types, members and modules.
//!
//! A [`TypeHash`] is derived from names and signatures alone, so a base type
//! or parameter type can be referred to before its entry is registered, and
//! bind signatures can be keyed on plain integers.
//!
//! Each kind of identity (type, method, data member, module, explicit
//! implementation) mixes in its own domain constant before hashing with
//! XXHash64, keeping a type named `Foo` apart from a member named `Foo`.
//!
//! ```
//! use hostbind_core::TypeHash;
//!
//! let widget = TypeHash::from_name("Widget");
//! let int = TypeHash::from_name("int");
//! let plain = TypeHash::from_method(widget, "resize", &[int], 0);
//! let generic = TypeHash::from_method(widget, "resize", &[int], 1);
//! assert_ne!(plain, generic);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Mixing constants, one per identity domain.
pub mod hash_constants {
    /// Multiplier used when folding ordered components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Types.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Methods and indexers.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Fields, properties, events and nested types.
    pub const MEMBER: u64 = 0x3e9f5d2a8c7b1403;

    /// Modules.
    pub const MODULE: u64 = 0x9a7f3d5e2b8c4601;

    /// Explicit interface implementations.
    pub const EXPLICIT: u64 = 0x1a095090689d4647;

    /// Reserved range for generic method parameters. The low byte holds the
    /// parameter position.
    pub const GENERIC_PARAM_BASE: u64 = 0xfff0_0000_0000_0000;

    /// Per-position salts; `f(int, double)` and `f(double, int)` hash apart.
    pub const PARAM_MARKERS: [u64; 16] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
        0x7c3e9f2a5b8d1403,
        0x5d8c7b4a3e9f2106,
        0x3f1e9d8c7b5a4203,
        0x1a2b3c4d5e6f7089,
        0x9f8e7d6c5b4a3210,
        0x2468ace013579bdf,
        0xfdb97531eca86420,
        0x123456789abcdef0,
    ];
}

/// Identity of a type, member or module.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// The unset identity.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Identity of the type with the given qualified name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a method hash from owner type, name, parameter type hashes and
    /// generic arity.
    ///
    /// Parameter order matters, and `Foo(int)` differs from `Foo<T>(int)`.
    #[inline]
    pub fn from_method(
        owner: TypeHash,
        name: &str,
        param_hashes: &[TypeHash],
        generic_arity: usize,
    ) -> Self {
        let hash = hash_constants::METHOD
            ^ owner.0
            ^ xxh64(name.as_bytes(), 0)
            ^ (generic_arity as u64).wrapping_mul(hash_constants::SEP);
        TypeHash(mix_params(hash, param_hashes))
    }

    /// Create a data member hash (field, property, event, nested type).
    #[inline]
    pub fn from_member(owner: TypeHash, name: &str) -> Self {
        TypeHash(hash_constants::MEMBER ^ owner.0 ^ xxh64(name.as_bytes(), 0))
    }

    /// Hash of a member that explicitly implements `interface`.
    ///
    /// Differs from the hash of a same-named default member of the owner.
    #[inline]
    pub fn from_explicit(owner: TypeHash, interface: TypeHash, member: TypeHash) -> Self {
        TypeHash(
            hash_constants::EXPLICIT
                ^ owner.0
                ^ interface.0.wrapping_mul(hash_constants::SEP)
                ^ member.0,
        )
    }

    /// Hash identifying a module by name.
    #[inline]
    pub fn from_module(name: &str) -> Self {
        TypeHash(hash_constants::MODULE ^ xxh64(name.as_bytes(), 0))
    }

    /// Placeholder hash for the generic method parameter at `position`.
    #[inline]
    pub const fn generic_param(position: u8) -> Self {
        TypeHash(hash_constants::GENERIC_PARAM_BASE | position as u64)
    }

    /// If this hash is a generic parameter placeholder, its position.
    #[inline]
    pub const fn generic_position(self) -> Option<usize> {
        if self.0 & !0xff == hash_constants::GENERIC_PARAM_BASE {
            Some((self.0 & 0xff) as usize)
        } else {
            None
        }
    }

    /// True for generic parameter placeholders.
    #[inline]
    pub const fn is_generic_param(self) -> bool {
        self.generic_position().is_some()
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw hash bits.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

fn mix_params(seed: u64, params: &[TypeHash]) -> u64 {
    let markers = &hash_constants::PARAM_MARKERS;
    params.iter().enumerate().fold(seed, |acc, (position, param)| {
        let salt = match markers.get(position) {
            Some(salt) => *salt,
            None => markers[0].wrapping_add(position as u64),
        };
        acc.wrapping_mul(hash_constants::SEP)
            .wrapping_add(salt ^ param.0)
    })
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeHash(")?;
        fmt::Display::fmt(self, f)?;
        f.write_str(")")
    }
}

/// Identities of the built-in types.
///
/// Named primitives hold `TypeHash::from_name` of their script name, folded
/// ahead of time so they can be used in `const` position. `OBJECT`, `TYPE`
/// and `EVENT` are sentinels with no name.
pub mod primitives {
    use super::TypeHash;

    /// `void`
    pub const VOID: TypeHash = TypeHash(0xe4b3797ddcf989ea);

    /// `bool`
    pub const BOOL: TypeHash = TypeHash(0x1e0c8fa4cced99c1);

    /// `int8`
    pub const INT8: TypeHash = TypeHash(0x2b44191092e74388);

    /// `int16`
    pub const INT16: TypeHash = TypeHash(0x95aebfc985e9b115);

    /// `int`
    pub const INT32: TypeHash = TypeHash(0x4f5e5320cd1c92bf);

    /// `int64`
    pub const INT64: TypeHash = TypeHash(0x7d6c550df59a1924);

    /// `uint8`
    pub const UINT8: TypeHash = TypeHash(0x0e8b2d31cdfa9716);

    /// `uint16`
    pub const UINT16: TypeHash = TypeHash(0x269d68dfde65ae7f);

    /// `uint`
    pub const UINT32: TypeHash = TypeHash(0x543fb8f520aa3e26);

    /// `uint64`
    pub const UINT64: TypeHash = TypeHash(0x32ba58d17fda82dd);

    /// `float`
    pub const FLOAT: TypeHash = TypeHash(0x02d5a2fddaf5bb69);

    /// `double`
    pub const DOUBLE: TypeHash = TypeHash(0xeb125587f6c2a79b);

    /// `string`
    pub const STRING: TypeHash = TypeHash(0x7a8d5fb1ba695978);

    /// Type of the `null` literal.
    pub const NULL: TypeHash = TypeHash(0x1165f1b6597b5a46);

    /// Root of the reference hierarchy. Every value converts to it.
    pub const OBJECT: TypeHash = TypeHash(0xfffffffffffffffd);

    /// Type of `Value::Type`, including type-argument markers.
    pub const TYPE: TypeHash = TypeHash(0xfffffffffffffffc);

    /// Type of event sources.
    pub const EVENT: TypeHash = TypeHash(0xfffffffffffffffb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_hash_stably_and_apart() {
        let names = ["int", "float", "Player", "App::Player"];
        for (i, a) in names.iter().enumerate() {
            assert_eq!(TypeHash::from_name(a), TypeHash::from_name(a));
            for b in &names[i + 1..] {
                assert_ne!(TypeHash::from_name(a), TypeHash::from_name(b), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn method_identity_covers_owner_order_and_arity() {
        let (a, b) = (TypeHash::from_name("A"), TypeHash::from_name("B"));
        let (int, float) = (primitives::INT32, primitives::FLOAT);
        let base = TypeHash::from_method(a, "update", &[int, float], 0);

        assert_ne!(base, TypeHash::from_method(a, "update", &[float, int], 0));
        assert_ne!(base, TypeHash::from_method(b, "update", &[int, float], 0));
        assert_ne!(base, TypeHash::from_method(a, "update", &[int, float], 1));

        let long: Vec<TypeHash> = std::iter::repeat_n(int, 40).collect();
        assert!(!TypeHash::from_method(a, "update", &long, 0).is_empty());
    }

    #[test]
    fn explicit_implementation_has_its_own_identity() {
        let owner = TypeHash::from_name("Widget");
        let member = TypeHash::from_member(owner, "Name");
        let explicit = TypeHash::from_explicit(owner, TypeHash::from_name("IWidget"), member);
        assert_ne!(member, explicit);
        assert_ne!(member, TypeHash::from_method(owner, "Name", &[], 0));
    }

    #[test]
    fn generic_placeholders() {
        assert_eq!(TypeHash::generic_param(3).generic_position(), Some(3));
        assert!(TypeHash::generic_param(0).is_generic_param());
        assert!(!TypeHash::from_name("T").is_generic_param());
        assert!(!primitives::OBJECT.is_generic_param());
    }

    #[test]
    fn builtin_constants_are_folded_names() {
        let table = [
            (primitives::VOID, "void"),
            (primitives::BOOL, "bool"),
            (primitives::INT8, "int8"),
            (primitives::INT16, "int16"),
            (primitives::INT32, "int"),
            (primitives::INT64, "int64"),
            (primitives::UINT8, "uint8"),
            (primitives::UINT16, "uint16"),
            (primitives::UINT32, "uint"),
            (primitives::UINT64, "uint64"),
            (primitives::FLOAT, "float"),
            (primitives::DOUBLE, "double"),
            (primitives::NULL, "null"),
            (primitives::STRING, "string"),
        ];
        for (constant, name) in table {
            assert_eq!(constant, TypeHash::from_name(name), "{name}");
        }
    }

    #[test]
    fn formatting() {
        let hash = primitives::INT32;
        assert_eq!(hash.to_string(), "0x4f5e5320cd1c92bf");
        assert_eq!(format!("{hash:?}"), "TypeHash(0x4f5e5320cd1c92bf)");
    }
}
