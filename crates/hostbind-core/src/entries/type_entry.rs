//! TypeEntry - metadata for one host type.

use rustc_hash::FxHashSet;

use crate::{MemberEntry, ModuleId, PrimitiveKind, TypeHash, Visibility};

/// What kind of host type an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Built-in boolean or numeric type.
    Primitive(PrimitiveKind),
    /// The built-in string type.
    String,
    /// Root of the reference hierarchy.
    Object,
    /// Reference type.
    Class,
    /// Value type, copied on assignment.
    Struct,
    Interface,
    /// Enumeration backed by an integer type.
    Enum { underlying: PrimitiveKind },
    /// The type of host-type values.
    TypeMarker,
}

impl TypeKind {
    /// Reference types accept null and participate in reference conversions.
    pub fn is_reference_type(self) -> bool {
        matches!(
            self,
            TypeKind::String
                | TypeKind::Object
                | TypeKind::Class
                | TypeKind::Interface
                | TypeKind::TypeMarker
        )
    }

    /// Value types reject null unless nullable.
    pub fn is_value_type(self) -> bool {
        !self.is_reference_type()
    }
}

/// A named enum constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
}

impl EnumValue {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Metadata for one host type.
#[derive(Debug, Clone)]
pub struct TypeEntry {
    /// Unqualified name.
    pub name: String,
    /// Qualified name (with namespace and containing types).
    pub qualified_name: String,
    pub type_hash: TypeHash,
    pub module: ModuleId,
    pub kind: TypeKind,
    pub visibility: Visibility,
    /// Base class. Interfaces have none.
    pub base: Option<TypeHash>,
    /// Directly implemented (or, for interfaces, extended) interfaces.
    pub interfaces: Vec<TypeHash>,
    /// Containing type for nested types.
    pub declaring_type: Option<TypeHash>,
    /// Members declared on this type only.
    pub members: Vec<MemberEntry>,
    /// Enum constants, for enum types.
    pub enum_values: Vec<EnumValue>,
}

impl TypeEntry {
    /// Create an entry with no members, in the global module.
    pub fn new(qualified_name: impl Into<String>, kind: TypeKind) -> Self {
        let qualified_name = qualified_name.into();
        let name = qualified_name
            .rsplit("::")
            .next()
            .unwrap_or(&qualified_name)
            .to_string();
        Self {
            type_hash: TypeHash::from_name(&qualified_name),
            name,
            qualified_name,
            module: ModuleId::GLOBAL,
            kind,
            visibility: Visibility::Public,
            base: None,
            interfaces: Vec::new(),
            declaring_type: None,
            members: Vec::new(),
            enum_values: Vec::new(),
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum { .. })
    }

    /// Structs, enums and primitives; values are copied on assignment.
    pub fn is_value_type(&self) -> bool {
        self.kind.is_value_type()
    }

    /// Classes, interfaces and `object`; values are shared by handle.
    pub fn is_reference_type(&self) -> bool {
        self.kind.is_reference_type()
    }

    /// Underlying integer kind of an enum.
    pub fn enum_underlying(&self) -> Option<PrimitiveKind> {
        match self.kind {
            TypeKind::Enum { underlying } => Some(underlying),
            _ => None,
        }
    }

    /// Base class followed by directly implemented interfaces.
    pub fn bases_and_interfaces(&self) -> impl Iterator<Item = TypeHash> + '_ {
        self.base.into_iter().chain(self.interfaces.iter().copied())
    }

    /// Find an enum constant by value.
    pub fn enum_value_of(&self, value: i64) -> Option<&EnumValue> {
        self.enum_values.iter().find(|v| v.value == value)
    }

    /// The first member that conflicts with an earlier one: same name for
    /// data members and nested types, same name and parameter shape for
    /// methods and indexers. Explicit interface implementations only conflict
    /// with each other.
    pub fn find_duplicate_member(&self) -> Option<&MemberEntry> {
        let mut seen = FxHashSet::default();
        self.members.iter().find(|m| !seen.insert(m.shape_hash()))
    }
}
