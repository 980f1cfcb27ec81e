//! MemberEntry - one declared member of a host type.

use bitflags::bitflags;

use crate::{DataType, NativeFn, TypeHash, Value, Visibility, primitives};

/// Kind of a declared member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Property,
    /// Parameterized property, accessed with index arguments.
    Indexer,
    Event,
    Method,
    NestedType,
}

impl MemberKind {
    /// Fields, properties and events: members read or written without arguments.
    pub fn is_data(self) -> bool {
        matches!(self, MemberKind::Field | MemberKind::Property | MemberKind::Event)
    }

    /// Kinds whose overloads are distinguished by parameter shape.
    pub fn has_params(self) -> bool {
        matches!(self, MemberKind::Method | MemberKind::Indexer)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MemberKind::Field => "field",
            MemberKind::Property => "property",
            MemberKind::Indexer => "indexer",
            MemberKind::Event => "event",
            MemberKind::Method => "method",
            MemberKind::NestedType => "nested type",
        }
    }
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the host implements a member.
#[derive(Debug, Clone)]
pub enum MemberImpl {
    /// Field slot in the object (or static storage for static fields).
    Storage,
    /// Property or indexer accessors.
    Accessors {
        getter: Option<NativeFn>,
        setter: Option<NativeFn>,
    },
    /// Method body.
    Method(NativeFn),
    /// Nested type declaration.
    Nested(TypeHash),
    /// Event with per-object handler lists.
    Event,
    /// Interface or abstract declaration, dispatched to an implementation.
    Abstract,
}

bitflags! {
    /// Constraints on a generic method parameter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GenericConstraints: u8 {
        /// Type argument must be a value type.
        const VALUE_TYPE = 1 << 0;
        /// Type argument must be a reference type.
        const REFERENCE_TYPE = 1 << 1;
    }
}

/// A generic method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericParam {
    pub name: String,
    pub constraints: GenericConstraints,
    /// Base types or interfaces the type argument must derive from or implement.
    pub bounds: Vec<TypeHash>,
}

impl GenericParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: GenericConstraints::empty(),
            bounds: Vec::new(),
        }
    }

    pub fn with_constraints(mut self, constraints: GenericConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_bound(mut self, bound: TypeHash) -> Self {
        self.bounds.push(bound);
        self
    }
}

/// A method or indexer parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub data_type: DataType,
    /// Value used when the argument is omitted.
    pub default: Option<Value>,
    /// Trailing params-array: `data_type` is the array type.
    pub is_params: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            default: None,
            is_params: false,
        }
    }

    /// A trailing params-array of `element`.
    pub fn params(name: impl Into<String>, element: TypeHash) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::array_of(element),
            default: None,
            is_params: true,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Parameters that may be omitted at the call site.
    pub fn is_optional(&self) -> bool {
        self.default.is_some() || self.is_params
    }
}

/// One declared member.
#[derive(Debug, Clone)]
pub struct MemberEntry {
    pub name: String,
    pub kind: MemberKind,
    pub visibility: Visibility,
    pub is_static: bool,
    /// Interface this member explicitly implements. Explicit members are
    /// reachable only through that interface.
    pub explicit_interface: Option<TypeHash>,
    /// Field, property, indexer or event type; method return type; the
    /// nested type for nested types.
    pub data_type: DataType,
    pub params: Vec<Param>,
    pub generic_params: Vec<GenericParam>,
    pub can_read: bool,
    pub can_write: bool,
    /// Results expose the runtime type instead of the declared type.
    pub expose_runtime_type: bool,
    pub is_virtual: bool,
    /// Static method extending the type of its first parameter.
    pub is_extension: bool,
    /// Self-introspection member, blocked unless reflection is allowed.
    pub is_reflective: bool,
    /// Initial value of static fields, and the value of constants.
    pub initial_value: Option<Value>,
    pub implementation: MemberImpl,
}

impl MemberEntry {
    fn base(
        name: impl Into<String>,
        kind: MemberKind,
        data_type: DataType,
        implementation: MemberImpl,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            visibility: Visibility::Public,
            is_static: false,
            explicit_interface: None,
            data_type,
            params: Vec::new(),
            generic_params: Vec::new(),
            can_read: true,
            can_write: true,
            expose_runtime_type: false,
            is_virtual: false,
            is_extension: false,
            is_reflective: false,
            initial_value: None,
            implementation,
        }
    }

    /// A read-write field stored in the object.
    pub fn field(name: impl Into<String>, data_type: DataType) -> Self {
        Self::base(name, MemberKind::Field, data_type, MemberImpl::Storage)
    }

    /// A property. Readability and writability follow the accessors given.
    pub fn property(
        name: impl Into<String>,
        data_type: DataType,
        getter: Option<NativeFn>,
        setter: Option<NativeFn>,
    ) -> Self {
        let can_read = getter.is_some();
        let can_write = setter.is_some();
        let mut entry = Self::base(
            name,
            MemberKind::Property,
            data_type,
            MemberImpl::Accessors { getter, setter },
        );
        entry.can_read = can_read;
        entry.can_write = can_write;
        entry
    }

    /// An indexer named `Item`.
    pub fn indexer(
        params: Vec<Param>,
        data_type: DataType,
        getter: Option<NativeFn>,
        setter: Option<NativeFn>,
    ) -> Self {
        let mut entry = Self::property("Item", data_type, getter, setter);
        entry.kind = MemberKind::Indexer;
        entry.params = params;
        entry
    }

    /// A method.
    pub fn method(
        name: impl Into<String>,
        params: Vec<Param>,
        return_type: DataType,
        body: NativeFn,
    ) -> Self {
        let mut entry = Self::base(
            name,
            MemberKind::Method,
            return_type,
            MemberImpl::Method(body),
        );
        entry.params = params;
        entry.can_write = false;
        entry
    }

    /// An interface or abstract method without a body.
    pub fn abstract_method(
        name: impl Into<String>,
        params: Vec<Param>,
        return_type: DataType,
    ) -> Self {
        let mut entry = Self::base(name, MemberKind::Method, return_type, MemberImpl::Abstract);
        entry.params = params;
        entry.can_write = false;
        entry.is_virtual = true;
        entry
    }

    /// An interface or abstract property without accessors of its own.
    pub fn abstract_property(
        name: impl Into<String>,
        data_type: DataType,
        can_read: bool,
        can_write: bool,
    ) -> Self {
        let mut entry = Self::base(name, MemberKind::Property, data_type, MemberImpl::Abstract);
        entry.can_read = can_read;
        entry.can_write = can_write;
        entry.is_virtual = true;
        entry
    }

    /// An event.
    pub fn event(name: impl Into<String>) -> Self {
        let mut entry = Self::base(
            name,
            MemberKind::Event,
            DataType::simple(primitives::EVENT),
            MemberImpl::Event,
        );
        entry.can_write = false;
        entry
    }

    /// A nested type declaration. Nested types live on the static side.
    pub fn nested_type(name: impl Into<String>, nested: TypeHash) -> Self {
        let mut entry = Self::base(
            name,
            MemberKind::NestedType,
            DataType::simple(primitives::TYPE),
            MemberImpl::Nested(nested),
        );
        entry.is_static = true;
        entry.can_write = false;
        entry
    }

    // === Builder methods ===

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.can_write = false;
        self
    }

    pub fn with_explicit_interface(mut self, interface: TypeHash) -> Self {
        self.explicit_interface = Some(interface);
        self
    }

    pub fn with_generic_params(mut self, generic_params: Vec<GenericParam>) -> Self {
        self.generic_params = generic_params;
        self
    }

    pub fn exposing_runtime_type(mut self) -> Self {
        self.expose_runtime_type = true;
        self
    }

    pub fn as_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Mark a static method as an extension of its first parameter's type.
    pub fn as_extension(mut self) -> Self {
        self.is_extension = true;
        self.is_static = true;
        self
    }

    pub fn as_reflective(mut self) -> Self {
        self.is_reflective = true;
        self
    }

    pub fn with_initial_value(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    // === Queries ===

    /// Number of generic type parameters.
    pub fn generic_arity(&self) -> usize {
        self.generic_params.len()
    }

    /// Identity of this member within `declaring_type`.
    ///
    /// Methods and indexers include their parameter shape and generic arity;
    /// explicit interface implementations include the interface.
    pub fn member_hash(&self, declaring_type: TypeHash) -> TypeHash {
        let hash = if self.kind.has_params() {
            let shapes: Vec<TypeHash> = self
                .params
                .iter()
                .map(|p| p.data_type.shape_hash())
                .collect();
            TypeHash::from_method(declaring_type, &self.name, &shapes, self.generic_arity())
        } else {
            TypeHash::from_member(declaring_type, &self.name)
        };
        match self.explicit_interface {
            Some(iface) => TypeHash::from_explicit(declaring_type, iface, hash),
            None => hash,
        }
    }

    /// Owner-independent overload shape: two members with equal shapes
    /// conflict (in one type) or hide each other (across a hierarchy).
    pub fn shape_hash(&self) -> TypeHash {
        self.member_hash(TypeHash::EMPTY)
    }

    /// Minimum number of arguments a call must supply.
    pub fn required_params(&self) -> usize {
        self.params.iter().take_while(|p| !p.is_optional()).count()
    }

    /// Check if the last parameter is a params-array.
    pub fn has_params_array(&self) -> bool {
        self.params.last().is_some_and(|p| p.is_params)
    }
}
