//! TypeBuilder for describing host types.
//!
//! TypeBuilder provides a fluent API for assembling a [`TypeEntry`] with its
//! members, then registering it.
//!
//! # Example
//!
//! ```
//! use hostbind_core::{CallContext, DataType, MemberEntry, Value, Visibility, primitives};
//! use hostbind_registry::{TypeBuilder, TypeRegistry};
//!
//! let mut registry = TypeRegistry::with_primitives();
//! let widget = TypeBuilder::class("Ui::Widget")
//!     .field("Width", DataType::simple(primitives::INT32))
//!     .member(
//!         MemberEntry::field("id", DataType::simple(primitives::INT64))
//!             .with_visibility(Visibility::Private),
//!     )
//!     .method("Area", vec![], DataType::simple(primitives::INT32), |_: &mut CallContext| {
//!         Ok(Value::Int32(0))
//!     })
//!     .register(&mut registry)
//!     .unwrap();
//! assert_eq!(registry.get(widget).unwrap().members.len(), 3);
//! ```

use hostbind_core::{
    CallContext, DataType, EnumValue, MemberEntry, ModuleId, NativeError, NativeFn, Param,
    PrimitiveKind, RegistrationError, TypeEntry, TypeHash, TypeKind, Value, Visibility,
};

use crate::TypeRegistry;

/// Fluent builder for a [`TypeEntry`].
#[derive(Debug, Clone)]
pub struct TypeBuilder {
    entry: TypeEntry,
}

impl TypeBuilder {
    /// Start a type of the given kind.
    pub fn new(qualified_name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            entry: TypeEntry::new(qualified_name, kind),
        }
    }

    /// Start a reference type.
    pub fn class(qualified_name: impl Into<String>) -> Self {
        Self::new(qualified_name, TypeKind::Class)
    }

    /// Start a value type.
    pub fn value_type(qualified_name: impl Into<String>) -> Self {
        Self::new(qualified_name, TypeKind::Struct)
    }

    /// Start an interface.
    pub fn interface(qualified_name: impl Into<String>) -> Self {
        Self::new(qualified_name, TypeKind::Interface)
    }

    /// Start an enum with the given underlying integer type.
    pub fn enumeration(qualified_name: impl Into<String>, underlying: PrimitiveKind) -> Self {
        Self::new(qualified_name, TypeKind::Enum { underlying })
    }

    /// The hash the built type will have.
    pub fn type_hash(&self) -> TypeHash {
        self.entry.type_hash
    }

    // === Type attributes ===

    pub fn in_module(mut self, module: ModuleId) -> Self {
        self.entry.module = module;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.entry.visibility = visibility;
        self
    }

    /// Set the base class.
    pub fn extends(mut self, base: TypeHash) -> Self {
        self.entry.base = Some(base);
        self
    }

    /// Add an implemented (or, for interfaces, extended) interface.
    pub fn implements(mut self, interface: TypeHash) -> Self {
        self.entry.interfaces.push(interface);
        self
    }

    /// Declare this type as nested inside `container`.
    pub fn nested_in(mut self, container: TypeHash) -> Self {
        self.entry.declaring_type = Some(container);
        self
    }

    // === Members ===

    /// Add a fully configured member.
    pub fn member(mut self, member: MemberEntry) -> Self {
        self.entry.members.push(member);
        self
    }

    /// Add a public read-write field.
    pub fn field(self, name: impl Into<String>, data_type: DataType) -> Self {
        self.member(MemberEntry::field(name, data_type))
    }

    /// Add a public property backed by closures.
    pub fn property<G, S>(
        self,
        name: impl Into<String>,
        data_type: DataType,
        getter: Option<G>,
        setter: Option<S>,
    ) -> Self
    where
        G: Fn(&mut CallContext) -> Result<Value, NativeError> + Send + Sync + 'static,
        S: Fn(&mut CallContext) -> Result<Value, NativeError> + Send + Sync + 'static,
    {
        self.member(MemberEntry::property(
            name,
            data_type,
            getter.map(NativeFn::new),
            setter.map(NativeFn::new),
        ))
    }

    /// Add a public instance method.
    pub fn method<F>(
        self,
        name: impl Into<String>,
        params: Vec<Param>,
        return_type: DataType,
        body: F,
    ) -> Self
    where
        F: Fn(&mut CallContext) -> Result<Value, NativeError> + Send + Sync + 'static,
    {
        self.member(MemberEntry::method(name, params, return_type, NativeFn::new(body)))
    }

    /// Add a public event.
    pub fn event(self, name: impl Into<String>) -> Self {
        self.member(MemberEntry::event(name))
    }

    /// Add an enum constant, exposed as a public static read-only field.
    pub fn enum_value(mut self, name: impl Into<String>, value: i64) -> Self {
        let name = name.into();
        let type_hash = self.entry.type_hash;
        self.entry
            .enum_values
            .push(EnumValue::new(name.clone(), value));
        self.member(
            MemberEntry::field(name, DataType::simple(type_hash))
                .as_static()
                .read_only()
                .with_initial_value(Value::Enum { type_hash, value }),
        )
    }

    // === Finish ===

    /// Finish without registering.
    pub fn build(self) -> TypeEntry {
        self.entry
    }

    /// Finish and register with `registry`.
    pub fn register(self, registry: &mut TypeRegistry) -> Result<TypeHash, RegistrationError> {
        registry.register_type(self.entry)
    }
}
