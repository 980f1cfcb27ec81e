//! TypeRegistry - the concrete metadata provider.
//!
//! This module provides [`TypeRegistry`], the storage for every host type the
//! binder can see. Types are stored by `TypeHash` with a name index, and the
//! registry implements [`MetadataProvider`] so a binder can consume it
//! directly.
//!
//! # Thread Safety
//!
//! Registration takes `&mut self` and is expected to happen single-threaded
//! during host setup. Afterwards the registry is read-only and is shared
//! with binders behind an `Arc`.
//!
//! # Example
//!
//! ```
//! use hostbind_registry::TypeRegistry;
//! use hostbind_core::{MetadataProvider, primitives};
//!
//! let registry = TypeRegistry::with_primitives();
//! assert!(registry.get(primitives::INT32).is_some());
//! assert_eq!(registry.type_name(primitives::OBJECT), "object");
//! ```

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use tracing::debug;

use hostbind_core::{
    CallContext, DataType, MemberEntry, MemberKind, MetadataProvider, NativeFn, PrimitiveKind,
    RegistrationError, TypeEntry, TypeHash, TypeKind, Value, primitives,
};

/// Storage for host type metadata.
#[derive(Default)]
pub struct TypeRegistry {
    /// Types by hash (primary storage).
    types: FxHashMap<TypeHash, TypeEntry>,
    /// Qualified name -> hash.
    by_name: FxHashMap<String, TypeHash>,
    /// Companion scopes contributing extension methods, in registration order.
    extension_scopes: Vec<TypeHash>,
}

impl TypeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in types pre-registered: the
    /// primitives, `string`, the `type` marker, and the `object` root.
    pub fn with_primitives() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    fn register_builtins(&mut self) {
        self.insert(object_root());
        for kind in PrimitiveKind::ALL {
            let mut entry = TypeEntry::new(kind.name(), TypeKind::Primitive(kind));
            entry.type_hash = kind.type_hash();
            self.insert(entry);
        }
        let mut string = TypeEntry::new("string", TypeKind::String);
        string.base = Some(primitives::OBJECT);
        self.insert(string);

        let mut marker = TypeEntry::new("type", TypeKind::TypeMarker);
        marker.type_hash = primitives::TYPE;
        self.insert(marker);
    }

    fn insert(&mut self, entry: TypeEntry) {
        self.by_name
            .insert(entry.qualified_name.clone(), entry.type_hash);
        self.types.insert(entry.type_hash, entry);
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a type.
    ///
    /// Classes, structs and enums without a base get the `object` root as
    /// their base. A type with a `declaring_type` is added to its container
    /// as a nested-type member, so the container must be registered first.
    pub fn register_type(&mut self, mut entry: TypeEntry) -> Result<TypeHash, RegistrationError> {
        if self.types.contains_key(&entry.type_hash)
            || self.by_name.contains_key(&entry.qualified_name)
        {
            return Err(RegistrationError::DuplicateType(entry.qualified_name));
        }

        if entry.base.is_none()
            && entry.type_hash != primitives::OBJECT
            && matches!(entry.kind, TypeKind::Class | TypeKind::Struct | TypeKind::Enum { .. })
        {
            entry.base = Some(primitives::OBJECT);
        }

        if let Some(container) = entry.declaring_type {
            let nested = MemberEntry::nested_type(entry.name.clone(), entry.type_hash)
                .with_visibility(entry.visibility);
            let container_entry = self
                .types
                .get_mut(&container)
                .ok_or_else(|| RegistrationError::TypeNotFound(container.to_string()))?;
            container_entry.members.push(nested);
        }

        let hash = entry.type_hash;
        self.insert(entry);
        Ok(hash)
    }

    /// Register a companion scope whose extension methods apply to other types.
    pub fn register_extension_scope(&mut self, scope: TypeHash) -> Result<(), RegistrationError> {
        if !self.types.contains_key(&scope) {
            return Err(RegistrationError::InvalidExtensionScope(scope.to_string()));
        }
        if !self.extension_scopes.contains(&scope) {
            self.extension_scopes.push(scope);
        }
        Ok(())
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Get a type by hash.
    pub fn get(&self, hash: TypeHash) -> Option<&TypeEntry> {
        self.types.get(&hash)
    }

    /// Get a type by qualified name.
    pub fn get_by_name(&self, name: &str) -> Option<&TypeEntry> {
        self.by_name.get(name).and_then(|h| self.types.get(h))
    }

    /// Get a mutable type by hash.
    pub fn get_mut(&mut self, hash: TypeHash) -> Option<&mut TypeEntry> {
        self.types.get_mut(&hash)
    }

    /// Check if a type exists.
    pub fn contains(&self, hash: TypeHash) -> bool {
        self.types.contains_key(&hash)
    }

    /// Iterate all types.
    pub fn types(&self) -> impl Iterator<Item = &TypeEntry> {
        self.types.values()
    }

    /// Number of registered types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    // ==========================================================================
    // Validation
    // ==========================================================================

    /// Check the registered metadata for dangling references, circular
    /// inheritance, duplicate members and malformed declarations.
    ///
    /// Returns every problem found; an empty list means the registry is valid.
    pub fn validate(&self) -> Vec<RegistrationError> {
        let mut errors = Vec::new();

        for entry in self.types.values() {
            self.check_references(entry, &mut errors);
            if let Some(dup) = entry.find_duplicate_member() {
                errors.push(RegistrationError::DuplicateMember {
                    type_name: entry.qualified_name.clone(),
                    member: self.member_signature(dup),
                });
            }
            for member in &entry.members {
                if let Some(reason) = malformed_reason(member) {
                    errors.push(RegistrationError::InvalidMember {
                        type_name: entry.qualified_name.clone(),
                        member: member.name.clone(),
                        reason: reason.to_string(),
                    });
                }
            }
        }

        errors.extend(self.find_inheritance_cycles());

        for error in &errors {
            debug!(%error, "registry validation error");
        }
        errors
    }

    fn check_references(&self, entry: &TypeEntry, errors: &mut Vec<RegistrationError>) {
        let mut require = |hash: TypeHash, what: &str| {
            if !self.is_known(hash) {
                errors.push(RegistrationError::TypeNotFound(format!(
                    "{hash} ({what} of '{}')",
                    entry.qualified_name
                )));
            }
        };

        for parent in entry.bases_and_interfaces() {
            require(parent, "base");
        }
        if let Some(container) = entry.declaring_type {
            require(container, "container");
        }
        for member in &entry.members {
            require(member.data_type.type_hash, "member type");
            for param in &member.params {
                require(param.data_type.type_hash, "parameter type");
            }
            if let Some(iface) = member.explicit_interface {
                require(iface, "explicit interface");
            }
        }
    }

    fn is_known(&self, hash: TypeHash) -> bool {
        hash.is_generic_param()
            || matches!(hash, primitives::VOID | primitives::NULL | primitives::EVENT)
            || self.types.contains_key(&hash)
    }

    /// Strongly connected components of the inheritance graph with more than
    /// one node, or a self edge, are cycles.
    fn find_inheritance_cycles(&self) -> Vec<RegistrationError> {
        let mut graph: DiGraph<TypeHash, ()> = DiGraph::new();
        let mut nodes: FxHashMap<TypeHash, NodeIndex> = FxHashMap::default();
        for &hash in self.types.keys() {
            nodes.insert(hash, graph.add_node(hash));
        }
        for entry in self.types.values() {
            let Some(&from) = nodes.get(&entry.type_hash) else {
                continue;
            };
            for parent in entry.bases_and_interfaces() {
                // dangling parents are reported by check_references
                if let Some(&to) = nodes.get(&parent) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut names: Vec<String> =
                    scc.iter().map(|&n| self.type_name(graph[n])).collect();
                names.sort();
                RegistrationError::CircularInheritance(names.join(", "))
            })
            .collect()
    }
}

fn malformed_reason(member: &MemberEntry) -> Option<&'static str> {
    if member.is_extension && (!member.is_static || member.params.is_empty()) {
        return Some(
            "extension methods must be static with at least one parameter",
        );
    }
    if member.kind == MemberKind::Indexer && member.params.is_empty() {
        return Some("indexers need at least one parameter");
    }
    let params_pos = member.params.iter().position(|p| p.is_params);
    if params_pos.is_some_and(|pos| pos + 1 != member.params.len()) {
        return Some("a params-array must be the last parameter");
    }
    if member
        .params
        .iter()
        .any(|p| p.is_params && !p.data_type.is_array)
    {
        return Some("a params-array parameter must have an array type");
    }
    None
}

/// The root `object` type with its reflective `GetType` method.
fn object_root() -> TypeEntry {
    let mut entry = TypeEntry::new("object", TypeKind::Object);
    entry.type_hash = primitives::OBJECT;
    let get_type = NativeFn::new(|ctx: &mut CallContext| {
        let runtime = match ctx.this() {
            Some(Value::Object(obj)) => obj.runtime_type(),
            Some(other) => other.runtime_type().type_hash,
            None => primitives::OBJECT,
        };
        Ok(Value::Type(runtime))
    });
    entry.members.push(
        MemberEntry::method("GetType", Vec::new(), DataType::simple(primitives::TYPE), get_type)
            .as_reflective(),
    );
    entry
}

impl MetadataProvider for TypeRegistry {
    fn type_entry(&self, type_hash: TypeHash) -> Option<&TypeEntry> {
        self.types.get(&type_hash)
    }

    fn extension_scopes(&self) -> &[TypeHash] {
        &self.extension_scopes
    }
}

// ============================================================================
// Tests
// ============================================================================
