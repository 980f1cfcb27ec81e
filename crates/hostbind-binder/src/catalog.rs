//! Member catalogs.
//!
//! A [`MemberCatalog`] is the normalized member table of one type: the type's
//! own members followed by everything it inherits, most-derived first, each
//! tagged with its declaring type and origin. Explicit interface
//! implementations are kept apart under `(interface, name)` and are only
//! reachable through that interface.
//!
//! Catalogs are built lazily by [`CatalogCache`] and retained for the life of
//! the cache. Malformed metadata (missing or circular bases, conflicting
//! members) is a construction error that is cached like a catalog.

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use tracing::debug;

use hostbind_core::{
    DataType, GenericParam, MemberEntry, MemberImpl, MemberKind, MetadataProvider, ModuleId,
    Param, RegistrationError, TypeEntry, TypeHash, TypeKind, Visibility, primitives,
};

/// Where a catalog entry comes from, relative to the catalog's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberOrigin {
    /// Declared on the catalog's type.
    Own,
    /// Declared on a base class or base interface.
    Inherited,
    /// Interface member with a body, reachable from implementing types.
    InterfaceImplicit,
    /// Explicit implementation, reachable only through the interface.
    InterfaceExplicit(TypeHash),
}

/// One catalog entry.
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    entry: MemberEntry,
    declaring_type: TypeHash,
    declaring_module: ModuleId,
    origin: MemberOrigin,
    member_hash: TypeHash,
    shape: TypeHash,
    depth: u32,
}

impl MemberDescriptor {
    pub fn new(
        entry: MemberEntry,
        declaring: &TypeEntry,
        origin: MemberOrigin,
        depth: u32,
    ) -> Self {
        Self {
            member_hash: entry.member_hash(declaring.type_hash),
            shape: entry.shape_hash(),
            entry,
            declaring_type: declaring.type_hash,
            declaring_module: declaring.module,
            origin,
            depth,
        }
    }

    /// The raw metadata record.
    pub fn entry(&self) -> &MemberEntry {
        &self.entry
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn kind(&self) -> MemberKind {
        self.entry.kind
    }

    pub fn visibility(&self) -> Visibility {
        self.entry.visibility
    }

    pub fn is_static(&self) -> bool {
        self.entry.is_static
    }

    pub fn declaring_type(&self) -> TypeHash {
        self.declaring_type
    }

    pub fn declaring_module(&self) -> ModuleId {
        self.declaring_module
    }

    pub fn origin(&self) -> MemberOrigin {
        self.origin
    }

    /// Identity within the declaring type.
    pub fn member_hash(&self) -> TypeHash {
        self.member_hash
    }

    /// Owner-independent shape used for hiding.
    pub fn shape(&self) -> TypeHash {
        self.shape
    }

    /// Inheritance steps from the catalog's type to the declaring type.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Field, property, indexer or event type; method return type.
    pub fn data_type(&self) -> DataType {
        self.entry.data_type
    }

    pub fn params(&self) -> &[Param] {
        &self.entry.params
    }

    pub fn generic_params(&self) -> &[GenericParam] {
        &self.entry.generic_params
    }

    pub fn generic_arity(&self) -> usize {
        self.entry.generic_arity()
    }

    pub fn can_read(&self) -> bool {
        self.entry.can_read
    }

    pub fn can_write(&self) -> bool {
        self.entry.can_write
    }

    pub fn expose_runtime_type(&self) -> bool {
        self.entry.expose_runtime_type
    }

    pub fn is_virtual(&self) -> bool {
        self.entry.is_virtual
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self.entry.implementation, MemberImpl::Abstract)
    }

    pub fn is_extension(&self) -> bool {
        self.entry.is_extension
    }

    pub fn is_reflective(&self) -> bool {
        self.entry.is_reflective
    }

    pub fn explicit_interface(&self) -> Option<TypeHash> {
        self.entry.explicit_interface
    }

    pub fn implementation(&self) -> &MemberImpl {
        &self.entry.implementation
    }

    /// Slot key of a field or event in host object storage.
    pub fn storage_key(&self) -> TypeHash {
        TypeHash::from_member(self.declaring_type, &self.entry.name)
    }

    /// Check if this member answers to `name`.
    pub fn is_named(&self, name: &str, ignore_case: bool) -> bool {
        if ignore_case {
            self.entry.name.eq_ignore_ascii_case(name)
        } else {
            self.entry.name == name
        }
    }

    /// `Type::Name(int, double)` for diagnostics.
    pub fn describe(&self, provider: &dyn MetadataProvider) -> String {
        format!(
            "{}::{}",
            provider.type_name(self.declaring_type),
            provider.member_signature(&self.entry)
        )
    }
}

/// The member table of one type.
#[derive(Debug)]
pub struct MemberCatalog {
    type_hash: TypeHash,
    instance: Vec<Arc<MemberDescriptor>>,
    statics: Vec<Arc<MemberDescriptor>>,
    explicit: FxHashMap<TypeHash, Vec<Arc<MemberDescriptor>>>,
}

impl MemberCatalog {
    /// Build the catalog of `type_hash`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(
        provider: &dyn MetadataProvider,
        type_hash: TypeHash,
    ) -> Result<Self, RegistrationError> {
        check_hierarchy(provider, type_hash, &mut FxHashMap::default())?;

        let root = provider
            .type_entry(type_hash)
            .ok_or_else(|| RegistrationError::TypeNotFound(provider.type_name(type_hash)))?;

        let mut catalog = MemberCatalog {
            type_hash,
            instance: Vec::new(),
            statics: Vec::new(),
            explicit: FxHashMap::default(),
        };

        if root.is_interface() {
            catalog.add_type(provider, root, 0)?;
            for (depth, ancestor) in (1..).zip(provider.ancestors(type_hash)) {
                catalog.add_ancestor(provider, ancestor, depth)?;
            }
            // interface references still expose the root's members
            if let Some(object) = provider.type_entry(primitives::OBJECT) {
                let depth = catalog.max_depth() + 1;
                catalog.add_type(provider, object, depth)?;
            }
        } else {
            catalog.add_type(provider, root, 0)?;
            let mut depth = 1;
            let mut current = base_class(provider, type_hash);
            while let Some(base) = current {
                catalog.add_ancestor(provider, base, depth)?;
                depth += 1;
                current = base_class(provider, base);
            }
            for ancestor in provider.ancestors(type_hash) {
                if let Some(iface) = provider.type_entry(ancestor).filter(|e| e.is_interface()) {
                    catalog.add_interface_defaults(provider, iface)?;
                }
            }
        }

        Ok(catalog)
    }

    fn add_ancestor(
        &mut self,
        provider: &dyn MetadataProvider,
        ancestor: TypeHash,
        depth: u32,
    ) -> Result<(), RegistrationError> {
        let entry = provider
            .type_entry(ancestor)
            .ok_or_else(|| RegistrationError::TypeNotFound(provider.type_name(ancestor)))?;
        self.add_type(provider, entry, depth)
    }

    /// Add every member declared on `entry`.
    fn add_type(
        &mut self,
        provider: &dyn MetadataProvider,
        entry: &TypeEntry,
        depth: u32,
    ) -> Result<(), RegistrationError> {
        let members = declared_members(provider, entry)?;
        let origin = if depth == 0 {
            MemberOrigin::Own
        } else {
            MemberOrigin::Inherited
        };
        for member in members {
            match member.explicit_interface {
                Some(iface) => {
                    let desc = MemberDescriptor::new(
                        member.clone(),
                        entry,
                        MemberOrigin::InterfaceExplicit(iface),
                        depth,
                    );
                    let slot = self.explicit.entry(iface).or_default();
                    // a derived re-implementation replaces the base one
                    if !slot.iter().any(|m| m.shape == desc.shape) {
                        slot.push(Arc::new(desc));
                    }
                }
                None => {
                    let desc =
                        Arc::new(MemberDescriptor::new(member.clone(), entry, origin, depth));
                    if member.is_static {
                        self.statics.push(desc);
                    } else {
                        self.instance.push(desc);
                    }
                }
            }
        }
        Ok(())
    }

    /// Interface members with a body that the class chain does not declare.
    fn add_interface_defaults(
        &mut self,
        provider: &dyn MetadataProvider,
        iface: &TypeEntry,
    ) -> Result<(), RegistrationError> {
        let members = declared_members(provider, iface)?;
        let depth = self.max_depth() + 1;
        for member in members.iter().filter(|m| {
            !m.is_static
                && m.explicit_interface.is_none()
                && !matches!(m.implementation, MemberImpl::Abstract)
        }) {
            let shape = member.shape_hash();
            if self.instance.iter().any(|m| m.shape == shape) {
                continue;
            }
            self.instance.push(Arc::new(MemberDescriptor::new(
                member.clone(),
                iface,
                MemberOrigin::InterfaceImplicit,
                depth,
            )));
        }
        Ok(())
    }

    fn max_depth(&self) -> u32 {
        self.instance
            .iter()
            .chain(&self.statics)
            .map(|m| m.depth)
            .max()
            .unwrap_or(0)
    }

    /// The type this catalog describes.
    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// Instance members, most-derived first, hidden members included.
    pub fn instance_members(&self) -> &[Arc<MemberDescriptor>] {
        &self.instance
    }

    /// Static members (including nested types), most-derived first.
    pub fn static_members(&self) -> &[Arc<MemberDescriptor>] {
        &self.statics
    }

    /// Members on one side.
    pub fn members(&self, is_static: bool) -> &[Arc<MemberDescriptor>] {
        if is_static {
            &self.statics
        } else {
            &self.instance
        }
    }

    /// Explicit implementations of `interface` named `name`.
    pub fn explicit_members(
        &self,
        interface: TypeHash,
        name: &str,
        ignore_case: bool,
    ) -> impl Iterator<Item = &Arc<MemberDescriptor>> {
        self.explicit
            .get(&interface)
            .into_iter()
            .flatten()
            .filter(move |m| m.is_named(name, ignore_case))
    }

    /// Explicit implementation of `interface` with the given shape.
    pub fn explicit_member_by_shape(
        &self,
        interface: TypeHash,
        name: &str,
        shape: TypeHash,
    ) -> Option<&Arc<MemberDescriptor>> {
        self.explicit
            .get(&interface)?
            .iter()
            .find(|m| m.shape == shape && m.name() == name)
    }

    /// Total number of entries, explicit ones included.
    pub fn len(&self) -> usize {
        let explicit: usize = self.explicit.values().map(Vec::len).sum();
        self.instance.len() + self.statics.len() + explicit
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first walk over bases and interfaces, rejecting cycles and
/// missing ancestors.
fn check_hierarchy(
    provider: &dyn MetadataProvider,
    type_hash: TypeHash,
    marks: &mut FxHashMap<TypeHash, Mark>,
) -> Result<(), RegistrationError> {
    match marks.get(&type_hash) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            return Err(RegistrationError::CircularInheritance(provider.type_name(type_hash)));
        }
        None => {}
    }
    if provider.type_entry(type_hash).is_none() {
        return Err(RegistrationError::TypeNotFound(provider.type_name(type_hash)));
    }
    marks.insert(type_hash, Mark::Visiting);
    for parent in provider.bases_and_interfaces(type_hash) {
        check_hierarchy(provider, parent, marks)?;
    }
    marks.insert(type_hash, Mark::Done);
    Ok(())
}

/// The base class among the provider's direct parents.
fn base_class(provider: &dyn MetadataProvider, type_hash: TypeHash) -> Option<TypeHash> {
    provider
        .bases_and_interfaces(type_hash)
        .into_iter()
        .find(|&parent| provider.type_kind(parent) != Some(TypeKind::Interface))
}

/// Members the provider declares on `entry`, rejecting conflicting shapes.
fn declared_members<'p>(
    provider: &'p dyn MetadataProvider,
    entry: &TypeEntry,
) -> Result<&'p [MemberEntry], RegistrationError> {
    let members = provider
        .declared_members(entry.type_hash)
        .unwrap_or_default();
    let mut seen = FxHashSet::default();
    match members.iter().find(|m| !seen.insert(m.shape_hash())) {
        Some(dup) => Err(RegistrationError::DuplicateMember {
            type_name: entry.qualified_name.clone(),
            member: provider.member_signature(dup),
        }),
        None => Ok(members),
    }
}

/// Lazily built, shared member catalogs.
#[derive(Debug, Default)]
pub struct CatalogCache {
    catalogs: DashMap<TypeHash, Result<Arc<MemberCatalog>, RegistrationError>, FxBuildHasher>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog of `type_hash`, building it on first use.
    ///
    /// Concurrent first callers may each build a catalog; the first one
    /// installed is retained and returned to all of them.
    pub fn catalog_for(
        &self,
        provider: &dyn MetadataProvider,
        type_hash: TypeHash,
    ) -> Result<Arc<MemberCatalog>, RegistrationError> {
        if let Some(cached) = self.catalogs.get(&type_hash) {
            return cached.value().clone();
        }

        let built = MemberCatalog::build(provider, type_hash).map(Arc::new);
        match &built {
            Ok(catalog) => debug!(
                type_hash = %type_hash,
                members = catalog.len(),
                "built member catalog"
            ),
            Err(error) => {
                debug!(type_hash = %type_hash, %error, "member catalog construction failed")
            }
        }
        self.catalogs.entry(type_hash).or_insert(built).value().clone()
    }

    /// Number of catalogs (and recorded failures) retained.
    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}
