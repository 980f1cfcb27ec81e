//! The engine facade script runtimes talk to.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use hostbind_binder::{Binder, BoundAccessor, CacheStats, INDEXER_NAME};
use hostbind_core::{
    AccessContext, BindError, BindFlags, BindSettings, MemberKind, RegistrationError, TypeHash,
    Value,
};
use hostbind_registry::TypeRegistry;

use crate::error::Result;

/// Owns a validated registry, the binder over it, and the engine-wide
/// settings.
///
/// Settings changes take effect for the next bind. Accessors already bound
/// keep the settings they were bound under, and the bind cache keys on them,
/// so changing the access context never reuses a resolution made under a
/// different one.
pub struct Engine {
    registry: Arc<TypeRegistry>,
    binder: Binder,
    settings: RwLock<BindSettings>,
}

impl Engine {
    /// Validate `registry` and build an engine over it. Settings start from
    /// the process-wide default.
    pub fn new(registry: TypeRegistry) -> Result<Self> {
        let errors = registry.validate();
        if let Some(first) = errors.into_iter().next() {
            return Err(first.into());
        }

        debug!(types = registry.type_count(), "engine created");
        let registry = Arc::new(registry);
        Ok(Self {
            binder: Binder::new(registry.clone()),
            registry,
            settings: RwLock::new(BindSettings::process_default()),
        })
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    // === Settings ===

    /// Snapshot of the current settings.
    pub fn settings(&self) -> BindSettings {
        *self.settings.read()
    }

    pub fn set_settings(&self, settings: BindSettings) {
        *self.settings.write() = settings;
    }

    /// Set the type whose private and protected members become visible.
    pub fn set_access_context(&self, context: AccessContext) {
        self.settings.write().access_context = context;
    }

    pub fn set_disable_type_restriction(&self, disable: bool) {
        self.settings.write().disable_type_restriction = disable;
    }

    pub fn set_disable_list_index_type_restriction(&self, disable: bool) {
        self.settings.write().disable_list_index_type_restriction = disable;
    }

    pub fn set_allow_reflection(&self, allow: bool) {
        self.settings.write().allow_reflection = allow;
    }

    // === Binding ===

    /// Bind under the current settings.
    pub fn bind(
        &self,
        target: &Value,
        name: &str,
        type_args: &[TypeHash],
        args: &[Value],
        flags: BindFlags,
    ) -> std::result::Result<Arc<BoundAccessor>, BindError> {
        self.binder.bind(target, name, type_args, args, self.settings(), flags)
    }

    /// Read a field, property or event. Type values read static members.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn get_property(&self, target: &Value, name: &str) -> Result<Value> {
        let accessor = self.bind(target, name, &[], &[], BindFlags::GET_MEMBER)?;
        Ok(self.binder.get(&accessor, target, &[])?)
    }

    /// Write a field or property. Type values write static members.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn set_property(&self, target: &Value, name: &str, value: Value) -> Result<()> {
        let accessor = self.bind(target, name, &[], &[], BindFlags::SET_MEMBER)?;
        Ok(self.binder.set(&accessor, target, &[], value)?)
    }

    /// Call a method.
    pub fn invoke_method(&self, target: &Value, name: &str, args: &[Value]) -> Result<Value> {
        self.invoke_generic(target, name, &[], args)
    }

    /// Call a method with explicit generic type arguments.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke_generic(
        &self,
        target: &Value,
        name: &str,
        type_args: &[TypeHash],
        args: &[Value],
    ) -> Result<Value> {
        let accessor = self.bind(target, name, type_args, args, BindFlags::INVOKE_METHOD)?;
        Ok(self.binder.invoke(&accessor, target, args)?)
    }

    /// Read through an indexer, or an array element.
    pub fn get_index(&self, target: &Value, index_args: &[Value]) -> Result<Value> {
        let accessor = self.bind(target, INDEXER_NAME, &[], index_args, BindFlags::GET_MEMBER)?;
        Ok(self.binder.get(&accessor, target, index_args)?)
    }

    /// Write through an indexer, or an array element.
    pub fn set_index(&self, target: &Value, index_args: &[Value], value: Value) -> Result<()> {
        let accessor = self.bind(target, INDEXER_NAME, &[], index_args, BindFlags::SET_MEMBER)?;
        Ok(self.binder.set(&accessor, target, index_args, value)?)
    }

    // === Introspection ===

    /// Members of `type_hash` visible under the current settings.
    pub fn enumerate_members(&self, type_hash: TypeHash) -> Result<Vec<(String, MemberKind)>> {
        Ok(self.binder.enumerate_visible_members(type_hash, &self.settings())?)
    }

    /// Members reachable from `target`, honouring its view.
    pub fn enumerate_target_members(&self, target: &Value) -> Result<Vec<(String, MemberKind)>> {
        Ok(self.binder.enumerate_target_members(target, &self.settings())?)
    }

    /// View `value` as one of its base classes or interfaces.
    pub fn view_as(&self, value: &Value, type_hash: TypeHash) -> Result<Value> {
        Ok(self.binder.view_as(value, type_hash)?)
    }

    /// A type value for `name`, for static member access.
    pub fn type_value(&self, name: &str) -> Result<Value> {
        self.registry
            .get_by_name(name)
            .map(|entry| Value::Type(entry.type_hash))
            .ok_or_else(|| RegistrationError::TypeNotFound(name.to_string()).into())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.binder.cache_stats()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("types", &self.registry.type_count())
            .field("settings", &self.settings())
            .field("binder", &self.binder)
            .finish()
    }
}
