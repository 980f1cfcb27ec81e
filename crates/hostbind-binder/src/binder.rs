//! The binder facade.
//!
//! [`Binder::bind`] turns a dynamic member access into a cached
//! [`BoundAccessor`]; [`Binder::get`], [`Binder::set`] and [`Binder::invoke`]
//! execute it against a target value.
//!
//! ## Pipeline
//!
//! ```text
//! bind(target, name, type_args, args, settings, flags)
//!   -> BindSignature -> BindCache
//!      miss: catalog -> visibility filter -> candidates
//!            -> generic resolution -> overload ranking -> enforcement
//! ```
//!
//! Execution coerces every argument before the host callable runs, writes
//! `ref`/`out` cells back afterwards, and restricts the result to its
//! declared type.

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use tracing::{debug, trace};

use hostbind_core::{
    AccessDeniedReason, ArrayRef, BindError, BindFlags, BindSettings, CallContext, DataType,
    EventSource, MemberImpl, MemberKind, MetadataProvider, NativeError, NativeFn, PrimitiveKind,
    TypeHash, TypeKind, Value, Visibility, primitives,
};

use crate::access::VisibleMemberSet;
use crate::cache::{ArgShape, BindCache, BindSignature, CacheStats, TargetShape};
use crate::candidates::{select_candidates, select_explicit_candidates, select_extension_candidates};
use crate::catalog::{CatalogCache, MemberCatalog, MemberDescriptor};
use crate::coercion::{coerce, default_value, prepare_arguments};
use crate::conversion::find_conversion;
use crate::enforcer::{enforce_invoke, enforce_read, enforce_write};
use crate::overload::{OverloadMatch, resolve_overload};
use crate::restriction::restrict_value;

/// Name of the intrinsic array length member.
pub const ARRAY_LENGTH: &str = "Length";
/// Name indexers (and the intrinsic array element accessor) are bound by.
pub const INDEXER_NAME: &str = "Item";

/// What a bind call site does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Set,
    Invoke,
}

impl Operation {
    fn from_flags(flags: BindFlags) -> Result<Self, BindError> {
        if !flags.has_single_operation() {
            return Err(BindError::InvalidTarget(
                "bind flags must select exactly one of get, set or invoke".to_string(),
            ));
        }
        Ok(if flags.contains(BindFlags::GET_MEMBER) {
            Operation::Get
        } else if flags.contains(BindFlags::SET_MEMBER) {
            Operation::Set
        } else {
            Operation::Invoke
        })
    }
}

/// The member a bind resolved to.
#[derive(Debug, Clone)]
pub enum Binding {
    /// Field, property, event or nested type.
    Data(Arc<MemberDescriptor>),
    /// Indexer with its resolved index parameters.
    Indexer(OverloadMatch),
    /// Method overload. Extension methods take the target as first argument.
    Method {
        matched: OverloadMatch,
        extension: bool,
    },
    /// Intrinsic `Length` of an array.
    ArrayLength,
    /// Intrinsic `Item` of an array.
    ArrayElement { element: TypeHash },
}

/// An immutable, shareable resolution result.
#[derive(Debug, Clone)]
pub struct BoundAccessor {
    name: String,
    operation: Operation,
    settings: BindSettings,
    binding: Binding,
}

impl BoundAccessor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Settings snapshot taken when the accessor was bound.
    pub fn settings(&self) -> &BindSettings {
        &self.settings
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// The bound member, for everything but array intrinsics.
    pub fn member(&self) -> Option<&Arc<MemberDescriptor>> {
        match &self.binding {
            Binding::Data(member) => Some(member),
            Binding::Indexer(matched) | Binding::Method { matched, .. } => Some(&matched.candidate),
            Binding::ArrayLength | Binding::ArrayElement { .. } => None,
        }
    }

    /// The overload resolution result of indexers and methods.
    pub fn overload(&self) -> Option<&OverloadMatch> {
        match &self.binding {
            Binding::Indexer(matched) | Binding::Method { matched, .. } => Some(matched),
            _ => None,
        }
    }

    /// Fixed generic type arguments.
    pub fn type_args(&self) -> &[TypeHash] {
        self.overload().map_or(&[], |m| m.type_args.as_slice())
    }

    pub fn is_extension(&self) -> bool {
        matches!(self.binding, Binding::Method { extension, .. } if extension)
    }

    fn expect_operation(&self, operation: Operation) -> Result<(), BindError> {
        if self.operation == operation {
            Ok(())
        } else {
            Err(BindError::InvalidTarget(format!(
                "accessor for '{}' was bound for {:?}, not {:?}",
                self.name, self.operation, operation
            )))
        }
    }
}

/// Run-time member binder over one metadata provider.
///
/// Catalogs and bound accessors are cached for the lifetime of the binder
/// and shared between threads.
pub struct Binder {
    provider: Arc<dyn MetadataProvider>,
    catalogs: CatalogCache,
    accessors: BindCache<BoundAccessor>,
    /// Static field values, keyed by storage key.
    statics: DashMap<TypeHash, Value, FxBuildHasher>,
    /// Static event sources, keyed by storage key.
    static_events: DashMap<TypeHash, EventSource, FxBuildHasher>,
}

impl Binder {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            provider,
            catalogs: CatalogCache::new(),
            accessors: BindCache::new(),
            statics: DashMap::with_hasher(FxBuildHasher),
            static_events: DashMap::with_hasher(FxBuildHasher),
        }
    }

    pub fn provider(&self) -> &dyn MetadataProvider {
        &*self.provider
    }

    /// The member catalog of `type_hash`, built on first use.
    pub fn catalog_for(&self, type_hash: TypeHash) -> Result<Arc<MemberCatalog>, BindError> {
        Ok(self.catalogs.catalog_for(&*self.provider, type_hash)?)
    }

    /// Bind cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.accessors.stats()
    }

    /// Number of member catalogs built so far.
    pub fn catalog_count(&self) -> usize {
        self.catalogs.len()
    }

    // ==========================================================================
    // Binding
    // ==========================================================================

    /// Resolve a member access.
    ///
    /// `args` are the index arguments of a get/set, or the call arguments of
    /// an invoke (leading type markers included). Only their runtime types
    /// take part in resolution.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn bind(
        &self,
        target: &Value,
        name: &str,
        type_args: &[TypeHash],
        args: &[Value],
        settings: BindSettings,
        flags: BindFlags,
    ) -> Result<Arc<BoundAccessor>, BindError> {
        let operation = Operation::from_flags(flags)?;
        let shape = TargetShape::of(target).ok_or_else(|| {
            BindError::InvalidTarget(format!(
                "cannot bind '{name}' on {}",
                self.provider.data_type_name(&target.runtime_type())
            ))
        })?;

        let signature = BindSignature::new(settings, flags, shape, name, type_args, args);
        self.accessors
            .lookup_or_resolve(signature, |sig| self.resolve(sig, operation))
    }

    fn resolve(
        &self,
        sig: &BindSignature,
        operation: Operation,
    ) -> Result<BoundAccessor, BindError> {
        let is_static = binds_static(sig.flags, &sig.target);
        let ignore_case = sig.flags.contains(BindFlags::IGNORE_CASE);

        let binding = match (sig.target, is_static) {
            (TargetShape::Array { element }, false) => {
                match self.resolve_array(sig, operation, element, ignore_case)? {
                    Some(binding) => binding,
                    None => self.resolve_member(sig, operation, is_static, ignore_case)?,
                }
            }
            _ => self.resolve_member(sig, operation, is_static, ignore_case)?,
        };

        trace!(member = %sig.name, ?operation, target = ?sig.target, "bound member");
        Ok(BoundAccessor {
            name: sig.name.clone(),
            operation,
            settings: sig.settings,
            binding,
        })
    }

    fn resolve_array(
        &self,
        sig: &BindSignature,
        operation: Operation,
        element: TypeHash,
        ignore_case: bool,
    ) -> Result<Option<Binding>, BindError> {
        let named = |intrinsic: &str| {
            if ignore_case {
                sig.name.eq_ignore_ascii_case(intrinsic)
            } else {
                sig.name == intrinsic
            }
        };

        if named(ARRAY_LENGTH) && sig.args.is_empty() {
            return match operation {
                Operation::Get => Ok(Some(Binding::ArrayLength)),
                Operation::Set => Err(BindError::ReadOnlyViolation {
                    member: ARRAY_LENGTH.to_string(),
                }),
                Operation::Invoke => Ok(None),
            };
        }

        if named(INDEXER_NAME) && operation != Operation::Invoke {
            let is_index = |a: &ArgShape| {
                a.marker.is_none()
                    && !a.value_type().is_array
                    && PrimitiveKind::from_hash(a.value_type().type_hash)
                        .is_some_and(PrimitiveKind::is_integer)
            };
            if let [index] = sig.args.as_slice()
                && is_index(index)
            {
                return Ok(Some(Binding::ArrayElement { element }));
            }
            return Err(BindError::NoMatchingOverload {
                name: INDEXER_NAME.to_string(),
                args: sig
                    .args
                    .iter()
                    .map(|a| self.provider.data_type_name(&a.data_type))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        Ok(None)
    }

    fn resolve_member(
        &self,
        sig: &BindSignature,
        operation: Operation,
        is_static: bool,
        ignore_case: bool,
    ) -> Result<Binding, BindError> {
        let provider = &*self.provider;
        let settings = &sig.settings;
        let lookup = match (sig.target, is_static) {
            (TargetShape::Type(_), false) => primitives::TYPE,
            (target, _) => target.lookup_type(),
        };
        let catalog = self.catalog_for(lookup)?;
        let visible = VisibleMemberSet::filter(&catalog, provider, settings.access_context);

        match operation {
            Operation::Get | Operation::Set if sig.args.is_empty() => {
                let data = self.candidates(sig, &visible, is_static, ignore_case, |k| {
                    k.is_data() || k == MemberKind::NestedType
                })?;
                let Some(member) = data.into_iter().next() else {
                    return Err(missing_member(
                        &visible,
                        &sig.name,
                        ignore_case,
                        is_static,
                        "a data member",
                    ));
                };
                if operation == Operation::Get {
                    enforce_read(&member)?;
                } else {
                    enforce_write(&member)?;
                }
                enforce_invoke(&member, settings)?;
                Ok(Binding::Data(member))
            }
            Operation::Get | Operation::Set => {
                let indexers = self.candidates(sig, &visible, is_static, ignore_case, |k| {
                    k == MemberKind::Indexer
                })?;
                if indexers.is_empty() {
                    return Err(missing_member(
                        &visible,
                        &sig.name,
                        ignore_case,
                        is_static,
                        "an indexer",
                    ));
                }
                let matched = resolve_overload(provider, &sig.name, &indexers, &[], &sig.args)?;
                if operation == Operation::Get {
                    enforce_read(&matched.candidate)?;
                } else {
                    enforce_write(&matched.candidate)?;
                }
                enforce_invoke(&matched.candidate, settings)?;
                Ok(Binding::Indexer(matched))
            }
            Operation::Invoke => self.resolve_method(sig, &visible, is_static, ignore_case),
        }
    }

    fn resolve_method(
        &self,
        sig: &BindSignature,
        visible: &VisibleMemberSet,
        is_static: bool,
        ignore_case: bool,
    ) -> Result<Binding, BindError> {
        let provider = &*self.provider;
        let methods = self.candidates(sig, visible, is_static, ignore_case, |k| {
            k == MemberKind::Method
        })?;

        let mut instance_error = None;
        if !methods.is_empty() {
            match resolve_overload(provider, &sig.name, &methods, &sig.type_args, &sig.args) {
                Ok(matched) => {
                    enforce_invoke(&matched.candidate, &sig.settings)?;
                    return Ok(Binding::Method {
                        matched,
                        extension: false,
                    });
                }
                Err(err @ BindError::AmbiguousOverload { .. }) => return Err(err),
                Err(err) if !err.is_resolution_failure() => return Err(err),
                Err(err) => instance_error = Some(err),
            }
        }

        // Extension methods are only consulted when no instance overload applies.
        if !is_static {
            let receiver = sig.target.receiver_type();
            let extensions = select_extension_candidates(
                provider,
                &self.catalogs,
                receiver,
                &sig.name,
                ignore_case,
                sig.settings.access_context,
            )?;
            trace!(member = %sig.name, extensions = extensions.len(), "extension candidates");
            if !extensions.is_empty() {
                let mut shapes = Vec::with_capacity(sig.args.len() + 1);
                shapes.push(ArgShape::simple(receiver));
                shapes.extend_from_slice(&sig.args);
                match resolve_overload(provider, &sig.name, &extensions, &sig.type_args, &shapes) {
                    Ok(matched) => {
                        enforce_invoke(&matched.candidate, &sig.settings)?;
                        return Ok(Binding::Method {
                            matched,
                            extension: true,
                        });
                    }
                    Err(err) if methods.is_empty() => return Err(err),
                    Err(_) => {}
                }
            }
        }

        match instance_error {
            Some(err) => Err(err),
            None => Err(missing_member(visible, &sig.name, ignore_case, is_static, "a method")),
        }
    }

    /// Same-named candidates for the bind. Through an interface view, the
    /// runtime type's explicit implementations come first and replace the
    /// interface declarations they implement.
    fn candidates(
        &self,
        sig: &BindSignature,
        visible: &VisibleMemberSet,
        is_static: bool,
        ignore_case: bool,
        accept: impl Fn(MemberKind) -> bool,
    ) -> Result<Vec<Arc<MemberDescriptor>>, BindError> {
        let provider = &*self.provider;
        let mut found = Vec::new();
        if let (
            false,
            TargetShape::Instance {
                runtime,
                view: Some(view),
            },
        ) = (is_static, sig.target)
            && provider.type_kind(view) == Some(TypeKind::Interface)
        {
            let runtime_catalog = self.catalog_for(runtime)?;
            found = select_explicit_candidates(
                provider,
                &runtime_catalog,
                view,
                &sig.name,
                ignore_case,
                &accept,
            );
        }

        let explicit_shapes: FxHashSet<TypeHash> = found.iter().map(|m| m.shape()).collect();
        found.extend(
            select_candidates(visible, &sig.name, ignore_case, is_static, &accept)
                .into_iter()
                .filter(|m| !explicit_shapes.contains(&m.shape())),
        );
        Ok(found)
    }

    // ==========================================================================
    // Execution
    // ==========================================================================

    /// Read through a get accessor. `index_args` are the indexer arguments.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn get(
        &self,
        accessor: &BoundAccessor,
        target: &Value,
        index_args: &[Value],
    ) -> Result<Value, BindError> {
        accessor.expect_operation(Operation::Get)?;
        let provider = &*self.provider;
        let settings = accessor.settings;

        match &accessor.binding {
            Binding::ArrayLength => {
                let array = as_array(target)?;
                Ok(Value::Int32(i32::try_from(array.len()).unwrap_or(i32::MAX)))
            }
            Binding::ArrayElement { element } => {
                let array = as_array(target)?;
                let index = self.array_index(index_args, array.len())?;
                let value = array.get(index).unwrap_or(Value::Null);
                Ok(restrict_value(provider, value, *element, false, &settings, true))
            }
            Binding::Data(member) => {
                let member = self.dispatch(member, target)?;
                let value = self.read_data(&member, target)?;
                Ok(restrict_value(
                    provider,
                    value,
                    member.data_type().type_hash,
                    member.expose_runtime_type(),
                    &settings,
                    false,
                ))
            }
            Binding::Indexer(matched) => {
                let member = self.dispatch(&matched.candidate, target)?;
                let MemberImpl::Accessors {
                    getter: Some(getter), ..
                } = member.implementation()
                else {
                    return Err(no_implementation(provider, &member));
                };
                let mut prepared = prepare_arguments(provider, matched, index_args)?;
                let value = self.call(getter, &member, target, &mut prepared.values, &[])?;
                prepared.write_back();
                Ok(restrict_value(
                    provider,
                    value,
                    matched.return_type.type_hash,
                    member.expose_runtime_type(),
                    &settings,
                    true,
                ))
            }
            Binding::Method { .. } => Err(BindError::InvalidTarget(format!(
                "'{}' is a method and cannot be read",
                accessor.name
            ))),
        }
    }

    /// Write through a set accessor.
    ///
    /// Struct fields are only writable through a by-ref cell holding the struct.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn set(
        &self,
        accessor: &BoundAccessor,
        target: &Value,
        index_args: &[Value],
        value: Value,
    ) -> Result<(), BindError> {
        accessor.expect_operation(Operation::Set)?;
        let provider = &*self.provider;

        match &accessor.binding {
            Binding::ArrayLength => Err(BindError::ReadOnlyViolation {
                member: ARRAY_LENGTH.to_string(),
            }),
            Binding::ArrayElement { element } => {
                let array = as_array(target)?;
                let index = self.array_index(index_args, array.len())?;
                let value = self.coerce_assigned(value, DataType::simple(*element))?;
                if array.set(index, value) {
                    Ok(())
                } else {
                    Err(index_out_of_range(index as i64, array.len()))
                }
            }
            Binding::Data(member) => {
                let member = self.dispatch(member, target)?;
                let value = self.coerce_assigned(value, member.data_type())?;
                self.write_data(&member, target, value)
            }
            Binding::Indexer(matched) => {
                let member = self.dispatch(&matched.candidate, target)?;
                let MemberImpl::Accessors {
                    setter: Some(setter), ..
                } = member.implementation()
                else {
                    return Err(no_implementation(provider, &member));
                };
                let mut prepared = prepare_arguments(provider, matched, index_args)?;
                let value = self.coerce_assigned(value, matched.return_type)?;
                prepared.values.push(value);
                self.call(setter, &member, target, &mut prepared.values, &[])?;
                prepared.write_back();
                Ok(())
            }
            Binding::Method { .. } => Err(BindError::ReadOnlyViolation {
                member: accessor.name.clone(),
            }),
        }
    }

    /// Call through an invoke accessor.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke(
        &self,
        accessor: &BoundAccessor,
        target: &Value,
        args: &[Value],
    ) -> Result<Value, BindError> {
        accessor.expect_operation(Operation::Invoke)?;
        let provider = &*self.provider;
        let Binding::Method { matched, extension } = &accessor.binding else {
            return Err(BindError::InvalidTarget(format!(
                "'{}' is not a method",
                accessor.name
            )));
        };

        let (member, mut prepared) = if *extension {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(target.clone());
            full.extend_from_slice(args);
            (
                Arc::clone(&matched.candidate),
                prepare_arguments(provider, matched, &full)?,
            )
        } else {
            (
                self.dispatch(&matched.candidate, target)?,
                prepare_arguments(provider, matched, args)?,
            )
        };

        let MemberImpl::Method(body) = member.implementation() else {
            return Err(no_implementation(provider, &member));
        };
        let result = self.call(
            body,
            &member,
            target,
            &mut prepared.values,
            &matched.type_args,
        )?;
        prepared.write_back();

        Ok(restrict_value(
            provider,
            result,
            matched.return_type.type_hash,
            member.expose_runtime_type(),
            &accessor.settings,
            false,
        ))
    }

    // ==========================================================================
    // Enumeration and views
    // ==========================================================================

    /// Names and kinds of the members of `type_hash` visible under `settings`,
    /// instance members first. Overloads are listed once.
    pub fn enumerate_visible_members(
        &self,
        type_hash: TypeHash,
        settings: &BindSettings,
    ) -> Result<Vec<(String, MemberKind)>, BindError> {
        let catalog = self.catalog_for(type_hash)?;
        let visible = VisibleMemberSet::filter(&catalog, &*self.provider, settings.access_context);
        Ok(unique_names(visible.iter()))
    }

    /// Members reachable from a target value: static members of a type
    /// value, otherwise the instance members of its exposed type. Array
    /// targets list their intrinsics first.
    pub fn enumerate_target_members(
        &self,
        target: &Value,
        settings: &BindSettings,
    ) -> Result<Vec<(String, MemberKind)>, BindError> {
        let shape = TargetShape::of(target).ok_or_else(|| {
            BindError::InvalidTarget("cannot enumerate members of this value".to_string())
        })?;
        let catalog = self.catalog_for(shape.lookup_type())?;
        let visible = VisibleMemberSet::filter(&catalog, &*self.provider, settings.access_context);
        let is_static = matches!(shape, TargetShape::Type(_));

        let mut members = Vec::new();
        if let TargetShape::Array { .. } = shape {
            members.push((ARRAY_LENGTH.to_string(), MemberKind::Property));
            members.push((INDEXER_NAME.to_string(), MemberKind::Indexer));
        }
        members.extend(unique_names(visible.members(is_static).iter()));
        Ok(members)
    }

    /// View `value` through a base class or interface of its runtime type.
    ///
    /// Objects carry the view into later binds; other values are returned
    /// unchanged when the conversion is valid.
    pub fn view_as(&self, value: &Value, type_hash: TypeHash) -> Result<Value, BindError> {
        let provider = &*self.provider;
        match value {
            Value::Null => Ok(Value::Null),
            Value::Ref(cell) => self.view_as(&cell.get(), type_hash),
            Value::Object(obj) if provider.is_assignable_to(obj.runtime_type(), type_hash) => {
                Ok(Value::Object(obj.with_view(Some(type_hash))))
            }
            other => {
                let target = DataType::simple(type_hash);
                match find_conversion(&other.runtime_type(), &target, provider) {
                    Some(conv) if conv.is_implicit && !matches!(other, Value::Object(_)) => {
                        Ok(other.clone())
                    }
                    _ => Err(BindError::TypeMismatch {
                        expected: provider.type_name(type_hash),
                        actual: provider.data_type_name(&other.runtime_type()),
                    }),
                }
            }
        }
    }

    // ==========================================================================
    // Helpers
    // ==========================================================================

    /// The implementation a virtual, abstract or interface member runs for
    /// the runtime type of `target`.
    fn dispatch(
        &self,
        member: &Arc<MemberDescriptor>,
        target: &Value,
    ) -> Result<Arc<MemberDescriptor>, BindError> {
        let provider = &*self.provider;
        let declared_on_interface =
            provider.type_kind(member.declaring_type()) == Some(TypeKind::Interface);
        let dynamic = member.is_virtual() || member.is_abstract() || declared_on_interface;
        if member.is_static() || !dynamic {
            return Ok(Arc::clone(member));
        }
        let Some(runtime) = runtime_type_of(target) else {
            return Err(BindError::InvalidTarget(format!(
                "'{}' needs an instance",
                member.name()
            )));
        };
        if runtime == member.declaring_type() && !member.is_abstract() {
            return Ok(Arc::clone(member));
        }

        let catalog = self.catalog_for(runtime)?;
        if declared_on_interface
            && let Some(explicit) = catalog.explicit_member_by_shape(
                member.declaring_type(),
                member.name(),
                member.shape(),
            )
        {
            return Ok(Arc::clone(explicit));
        }
        let implementation = catalog.instance_members().iter().find(|m| {
            m.name() == member.name()
                && m.shape() == member.shape()
                && !m.is_abstract()
                && overrides(m, member, declared_on_interface)
        });
        match implementation {
            Some(found) => Ok(Arc::clone(found)),
            None if !member.is_abstract() => Ok(Arc::clone(member)),
            None => Err(no_implementation(provider, member)),
        }
    }

    fn read_data(&self, member: &MemberDescriptor, target: &Value) -> Result<Value, BindError> {
        let provider = &*self.provider;
        match member.implementation() {
            MemberImpl::Nested(nested) => Ok(Value::Type(*nested)),
            MemberImpl::Storage => self.read_field(member, target),
            MemberImpl::Event => Ok(Value::Event(self.event_source(member, target)?)),
            MemberImpl::Accessors {
                getter: Some(getter), ..
            } => self.call(getter, member, target, &mut [], &[]),
            MemberImpl::Accessors { getter: None, .. } => Err(BindError::AccessDenied {
                member: member.name().to_string(),
                reason: AccessDeniedReason::WriteOnly,
            }),
            MemberImpl::Method(_) | MemberImpl::Abstract => {
                Err(no_implementation(provider, member))
            }
        }
    }

    fn read_field(&self, member: &MemberDescriptor, target: &Value) -> Result<Value, BindError> {
        let key = member.storage_key();
        let stored = if member.is_static() {
            self.statics.get(&key).map(|v| v.value().clone())
        } else {
            match target {
                Value::Object(obj) => obj.object().field(key),
                Value::Struct(s) => s.fields.get(&key).cloned(),
                Value::Ref(cell) => return self.read_field(member, &cell.get()),
                _ => return Err(invalid_receiver(member)),
            }
        };
        Ok(stored
            .or_else(|| member.entry().initial_value.clone())
            .unwrap_or_else(|| default_value(&*self.provider, member.data_type())))
    }

    fn write_data(
        &self,
        member: &MemberDescriptor,
        target: &Value,
        value: Value,
    ) -> Result<(), BindError> {
        match member.implementation() {
            MemberImpl::Storage => self.write_field(member, target, value),
            MemberImpl::Accessors {
                setter: Some(setter), ..
            } => {
                self.call(setter, member, target, &mut [value], &[])?;
                Ok(())
            }
            _ => Err(BindError::ReadOnlyViolation {
                member: member.name().to_string(),
            }),
        }
    }

    fn write_field(
        &self,
        member: &MemberDescriptor,
        target: &Value,
        value: Value,
    ) -> Result<(), BindError> {
        let key = member.storage_key();
        if member.is_static() {
            self.statics.insert(key, value);
            return Ok(());
        }
        match target {
            Value::Object(obj) => {
                obj.object().set_field(key, value);
                Ok(())
            }
            Value::Ref(cell) => cell.with_mut(|inner| match inner {
                Value::Struct(s) => {
                    s.fields.insert(key, value);
                    Ok(())
                }
                Value::Object(obj) => {
                    obj.object().set_field(key, value);
                    Ok(())
                }
                _ => Err(invalid_receiver(member)),
            }),
            Value::Struct(_) => Err(BindError::InvalidTarget(format!(
                "cannot assign '{}' on a struct copy; pass the struct by reference",
                member.name()
            ))),
            _ => Err(invalid_receiver(member)),
        }
    }

    fn event_source(
        &self,
        member: &MemberDescriptor,
        target: &Value,
    ) -> Result<EventSource, BindError> {
        let key = member.storage_key();
        if member.is_static() {
            return Ok(self.static_events.entry(key).or_default().value().clone());
        }
        match target {
            Value::Object(obj) => Ok(obj.object().event_source(key)),
            Value::Ref(cell) => self.event_source(member, &cell.get()),
            _ => Err(invalid_receiver(member)),
        }
    }

    /// Call a host callable with the right receiver.
    ///
    /// A struct receiver held in a cell is written back after the call.
    fn call(
        &self,
        body: &NativeFn,
        member: &MemberDescriptor,
        target: &Value,
        args: &mut [Value],
        type_args: &[TypeHash],
    ) -> Result<Value, BindError> {
        if member.is_static() {
            let mut ctx = CallContext::new(None, args, type_args);
            return Ok(body.call(&mut ctx)?);
        }
        match target {
            Value::Null | Value::Void => Err(invalid_receiver(member)),
            Value::Ref(cell) => {
                let mut this = cell.get();
                let mut ctx = CallContext::new(Some(&mut this), args, type_args);
                let result = body.call(&mut ctx)?;
                if matches!(this, Value::Struct(_)) {
                    cell.set(this);
                }
                Ok(result)
            }
            other => {
                let mut this = other.clone();
                let mut ctx = CallContext::new(Some(&mut this), args, type_args);
                Ok(body.call(&mut ctx)?)
            }
        }
    }

    fn coerce_assigned(&self, value: Value, target: DataType) -> Result<Value, BindError> {
        let provider = &*self.provider;
        let plan = find_conversion(&value.runtime_type(), &target, provider);
        coerce(provider, value, target, plan.as_ref())
    }

    fn array_index(&self, index_args: &[Value], length: usize) -> Result<usize, BindError> {
        let [index] = index_args else {
            return Err(BindError::InvalidTarget(format!(
                "array access takes one index, got {}",
                index_args.len()
            )));
        };
        let int64 = DataType::simple(primitives::INT64);
        let index = coerce(&*self.provider, index.clone(), int64, None)?
            .as_integer()
            .unwrap_or(-1);
        match usize::try_from(index) {
            Ok(i) if i < length => Ok(i),
            _ => Err(index_out_of_range(index as i64, length)),
        }
    }
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("catalogs", &self.catalogs.len())
            .field("accessors", &self.accessors.stats())
            .finish_non_exhaustive()
    }
}

fn binds_static(flags: BindFlags, target: &TargetShape) -> bool {
    if flags.contains(BindFlags::STATIC) {
        true
    } else if flags.contains(BindFlags::INSTANCE) {
        false
    } else {
        matches!(target, TargetShape::Type(_))
    }
}

fn runtime_type_of(target: &Value) -> Option<TypeHash> {
    match target {
        Value::Ref(cell) => runtime_type_of(&cell.get()),
        Value::Object(obj) => Some(obj.runtime_type()),
        Value::Array(_) => Some(primitives::OBJECT),
        Value::Null | Value::Void | Value::Type(_) => None,
        other => Some(other.runtime_type().type_hash),
    }
}

/// Whether `candidate` may run in place of `member` on a more derived type.
///
/// Private members never override. A class member is only replaced by a
/// virtual one; a plain same-shape member on a derived type hides it instead.
/// Interface members accept any non-private implementation.
fn overrides(candidate: &MemberDescriptor, member: &MemberDescriptor, interface: bool) -> bool {
    if candidate.declaring_type() == member.declaring_type() {
        return true;
    }
    if candidate.visibility() == Visibility::Private {
        return false;
    }
    interface || candidate.is_virtual()
}

fn as_array(target: &Value) -> Result<ArrayRef, BindError> {
    match target {
        Value::Array(array) => Ok(array.clone()),
        Value::Ref(cell) => as_array(&cell.get()),
        _ => Err(BindError::InvalidTarget("target is not an array".to_string())),
    }
}

fn unique_names<'a>(
    members: impl Iterator<Item = &'a Arc<MemberDescriptor>>,
) -> Vec<(String, MemberKind)> {
    let mut seen = FxHashSet::default();
    members
        .filter(|m| seen.insert((m.name().to_string(), m.kind())))
        .map(|m| (m.name().to_string(), m.kind()))
        .collect()
}

/// Error for a name with no usable member: the wrong kind if a visible member
/// of another kind has the name, not-found otherwise.
fn missing_member(
    visible: &VisibleMemberSet,
    name: &str,
    ignore_case: bool,
    is_static: bool,
    wanted: &str,
) -> BindError {
    match visible.named(name, ignore_case, is_static).next() {
        Some(other) => {
            debug!(member = name, kind = %other.kind(), "member kind does not fit the operation");
            BindError::InvalidTarget(format!("'{name}' is a {}, not {wanted}", other.kind()))
        }
        None => BindError::not_found(name),
    }
}

fn no_implementation(provider: &dyn MetadataProvider, member: &MemberDescriptor) -> BindError {
    BindError::InvalidTarget(format!("no implementation of '{}'", member.describe(provider)))
}

fn invalid_receiver(member: &MemberDescriptor) -> BindError {
    BindError::InvalidTarget(format!("'{}' needs an object receiver", member.name()))
}

fn index_out_of_range(index: i64, length: usize) -> BindError {
    BindError::Native(NativeError::IndexOutOfRange { index, length })
}
