//! Candidate selection.
//!
//! Gathers the members a bind may resolve to: same-named visible members of
//! the target type, explicit interface implementations when the access path
//! carries the interface, and extension methods from companion scopes.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use hostbind_core::{AccessContext, BindError, DataType, MemberKind, MetadataProvider, TypeHash};

use crate::access::{VisibleMemberSet, is_visible};
use crate::catalog::{CatalogCache, MemberCatalog, MemberDescriptor};
use crate::conversion::{ConversionKind, find_conversion};

/// Same-named visible members on one side, most-derived first.
///
/// A base declaration with the same shape as a more-derived one is hidden.
pub fn select_candidates(
    visible: &VisibleMemberSet,
    name: &str,
    ignore_case: bool,
    is_static: bool,
    accept: impl Fn(MemberKind) -> bool,
) -> Vec<Arc<MemberDescriptor>> {
    let mut seen = FxHashSet::default();
    visible
        .named(name, ignore_case, is_static)
        .filter(|m| accept(m.kind()) && seen.insert(m.shape()))
        .cloned()
        .collect()
}

/// Explicit implementations of `interface` (or the interfaces it extends)
/// declared by the runtime type.
pub fn select_explicit_candidates(
    provider: &dyn MetadataProvider,
    runtime_catalog: &MemberCatalog,
    interface: TypeHash,
    name: &str,
    ignore_case: bool,
    accept: impl Fn(MemberKind) -> bool,
) -> Vec<Arc<MemberDescriptor>> {
    let mut seen = FxHashSet::default();
    std::iter::once(interface)
        .chain(provider.ancestors(interface))
        .flat_map(|iface| runtime_catalog.explicit_members(iface, name, ignore_case))
        .filter(|m| accept(m.kind()) && seen.insert(m.shape()))
        .cloned()
        .collect()
}

/// Extension methods named `name` whose first parameter accepts `receiver`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn select_extension_candidates(
    provider: &dyn MetadataProvider,
    catalogs: &CatalogCache,
    receiver: DataType,
    name: &str,
    ignore_case: bool,
    context: AccessContext,
) -> Result<Vec<Arc<MemberDescriptor>>, BindError> {
    let mut candidates = Vec::new();
    for &scope in provider.extension_scopes() {
        let catalog = catalogs.catalog_for(provider, scope)?;
        candidates.extend(
            catalog
                .static_members()
                .iter()
                .filter(|m| {
                    m.kind() == MemberKind::Method
                        && m.is_extension()
                        && m.is_named(name, ignore_case)
                        && is_visible(provider, m, context)
                        && m.params()
                            .first()
                            .is_some_and(|p| accepts_receiver(provider, receiver, p.data_type))
                })
                .cloned(),
        );
    }
    Ok(candidates)
}

/// Check if a receiver can bind to an extension method's first parameter:
/// the same type, a base or interface of it, or a generic parameter.
pub fn accepts_receiver(
    provider: &dyn MetadataProvider,
    receiver: DataType,
    param: DataType,
) -> bool {
    if param.is_generic() {
        return param.is_array == receiver.is_array;
    }
    find_conversion(&receiver, &param, provider).is_some_and(|conv| {
        matches!(
            conv.kind,
            ConversionKind::Identity | ConversionKind::ReferenceCast { .. } | ConversionKind::Boxing
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbind_core::{
        CallContext, MemberEntry, NativeFn, Param, Value, Visibility, primitives,
    };
    use hostbind_registry::{TypeBuilder, TypeRegistry};

    fn noop() -> NativeFn {
        NativeFn::new(|_: &mut CallContext| Ok(Value::Void))
    }

    fn method(name: &str, params: Vec<Param>) -> MemberEntry {
        MemberEntry::method(name, params, DataType::void(), noop())
    }

    fn int_param() -> Param {
        Param::new("x", DataType::simple(primitives::INT32))
    }

    #[test]
    fn derived_declaration_hides_base() {
        let mut registry = TypeRegistry::with_primitives();
        let base = TypeBuilder::class("Base")
            .member(method("Run", vec![int_param()]))
            .member(method("Run", vec![]))
            .register(&mut registry)
            .unwrap();
        let derived = TypeBuilder::class("Derived")
            .extends(base)
            .member(method("Run", vec![int_param()]))
            .register(&mut registry)
            .unwrap();

        let catalog = MemberCatalog::build(&registry, derived).unwrap();
        let visible = VisibleMemberSet::filter(&catalog, &registry, AccessContext::NONE);
        let is_method = |k: MemberKind| k == MemberKind::Method;
        let candidates = select_candidates(&visible, "Run", false, false, is_method);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].declaring_type(), derived);
        assert_eq!(candidates[1].declaring_type(), base);
        assert!(candidates[1].params().is_empty());
    }

    #[test]
    fn invisible_derived_member_does_not_hide() {
        let mut registry = TypeRegistry::with_primitives();
        let base = TypeBuilder::class("Base")
            .member(method("Run", vec![]))
            .register(&mut registry)
            .unwrap();
        let derived = TypeBuilder::class("Derived")
            .extends(base)
            .member(method("Run", vec![]).with_visibility(Visibility::Private))
            .register(&mut registry)
            .unwrap();

        let catalog = MemberCatalog::build(&registry, derived).unwrap();
        let visible = VisibleMemberSet::filter(&catalog, &registry, AccessContext::NONE);
        let candidates = select_candidates(&visible, "Run", false, false, |_| true);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].declaring_type(), base);
    }

    #[test]
    fn ignore_case_lookup() {
        let mut registry = TypeRegistry::with_primitives();
        let widget = TypeBuilder::class("Widget")
            .member(method("Run", vec![]))
            .register(&mut registry)
            .unwrap();
        let catalog = MemberCatalog::build(&registry, widget).unwrap();
        let visible = VisibleMemberSet::filter(&catalog, &registry, AccessContext::NONE);
        assert!(select_candidates(&visible, "run", false, false, |_| true).is_empty());
        assert_eq!(
            select_candidates(&visible, "run", true, false, |_| true).len(),
            1
        );
    }

    #[test]
    fn extensions_match_through_interfaces() {
        let mut registry = TypeRegistry::with_primitives();
        let named = TypeBuilder::interface("INamed")
            .register(&mut registry)
            .unwrap();
        let person = TypeBuilder::class("Person")
            .implements(named)
            .register(&mut registry)
            .unwrap();
        let rock = TypeBuilder::class("Rock").register(&mut registry).unwrap();
        let target = Param::new("target", DataType::simple(named));
        let number = Param::new("n", DataType::simple(primitives::INT32));
        let scope = TypeBuilder::class("NamedExtensions")
            .member(method("Shout", vec![target]).as_extension())
            .member(method("Shout", vec![number]))
            .register(&mut registry)
            .unwrap();
        registry.register_extension_scope(scope).unwrap();

        let catalogs = CatalogCache::new();
        let found = select_extension_candidates(
            &registry,
            &catalogs,
            DataType::simple(person),
            "Shout",
            false,
            AccessContext::NONE,
        )
        .unwrap();
        assert_eq!(found.len(), 1);

        let none = select_extension_candidates(
            &registry,
            &catalogs,
            DataType::simple(rock),
            "Shout",
            false,
            AccessContext::NONE,
        )
        .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn generic_receivers() {
        let registry = TypeRegistry::with_primitives();
        let t = DataType::generic(0);
        let t_array = DataType::array_of(TypeHash::generic_param(0));
        assert!(accepts_receiver(&registry, DataType::simple(primitives::STRING), t));
        assert!(
            !accepts_receiver(&registry, DataType::simple(primitives::STRING), t_array)
        );
        assert!(accepts_receiver(&registry, DataType::array_of(primitives::INT32), t_array));
    }

    #[test]
    fn numeric_conversions_do_not_extend() {
        let registry = TypeRegistry::with_primitives();
        assert!(!accepts_receiver(
            &registry,
            DataType::simple(primitives::INT32),
            DataType::simple(primitives::INT64)
        ));
    }
}
