//! Access context filtering.
//!
//! Members are visible according to their declared [`Visibility`] and the
//! [`AccessContext`] of the bind:
//!
//! | Visibility | Visible when |
//! |------------|--------------|
//! | public | always |
//! | internal | the context type is in the declaring module |
//! | protected | the context type, or a type containing it, derives from the declaring type |
//! | protected internal | either of the above |
//! | private | the context type is exactly the declaring type |
//!
//! Without a context only public members are visible.

use std::sync::Arc;

use hostbind_core::{AccessContext, MetadataProvider, TypeHash, Visibility};

use crate::catalog::{MemberCatalog, MemberDescriptor};

/// Check if `member` is visible from `context`.
pub fn is_visible(
    provider: &dyn MetadataProvider,
    member: &MemberDescriptor,
    context: AccessContext,
) -> bool {
    let visibility = member.visibility();
    if visibility == Visibility::Public {
        return true;
    }
    let Some(ctx) = context.type_hash() else {
        return false;
    };

    match visibility {
        Visibility::Public => true,
        Visibility::Internal => same_module(provider, ctx, member),
        Visibility::Protected => derives_from_declaring(provider, ctx, member.declaring_type()),
        Visibility::ProtectedOrInternal => {
            same_module(provider, ctx, member)
                || derives_from_declaring(provider, ctx, member.declaring_type())
        }
        Visibility::Private => ctx == member.declaring_type(),
    }
}

fn same_module(provider: &dyn MetadataProvider, ctx: TypeHash, member: &MemberDescriptor) -> bool {
    provider
        .type_entry(ctx)
        .is_some_and(|e| e.module == member.declaring_module())
}

/// The context or one of its containing types derives from `declaring`.
fn derives_from_declaring(
    provider: &dyn MetadataProvider,
    ctx: TypeHash,
    declaring: TypeHash,
) -> bool {
    let mut current = Some(ctx);
    let mut steps = 0;
    while let Some(hash) = current {
        if provider.is_assignable_to(hash, declaring) {
            return true;
        }
        steps += 1;
        if steps > 256 {
            return false;
        }
        current = provider.type_entry(hash).and_then(|e| e.declaring_type);
    }
    false
}

/// The members of one catalog visible from one access context.
///
/// Explicit interface implementations are never part of the set; they are
/// reached through [`MemberCatalog::explicit_members`] when the access path
/// carries the interface.
#[derive(Debug, Clone)]
pub struct VisibleMemberSet {
    type_hash: TypeHash,
    instance: Vec<Arc<MemberDescriptor>>,
    statics: Vec<Arc<MemberDescriptor>>,
}

impl VisibleMemberSet {
    /// Filter `catalog` down to what `context` may see.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn filter(
        catalog: &MemberCatalog,
        provider: &dyn MetadataProvider,
        context: AccessContext,
    ) -> Self {
        let keep = |side: &[Arc<MemberDescriptor>]| -> Vec<Arc<MemberDescriptor>> {
            side.iter()
                .filter(|m| is_visible(provider, m, context))
                .cloned()
                .collect()
        };
        Self {
            type_hash: catalog.type_hash(),
            instance: keep(catalog.instance_members()),
            statics: keep(catalog.static_members()),
        }
    }

    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// Visible members on one side, most-derived first.
    pub fn members(&self, is_static: bool) -> &[Arc<MemberDescriptor>] {
        if is_static {
            &self.statics
        } else {
            &self.instance
        }
    }

    /// Visible members on one side answering to `name`.
    pub fn named<'a>(
        &'a self,
        name: &'a str,
        ignore_case: bool,
        is_static: bool,
    ) -> impl Iterator<Item = &'a Arc<MemberDescriptor>> + 'a {
        self.members(is_static)
            .iter()
            .filter(move |m| m.is_named(name, ignore_case))
    }

    /// Every visible member, instance side first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MemberDescriptor>> {
        self.instance.iter().chain(&self.statics)
    }

    pub fn len(&self) -> usize {
        self.instance.len() + self.statics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
