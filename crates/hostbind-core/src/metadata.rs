//! The metadata provider interface the binder consumes.
//!
//! A provider answers questions about host types: their entries, declared
//! members, direct bases and interfaces, and which types are companion scopes
//! for extension methods. The hierarchy helpers are provided methods built on
//! those primitives and tolerate malformed (cyclic) metadata.

use rustc_hash::FxHashSet;

use crate::{DataType, MemberEntry, TypeEntry, TypeHash, TypeKind, primitives};

/// Source of host type metadata.
pub trait MetadataProvider: Send + Sync {
    /// Look up a type by hash.
    fn type_entry(&self, type_hash: TypeHash) -> Option<&TypeEntry>;

    /// Companion scopes whose extension methods apply to other types.
    fn extension_scopes(&self) -> &[TypeHash];

    /// Members declared on the type itself (not inherited).
    fn declared_members(&self, type_hash: TypeHash) -> Option<&[MemberEntry]> {
        self.type_entry(type_hash).map(|e| e.members.as_slice())
    }

    /// Direct base class followed by directly implemented interfaces.
    fn bases_and_interfaces(&self, type_hash: TypeHash) -> Vec<TypeHash> {
        self.type_entry(type_hash)
            .map(|e| e.bases_and_interfaces().collect())
            .unwrap_or_default()
    }

    /// Qualified name for diagnostics.
    fn type_name(&self, type_hash: TypeHash) -> String {
        if let Some(position) = type_hash.generic_position() {
            return format!("T{position}");
        }
        match type_hash {
            primitives::VOID => "void".to_string(),
            primitives::NULL => "null".to_string(),
            primitives::EVENT => "event".to_string(),
            _ => self
                .type_entry(type_hash)
                .map(|e| e.qualified_name.clone())
                .unwrap_or_else(|| type_hash.to_string()),
        }
    }

    /// Name of a full data type, with array and nullable suffixes.
    fn data_type_name(&self, data_type: &DataType) -> String {
        let mut name = format!(
            "{}{}",
            data_type.ref_modifier,
            self.type_name(data_type.type_hash)
        );
        if data_type.is_nullable {
            name.push('?');
        }
        if data_type.is_array {
            name.push_str("[]");
        }
        name
    }

    /// `Name(int, double)` for methods and indexers, the bare name otherwise.
    fn member_signature(&self, member: &MemberEntry) -> String {
        if !member.kind.has_params() {
            return member.name.clone();
        }
        let params: Vec<String> = member
            .params
            .iter()
            .map(|p| self.data_type_name(&p.data_type))
            .collect();
        format!("{}({})", member.name, params.join(", "))
    }

    /// Kind of a type, if registered.
    fn type_kind(&self, type_hash: TypeHash) -> Option<TypeKind> {
        self.type_entry(type_hash).map(|e| e.kind)
    }

    /// Check if values of the type are references (accept null).
    fn is_reference_type(&self, type_hash: TypeHash) -> bool {
        self.type_kind(type_hash)
            .is_some_and(TypeKind::is_reference_type)
    }

    /// Check if `type_hash` is or transitively derives from / implements `ancestor`.
    fn is_assignable_to(&self, type_hash: TypeHash, ancestor: TypeHash) -> bool {
        self.inheritance_distance(type_hash, ancestor).is_some()
    }

    /// Number of inheritance steps from `type_hash` up to `ancestor`.
    ///
    /// `Some(0)` for the type itself, `None` when unrelated. Breadth-first,
    /// so the shortest path through bases and interfaces wins.
    fn inheritance_distance(&self, type_hash: TypeHash, ancestor: TypeHash) -> Option<u32> {
        if type_hash == ancestor {
            return Some(0);
        }
        let mut visited = FxHashSet::default();
        let mut frontier = vec![type_hash];
        let mut distance = 0;
        while !frontier.is_empty() {
            distance += 1;
            let mut next = Vec::new();
            for current in frontier {
                if !visited.insert(current) {
                    continue;
                }
                for parent in self.bases_and_interfaces(current) {
                    if parent == ancestor {
                        return Some(distance);
                    }
                    next.push(parent);
                }
            }
            frontier = next;
        }
        None
    }

    /// Every ancestor (bases and interfaces), nearest first, each listed once.
    fn ancestors(&self, type_hash: TypeHash) -> Vec<TypeHash> {
        let mut seen = FxHashSet::default();
        seen.insert(type_hash);
        let mut out = Vec::new();
        let mut frontier = vec![type_hash];
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for current in frontier {
                for parent in self.bases_and_interfaces(current) {
                    if seen.insert(parent) {
                        out.push(parent);
                        next.push(parent);
                    }
                }
            }
            frontier = next;
        }
        out
    }

    /// Check if `type_hash` is `container` or is nested (transitively) inside it.
    fn is_nested_within(&self, type_hash: TypeHash, container: TypeHash) -> bool {
        let mut current = Some(type_hash);
        let mut steps = 0;
        while let Some(hash) = current {
            if hash == container {
                return true;
            }
            // nesting depth is bounded by the number of types; guard bad metadata
            steps += 1;
            if steps > 256 {
                return false;
            }
            current = self.type_entry(hash).and_then(|e| e.declaring_type);
        }
        false
    }
}
