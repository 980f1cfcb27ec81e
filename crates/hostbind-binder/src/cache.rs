//! Bind signature cache.
//!
//! A [`BindSignature`] captures everything resolution depends on: settings,
//! flags, the target's type shape, the member name, explicit type arguments
//! and the runtime type of every argument. Argument values never take part,
//! so every call site with the same shape shares one resolution.
//!
//! The cache is append-only. Failed resolutions are cached as well.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use tracing::trace;

use hostbind_core::{BindError, BindFlags, BindSettings, DataType, TypeHash, Value, primitives};

/// The shape of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgShape {
    /// Runtime type; by-ref cells carry a `ref` modifier.
    pub data_type: DataType,
    /// The type a type-marker argument denotes.
    pub marker: Option<TypeHash>,
}

impl ArgShape {
    pub fn of(value: &Value) -> Self {
        Self {
            data_type: value.runtime_type(),
            marker: match value {
                Value::Type(t) => Some(*t),
                _ => None,
            },
        }
    }

    /// Shape of a plain value of `data_type`.
    pub fn simple(data_type: DataType) -> Self {
        Self {
            data_type,
            marker: None,
        }
    }

    /// Shape of a type-marker argument.
    pub fn marker(type_hash: TypeHash) -> Self {
        Self {
            data_type: DataType::simple(primitives::TYPE),
            marker: Some(type_hash),
        }
    }

    pub fn is_by_ref(&self) -> bool {
        self.data_type.is_by_ref()
    }

    /// Runtime type without the by-ref modifier.
    pub fn value_type(&self) -> DataType {
        self.data_type.without_ref()
    }
}

/// What a bind is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetShape {
    /// A host type value: static members.
    Type(TypeHash),
    /// An instance, optionally viewed through a base class or interface.
    Instance {
        runtime: TypeHash,
        view: Option<TypeHash>,
    },
    /// An array with the given element type.
    Array { element: TypeHash },
}

impl TargetShape {
    /// Shape of a target value. Null, void and events cannot be bound against.
    pub fn of(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Type(t) => TargetShape::Type(*t),
            Value::Object(obj) => TargetShape::Instance {
                runtime: obj.runtime_type(),
                view: obj.view(),
            },
            Value::Array(array) => TargetShape::Array {
                element: array.element(),
            },
            Value::Ref(cell) => return TargetShape::of(&cell.get()),
            Value::Null | Value::Void | Value::Event(_) => return None,
            other => TargetShape::Instance {
                runtime: other.runtime_type().type_hash,
                view: None,
            },
        })
    }

    /// The type whose catalog serves this target.
    pub fn lookup_type(&self) -> TypeHash {
        match *self {
            TargetShape::Type(t) => t,
            TargetShape::Instance { runtime, view } => view.unwrap_or(runtime),
            TargetShape::Array { .. } => primitives::OBJECT,
        }
    }

    /// The target as an argument type, for extension method receivers.
    pub fn receiver_type(&self) -> DataType {
        match *self {
            TargetShape::Type(_) => DataType::simple(primitives::TYPE),
            TargetShape::Instance { runtime, view } => DataType::simple(view.unwrap_or(runtime)),
            TargetShape::Array { element } => DataType::array_of(element),
        }
    }
}

/// Structural key of one bind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindSignature {
    pub settings: BindSettings,
    pub flags: BindFlags,
    pub target: TargetShape,
    pub name: String,
    pub type_args: Vec<TypeHash>,
    pub args: Vec<ArgShape>,
}

impl BindSignature {
    pub fn new(
        settings: BindSettings,
        flags: BindFlags,
        target: TargetShape,
        name: &str,
        type_args: &[TypeHash],
        args: &[Value],
    ) -> Self {
        Self {
            settings,
            flags,
            target,
            name: name.to_string(),
            type_args: type_args.to_vec(),
            args: args.iter().map(ArgShape::of).collect(),
        }
    }
}

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Append-only map from signatures to shared resolutions.
pub struct BindCache<T> {
    entries: DashMap<BindSignature, Result<Arc<T>, BindError>, FxBuildHasher>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T> Default for BindCache<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl<T> BindCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached resolution of `signature`, resolving it on a miss.
    ///
    /// `resolve` runs outside the map lock. When several threads miss on the
    /// same signature, the first result installed wins and every caller gets it.
    pub fn lookup_or_resolve(
        &self,
        signature: BindSignature,
        resolve: impl FnOnce(&BindSignature) -> Result<T, BindError>,
    ) -> Result<Arc<T>, BindError> {
        if let Some(entry) = self.entries.get(&signature) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return entry.value().clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(
            member = %signature.name,
            target = ?signature.target,
            args = signature.args.len(),
            "bind cache miss"
        );
        let resolved = resolve(&signature).map(Arc::new);
        self.entries
            .entry(signature)
            .or_insert(resolved)
            .value()
            .clone()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> std::fmt::Debug for BindCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindCache").field("stats", &self.stats()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbind_core::{HostObject, RefModifier};

    fn signature(args: &[Value]) -> BindSignature {
        BindSignature::new(
            BindSettings::new(),
            BindFlags::INVOKE_METHOD,
            TargetShape::Type(TypeHash::from_name("Math")),
            "Max",
            &[],
            args,
        )
    }

    #[test]
    fn argument_values_do_not_matter() {
        assert_eq!(
            signature(&[Value::Int32(1), Value::Int32(2)]),
            signature(&[Value::Int32(10), Value::Int32(-5)])
        );
        assert_ne!(
            signature(&[Value::Int32(1)]),
            signature(&[Value::Double(1.0)])
        );
    }

    #[test]
    fn settings_are_part_of_the_key() {
        let a = signature(&[]);
        let mut b = signature(&[]);
        b.settings = b.settings.with_allow_reflection(true);
        assert_ne!(a, b);
    }

    #[test]
    fn markers_contribute_their_type() {
        let a = ArgShape::of(&Value::Type(primitives::INT32));
        let b = ArgShape::of(&Value::Type(primitives::STRING));
        assert_ne!(a, b);
        assert_eq!(a, ArgShape::marker(primitives::INT32));
    }

    #[test]
    fn cells_are_by_ref() {
        let shape = ArgShape::of(&Value::cell(Value::Int32(0)));
        assert!(shape.is_by_ref());
        assert_eq!(shape.data_type.ref_modifier, RefModifier::Ref);
        assert_eq!(shape.value_type(), DataType::simple(primitives::INT32));
    }

    #[test]
    fn target_shapes() {
        let widget = TypeHash::from_name("Widget");
        let base = TypeHash::from_name("Base");
        let obj = Value::object(HostObject::new(widget));
        assert_eq!(
            TargetShape::of(&obj),
            Some(TargetShape::Instance {
                runtime: widget,
                view: None
            })
        );

        let viewed = Value::Object(obj.as_object().unwrap().with_view(Some(base)));
        let shape = TargetShape::of(&viewed).unwrap();
        assert_eq!(shape.lookup_type(), base);

        assert_eq!(TargetShape::of(&Value::Null), None);
        assert_eq!(
            TargetShape::of(&Value::cell(Value::Type(widget))),
            Some(TargetShape::Type(widget))
        );
        assert_eq!(
            TargetShape::of(&Value::from("s")),
            Some(TargetShape::Instance {
                runtime: primitives::STRING,
                view: None
            })
        );
    }

    #[test]
    fn resolves_once_and_counts() {
        let cache: BindCache<u32> = BindCache::new();
        let mut calls = 0;
        let first = cache
            .lookup_or_resolve(signature(&[Value::Int32(1)]), |_| {
                calls += 1;
                Ok(7)
            })
            .unwrap();
        let second = cache
            .lookup_or_resolve(signature(&[Value::Int32(2)]), |_| Ok(8))
            .unwrap();
        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn errors_are_cached() {
        let cache: BindCache<u32> = BindCache::new();
        let sig = signature(&[]);
        let err = cache
            .lookup_or_resolve(sig.clone(), |_| Err(BindError::not_found("Max")))
            .unwrap_err();
        assert!(err.is_not_found());
        let again = cache.lookup_or_resolve(sig, |_| Ok(1));
        assert_eq!(again.unwrap_err(), err);
    }
}
