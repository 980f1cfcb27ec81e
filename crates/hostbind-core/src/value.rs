//! Runtime values exchanged between script code and the host.
//!
//! [`Value`] is the logical script-side value the binder coerces into host
//! parameter types. Reference-like variants (`Object`, `Array`, `Ref`,
//! `Event`) share their payload, so mutation through one handle is visible
//! through every other handle. `Struct` values are plain owned data and are
//! copied whenever the value is cloned.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::{DataType, EventSource, PrimitiveKind, RefModifier, TypeHash, primitives};

/// A script-side value.
#[derive(Clone, Default)]
pub enum Value {
    /// No value (result of a void call).
    #[default]
    Void,
    /// The null reference.
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(Arc<str>),
    /// A member of a host enum, stored as its underlying value.
    Enum { type_hash: TypeHash, value: i64 },
    /// A host value type, copied on clone.
    Struct(StructValue),
    /// A shared reference to a host object.
    Object(ObjectRef),
    /// A shared, element-typed, single-dimensional array.
    Array(ArrayRef),
    /// A host type reference. Also used as a type-argument marker.
    Type(TypeHash),
    /// A by-ref / out cell.
    Ref(ValueCell),
    /// An event source obtained by reading an event member.
    Event(EventSource),
}

impl Value {
    /// Wrap a freshly constructed host object.
    pub fn object(object: HostObject) -> Self {
        Value::Object(ObjectRef::new(object))
    }

    /// Create a string value.
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    /// Create an array value with the given element type.
    pub fn array(element: TypeHash, items: Vec<Value>) -> Self {
        Value::Array(ArrayRef::new(element, items))
    }

    /// Create a by-ref cell holding `value`.
    pub fn cell(value: Value) -> Self {
        Value::Ref(ValueCell::new(value))
    }

    /// Check if this is the null reference.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this is void.
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// The runtime type of this value, as seen by overload resolution.
    ///
    /// Objects report their exposed type (the restricted view if one is set).
    /// Cells report their content type with a `ref` modifier.
    pub fn runtime_type(&self) -> DataType {
        match self {
            Value::Void => DataType::void(),
            Value::Null => DataType::simple(primitives::NULL),
            Value::String(_) => DataType::simple(primitives::STRING),
            Value::Enum { type_hash, .. } => DataType::simple(*type_hash),
            Value::Struct(s) => DataType::simple(s.type_hash),
            Value::Object(obj) => DataType::simple(obj.exposed_type()),
            Value::Array(array) => DataType::array_of(array.element()),
            Value::Type(_) => DataType::simple(primitives::TYPE),
            Value::Ref(cell) => cell.get().runtime_type().with_ref(RefModifier::Ref),
            Value::Event(_) => DataType::simple(primitives::EVENT),
            other => match other.primitive_kind() {
                Some(kind) => DataType::simple(kind.type_hash()),
                None => DataType::void(),
            },
        }
    }

    /// The primitive kind of a boolean or numeric value.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            Value::Bool(_) => PrimitiveKind::Bool,
            Value::Int8(_) => PrimitiveKind::Int8,
            Value::Int16(_) => PrimitiveKind::Int16,
            Value::Int32(_) => PrimitiveKind::Int32,
            Value::Int64(_) => PrimitiveKind::Int64,
            Value::UInt8(_) => PrimitiveKind::Uint8,
            Value::UInt16(_) => PrimitiveKind::Uint16,
            Value::UInt32(_) => PrimitiveKind::Uint32,
            Value::UInt64(_) => PrimitiveKind::Uint64,
            Value::Float(_) => PrimitiveKind::Float,
            Value::Double(_) => PrimitiveKind::Double,
            _ => return None,
        })
    }

    /// Integer payload widened to `i128`. Enums yield their underlying value.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Value::Int8(v) => Some(v as i128),
            Value::Int16(v) => Some(v as i128),
            Value::Int32(v) => Some(v as i128),
            Value::Int64(v) => Some(v as i128),
            Value::UInt8(v) => Some(v as i128),
            Value::UInt16(v) => Some(v as i128),
            Value::UInt32(v) => Some(v as i128),
            Value::UInt64(v) => Some(v as i128),
            Value::Enum { value, .. } => Some(value as i128),
            _ => None,
        }
    }

    /// Numeric payload as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v as f64),
            Value::Double(v) => Some(v),
            _ => self.as_integer().map(|v| v as f64),
        }
    }

    /// Build a primitive value of `kind` from an integer known to be in range.
    ///
    /// Returns `None` when `value` does not fit.
    pub fn from_integer(kind: PrimitiveKind, value: i128) -> Option<Value> {
        let (min, max) = kind.integer_range()?;
        if value < min || value > max {
            return None;
        }
        Some(match kind {
            PrimitiveKind::Int8 => Value::Int8(value as i8),
            PrimitiveKind::Int16 => Value::Int16(value as i16),
            PrimitiveKind::Int32 => Value::Int32(value as i32),
            PrimitiveKind::Int64 => Value::Int64(value as i64),
            PrimitiveKind::Uint8 => Value::UInt8(value as u8),
            PrimitiveKind::Uint16 => Value::UInt16(value as u16),
            PrimitiveKind::Uint32 => Value::UInt32(value as u32),
            PrimitiveKind::Uint64 => Value::UInt64(value as u64),
            _ => return None,
        })
    }

    /// The zero value of a primitive kind.
    pub fn zero(kind: PrimitiveKind) -> Value {
        match kind {
            PrimitiveKind::Bool => Value::Bool(false),
            PrimitiveKind::Float => Value::Float(0.0),
            PrimitiveKind::Double => Value::Double(0.0),
            // integer kinds always accept zero
            _ => Value::from_integer(kind, 0).unwrap_or(Value::Int32(0)),
        }
    }

    /// The object reference, if this is an object.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (
                Value::Enum {
                    type_hash: ta,
                    value: va,
                },
                Value::Enum {
                    type_hash: tb,
                    value: vb,
                },
            ) => ta == tb && va == vb,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            (Value::Event(a), Value::Event(b)) => a.ptr_eq(b),
            _ => match (self.primitive_kind(), other.primitive_kind()) {
                (Some(ka), Some(kb)) if ka == kb => self.as_integer() == other.as_integer(),
                _ => false,
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "Void"),
            Value::Null => write!(f, "Null"),
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::Int8(v) => write!(f, "Int8({v})"),
            Value::Int16(v) => write!(f, "Int16({v})"),
            Value::Int32(v) => write!(f, "Int32({v})"),
            Value::Int64(v) => write!(f, "Int64({v})"),
            Value::UInt8(v) => write!(f, "UInt8({v})"),
            Value::UInt16(v) => write!(f, "UInt16({v})"),
            Value::UInt32(v) => write!(f, "UInt32({v})"),
            Value::UInt64(v) => write!(f, "UInt64({v})"),
            Value::Float(v) => write!(f, "Float({v})"),
            Value::Double(v) => write!(f, "Double({v})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Enum { type_hash, value } => write!(f, "Enum({type_hash}, {value})"),
            Value::Struct(s) => f.debug_tuple("Struct").field(s).finish(),
            Value::Object(obj) => f.debug_tuple("Object").field(obj).finish(),
            Value::Array(array) => f.debug_tuple("Array").field(array).finish(),
            Value::Type(hash) => write!(f, "Type({hash})"),
            Value::Ref(cell) => f.debug_tuple("Ref").field(&cell.get()).finish(),
            Value::Event(_) => write!(f, "Event"),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

// ============================================================================
// Structs
// ============================================================================

/// An instance of a host value type. Fields are keyed by member hash.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    pub type_hash: TypeHash,
    pub fields: FxHashMap<TypeHash, Value>,
}

impl StructValue {
    /// Create a struct value with no fields set.
    pub fn new(type_hash: TypeHash) -> Self {
        Self {
            type_hash,
            fields: FxHashMap::default(),
        }
    }

    /// Builder-style field initializer.
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields
            .insert(TypeHash::from_member(self.type_hash, name), value.into());
        self
    }

    /// Read a field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(&TypeHash::from_member(self.type_hash, name))
    }
}

// ============================================================================
// Host objects
// ============================================================================

/// A shared host object instance.
///
/// Field storage is keyed by the member hash of the declaring type's field
/// (`TypeHash::from_member(declaring_type, name)`), so a derived object
/// carries its base types' fields side by side without collisions.
pub struct HostObject {
    type_hash: TypeHash,
    fields: RwLock<FxHashMap<TypeHash, Value>>,
    events: Mutex<FxHashMap<TypeHash, EventSource>>,
    native: Option<Box<dyn Any + Send + Sync>>,
}

impl HostObject {
    /// Create an object of the given runtime type.
    pub fn new(type_hash: TypeHash) -> Self {
        Self {
            type_hash,
            fields: RwLock::new(FxHashMap::default()),
            events: Mutex::new(FxHashMap::default()),
            native: None,
        }
    }

    /// Attach an opaque native payload for host callables.
    pub fn with_native<T: Any + Send + Sync>(mut self, payload: T) -> Self {
        self.native = Some(Box::new(payload));
        self
    }

    /// Initialize a field declared on `declaring_type`.
    pub fn with_field(self, declaring_type: TypeHash, name: &str, value: impl Into<Value>) -> Self {
        self.fields
            .write()
            .insert(TypeHash::from_member(declaring_type, name), value.into());
        self
    }

    /// The most-derived runtime type.
    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// Read a field slot.
    pub fn field(&self, key: TypeHash) -> Option<Value> {
        self.fields.read().get(&key).cloned()
    }

    /// Write a field slot.
    pub fn set_field(&self, key: TypeHash, value: Value) {
        self.fields.write().insert(key, value);
    }

    /// The event source for an event member, created on first use.
    pub fn event_source(&self, key: TypeHash) -> EventSource {
        self.events.lock().entry(key).or_default().clone()
    }

    /// Raise an event from the host side, calling every connected handler.
    pub fn raise_event(
        &self,
        declaring_type: TypeHash,
        name: &str,
        args: &[Value],
    ) -> Result<(), crate::NativeError> {
        let source = self
            .events
            .lock()
            .get(&TypeHash::from_member(declaring_type, name))
            .cloned();
        match source {
            Some(source) => source.raise(args),
            None => Ok(()),
        }
    }

    /// Downcast the native payload.
    pub fn native<T: Any>(&self) -> Option<&T> {
        self.native.as_ref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostObject")
            .field("type_hash", &self.type_hash)
            .finish_non_exhaustive()
    }
}

/// A shared reference to a [`HostObject`], optionally viewed through a
/// declared type (a base class or interface).
#[derive(Clone)]
pub struct ObjectRef {
    inner: Arc<HostObject>,
    view: Option<TypeHash>,
}

impl ObjectRef {
    pub fn new(object: HostObject) -> Self {
        Self {
            inner: Arc::new(object),
            view: None,
        }
    }

    /// The underlying object.
    pub fn object(&self) -> &HostObject {
        &self.inner
    }

    /// The most-derived runtime type.
    pub fn runtime_type(&self) -> TypeHash {
        self.inner.type_hash
    }

    /// The restricted view, if any.
    pub fn view(&self) -> Option<TypeHash> {
        self.view
    }

    /// The type member lookup goes through: the view if set, else the runtime type.
    pub fn exposed_type(&self) -> TypeHash {
        self.view.unwrap_or(self.inner.type_hash)
    }

    /// The same object seen through `view` (`None` exposes the runtime type).
    pub fn with_view(&self, view: Option<TypeHash>) -> Self {
        let view = view.filter(|&v| v != self.inner.type_hash);
        Self {
            inner: Arc::clone(&self.inner),
            view,
        }
    }

    /// Identity comparison, ignoring the view.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("type_hash", &self.inner.type_hash)
            .field("view", &self.view)
            .finish()
    }
}

// ============================================================================
// Arrays and cells
// ============================================================================

/// A shared, single-dimensional array.
#[derive(Clone)]
pub struct ArrayRef {
    element: TypeHash,
    items: Arc<RwLock<Vec<Value>>>,
}

impl ArrayRef {
    pub fn new(element: TypeHash, items: Vec<Value>) -> Self {
        Self {
            element,
            items: Arc::new(RwLock::new(items)),
        }
    }

    /// Declared element type.
    pub fn element(&self) -> TypeHash {
        self.element
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.read().get(index).cloned()
    }

    /// Replace the element at `index`. Returns `false` when out of bounds.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.items.write().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Snapshot of the elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.items.read().clone()
    }

    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayRef")
            .field("element", &self.element)
            .field("len", &self.len())
            .finish()
    }
}

/// A by-ref / out argument cell. The binder writes the callee's final value
/// back into the cell after the call returns.
#[derive(Clone)]
pub struct ValueCell(Arc<Mutex<Value>>);

impl ValueCell {
    pub fn new(value: Value) -> Self {
        Self(Arc::new(Mutex::new(value)))
    }

    pub fn get(&self) -> Value {
        self.0.lock().clone()
    }

    pub fn set(&self, value: Value) {
        *self.0.lock() = value;
    }

    /// Run `f` with mutable access to the contents.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        f(&mut self.0.lock())
    }

    pub fn ptr_eq(&self, other: &ValueCell) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ValueCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueCell").field(&self.get()).finish()
    }
}
