//! Host callables and their call context.
//!
//! Methods, property accessors and event handlers are all stored as
//! [`NativeFn`]. The binder coerces every argument before building the
//! [`CallContext`], so callables receive values already in their declared
//! parameter types.

use std::fmt;
use std::sync::Arc;

use crate::{HostObject, NativeError, TypeHash, Value};

/// Type-erased host callable.
///
/// The inner callable is wrapped in `Arc`, so cloning shares it.
#[derive(Clone)]
pub struct NativeFn {
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    /// Create a new NativeFn from a callable.
    pub fn new<F>(f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Call this native function with the given context.
    pub fn call(&self, ctx: &mut CallContext) -> Result<Value, NativeError> {
        self.inner.call(ctx)
    }

    /// Check if two handles share the same callable.
    pub fn ptr_eq(&self, other: &NativeFn) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").finish_non_exhaustive()
    }
}

/// Trait for callable host functions.
pub trait NativeCallable {
    /// Call this function with the given context.
    fn call(&self, ctx: &mut CallContext) -> Result<Value, NativeError>;
}

// Implement NativeCallable for closures that take CallContext
impl<F> NativeCallable for F
where
    F: Fn(&mut CallContext) -> Result<Value, NativeError>,
{
    fn call(&self, ctx: &mut CallContext) -> Result<Value, NativeError> {
        (self)(ctx)
    }
}

/// Context passed to a host callable.
///
/// `ref`/`out` arguments are plain slots here; whatever the callable leaves
/// in them is written back to the caller's cells after it returns.
pub struct CallContext<'a> {
    this: Option<&'a mut Value>,
    args: &'a mut [Value],
    type_args: &'a [TypeHash],
}

impl<'a> CallContext<'a> {
    pub fn new(
        this: Option<&'a mut Value>,
        args: &'a mut [Value],
        type_args: &'a [TypeHash],
    ) -> Self {
        Self {
            this,
            args,
            type_args,
        }
    }

    /// The receiver (`None` for static members and event handlers).
    pub fn this(&self) -> Option<&Value> {
        self.this.as_deref()
    }

    /// Mutable receiver, used by struct methods that update the value.
    pub fn this_mut(&mut self) -> Option<&mut Value> {
        self.this.as_deref_mut()
    }

    /// The receiver's host object.
    pub fn this_object(&self) -> Result<&HostObject, NativeError> {
        match self.this.as_deref() {
            Some(Value::Object(obj)) => Ok(obj.object()),
            _ => Err(NativeError::InvalidThis),
        }
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Argument at `index`, or an error naming what was expected.
    pub fn arg_or_err(&self, index: usize, expected: &str) -> Result<&Value, NativeError> {
        self.args.get(index).ok_or_else(|| NativeError::InvalidArgument {
            index,
            expected: expected.to_string(),
        })
    }

    /// Set a `ref`/`out` slot.
    pub fn set_arg(&mut self, index: usize, value: Value) -> Result<(), NativeError> {
        match self.args.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(NativeError::InvalidArgument {
                index,
                expected: "out slot".to_string(),
            }),
        }
    }

    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// Fixed generic type arguments of the bound method.
    pub fn type_args(&self) -> &[TypeHash] {
        self.type_args
    }
}
