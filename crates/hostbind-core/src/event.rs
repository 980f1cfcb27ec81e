//! Event sources exposed through event members.
//!
//! Reading an event member yields a [`Value::Event`](crate::Value::Event)
//! holding the object's [`EventSource`]. Script runtimes connect handlers to
//! it; the host fires it with [`HostObject::raise_event`](crate::HostObject::raise_event).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::{CallContext, NativeError, NativeFn, Value};

#[derive(Default)]
struct EventHub {
    handlers: Mutex<Vec<(u64, NativeFn)>>,
    next_id: AtomicU64,
}

/// A shared list of event handlers.
#[derive(Clone, Default)]
pub struct EventSource {
    hub: Arc<EventHub>,
}

impl EventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a handler. Dropping the returned connection does not disconnect.
    pub fn connect(&self, handler: NativeFn) -> EventConnection {
        let id = self.hub.next_id.fetch_add(1, Ordering::Relaxed);
        self.hub.handlers.lock().push((id, handler));
        EventConnection {
            hub: Arc::downgrade(&self.hub),
            id,
        }
    }

    /// Number of connected handlers.
    pub fn handler_count(&self) -> usize {
        self.hub.handlers.lock().len()
    }

    /// Call every connected handler with a copy of `args`, in connection order.
    ///
    /// Stops at the first handler error.
    pub fn raise(&self, args: &[Value]) -> Result<(), NativeError> {
        // Snapshot so handlers may connect or disconnect while being called.
        let handlers: Vec<NativeFn> = self
            .hub
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            let mut call_args = args.to_vec();
            let mut ctx = CallContext::new(None, &mut call_args, &[]);
            handler.call(&mut ctx)?;
        }
        Ok(())
    }

    pub fn ptr_eq(&self, other: &EventSource) -> bool {
        Arc::ptr_eq(&self.hub, &other.hub)
    }
}

/// Handle returned by [`EventSource::connect`].
#[derive(Debug, Clone)]
pub struct EventConnection {
    hub: Weak<EventHub>,
    id: u64,
}

impl EventConnection {
    /// Remove the handler. Returns `false` if it was already removed or the
    /// source no longer exists.
    pub fn disconnect(&self) -> bool {
        let Some(hub) = self.hub.upgrade() else {
            return false;
        };
        let mut handlers = hub.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(id, _)| *id != self.id);
        handlers.len() != before
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub").finish_non_exhaustive()
    }
}
