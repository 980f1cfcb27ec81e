//! Settings that change how members are resolved.
//!
//! [`BindSettings`] is a small `Copy` value passed into every bind. A
//! process-wide default is available through [`BindSettings::process_default`];
//! engines seed their own mutable settings from it.

use parking_lot::RwLock;

use crate::TypeHash;

/// The type members are viewed from. `None` sees only public members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessContext(Option<TypeHash>);

impl AccessContext {
    /// Public-only access.
    pub const NONE: AccessContext = AccessContext(None);

    /// Access as seen from inside `type_hash`.
    pub const fn of(type_hash: TypeHash) -> Self {
        Self(Some(type_hash))
    }

    pub const fn type_hash(self) -> Option<TypeHash> {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0.is_none()
    }
}

impl From<Option<TypeHash>> for AccessContext {
    fn from(value: Option<TypeHash>) -> Self {
        Self(value)
    }
}

/// Per-bind configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BindSettings {
    pub access_context: AccessContext,
    /// Expose runtime types from every member result.
    pub disable_type_restriction: bool,
    /// Expose runtime types from indexer and array element results.
    pub disable_list_index_type_restriction: bool,
    /// Allow reflective members such as `GetType`.
    pub allow_reflection: bool,
}

static PROCESS_DEFAULT: RwLock<BindSettings> = parking_lot::const_rwlock(BindSettings::new());

impl BindSettings {
    /// Public-only access, type restriction on, reflection blocked.
    pub const fn new() -> Self {
        Self {
            access_context: AccessContext::NONE,
            disable_type_restriction: false,
            disable_list_index_type_restriction: false,
            allow_reflection: false,
        }
    }

    pub const fn with_access_context(mut self, context: AccessContext) -> Self {
        self.access_context = context;
        self
    }

    pub const fn with_disable_type_restriction(mut self, disable: bool) -> Self {
        self.disable_type_restriction = disable;
        self
    }

    pub const fn with_disable_list_index_type_restriction(mut self, disable: bool) -> Self {
        self.disable_list_index_type_restriction = disable;
        self
    }

    pub const fn with_allow_reflection(mut self, allow: bool) -> Self {
        self.allow_reflection = allow;
        self
    }

    /// The process-wide default settings.
    pub fn process_default() -> BindSettings {
        *PROCESS_DEFAULT.read()
    }

    /// Replace the process-wide default. Engines created afterwards start from it.
    pub fn set_process_default(settings: BindSettings) {
        *PROCESS_DEFAULT.write() = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain() {
        let ctx = TypeHash::from_name("Derived");
        let s = BindSettings::new()
            .with_access_context(AccessContext::of(ctx))
            .with_allow_reflection(true);
        assert_eq!(s.access_context.type_hash(), Some(ctx));
        assert!(s.allow_reflection);
        assert!(!s.disable_type_restriction);
    }

    #[test]
    fn default_matches_new() {
        assert_eq!(BindSettings::default(), BindSettings::new());
        assert!(AccessContext::default().is_none());
    }
}
