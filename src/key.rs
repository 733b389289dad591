//! Service key types for the dependency injection container.

use std::any::TypeId;
use std::fmt;

/// Key for service storage and lookup.
///
/// A key names a capability: either a concrete type or a trait object type.
/// Three traits implemented by the same struct are three distinct keys, which
/// is how one construction rule can be bound under several lifetimes.
///
/// # Examples
///
/// ```rust
/// use opscope::{ServiceCollection, Resolver, Key, key_of_type, key_of_trait};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str);
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) {
///         println!("LOG: {}", msg);
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(42u32);
/// services.add_singleton_trait(Arc::new(ConsoleLogger) as Arc<dyn Logger>);
///
/// assert!(matches!(key_of_type::<u32>(), Key::Type(_, _)));
/// assert!(matches!(key_of_trait::<dyn Logger>(), Key::Trait(_)));
///
/// let provider = services.build();
/// assert_eq!(*provider.get_required::<u32>(), 42);
/// provider.get_required_trait::<dyn Logger>().log("resolved");
/// ```
#[derive(Debug, Clone)]
pub enum Key {
    /// Concrete type key with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// Trait binding key
    ///
    /// Only stores the trait name since `dyn Trait` is keyed by its type name.
    Trait(&'static str),
}

impl Key {
    /// Get the type or trait name for display
    ///
    /// ```rust
    /// use opscope::Key;
    /// use std::any::TypeId;
    ///
    /// let type_key = Key::Type(TypeId::of::<String>(), "alloc::string::String");
    /// assert_eq!(type_key.display_name(), "alloc::string::String");
    ///
    /// let trait_key = Key::Trait("dyn core::fmt::Debug");
    /// assert_eq!(trait_key.display_name(), "dyn core::fmt::Debug");
    /// ```
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::Trait(name) => name,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// TypeId-only comparison for concrete types; the name is diagnostic.
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::Trait(a), Key::Trait(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::Trait(name) => {
                1u8.hash(state);
                name.hash(state);
            }
        }
    }
}

/// Key for a concrete type.
#[inline(always)]
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Key for a trait object type such as `dyn Logger`.
#[inline(always)]
pub fn key_of_trait<T: ?Sized + 'static>() -> Key {
    Key::Trait(std::any::type_name::<T>())
}
