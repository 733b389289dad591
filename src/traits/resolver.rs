//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{key_of_trait, key_of_type, Key};

/// Core resolver trait for object-safe service resolution.
///
/// Implemented by [`ServiceProvider`](crate::ServiceProvider),
/// [`Scope`](crate::Scope) and [`ResolverContext`](crate::ResolverContext).
/// Most callers use [`Resolver`] instead.
pub trait ResolverCore: Send + Sync {
    /// Resolves a single service, applying its lifetime policy.
    ///
    /// Returns the type-erased instance or the reason it could not be
    /// produced (not registered, wrong lifetime, circular, factory failure).
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>>;
}

/// High-level resolver interface with generic methods for type-safe service resolution.
///
/// Blanket-implemented for every [`ResolverCore`].
///
/// # Examples
///
/// ```
/// use opscope::{ServiceCollection, Resolver};
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
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(42usize);
/// collection.add_singleton_trait(Arc::new(ConsoleLogger) as Arc<dyn Logger>);
///
/// let provider = collection.build();
/// assert_eq!(*provider.get_required::<usize>(), 42);
/// provider.get_required_trait::<dyn Logger>().log("Service resolved successfully");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service type.
    fn get<T: 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        let any = self.resolve_any(&key_of_type::<T>())?;
        any.downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves a trait object registered under `T` (e.g. `dyn Logger`).
    fn get_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        let any = self.resolve_any(&key_of_trait::<T>())?;
        // Trait objects are stored as Arc<Arc<dyn Trait>> inside the Any.
        any.downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves a concrete service type, panicking on failure.
    ///
    /// Meant for factories and tests where a missing registration is a bug.
    ///
    /// # Panics
    ///
    /// Panics if the service cannot be resolved.
    fn get_required<T: 'static + Send + Sync>(&self) -> Arc<T> {
        match self.get::<T>() {
            Ok(value) => value,
            Err(e) => panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e),
        }
    }

    /// Resolves a trait object, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the trait cannot be resolved.
    fn get_required_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Arc<T> {
        match self.get_trait::<T>() {
            Ok(value) => value,
            Err(e) => panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e),
        }
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
