//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type, which records
//! registrations and freezes them into a [`ServiceProvider`].

use std::sync::Arc;

use crate::key::{key_of_trait, key_of_type};
use crate::observer::{DiObserver, Observers};
use crate::provider::ResolverContext;
use crate::registration::{AnyArc, Registration, Registry};
use crate::{DiResult, Key, Lifetime, ServiceProvider};

/// Mutable registry of services, consumed by [`build`](Self::build).
///
/// Registering the same capability twice replaces the earlier binding.
pub struct ServiceCollection {
    registry: Registry,
    observers: Observers,
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            observers: Observers::new(),
        }
    }

    // ----- Core registration -----

    /// Binds a concrete type to a fallible factory under `lifetime`.
    ///
    /// The factory returns [`DiResult`]; an `Err` aborts the resolution and,
    /// for singletons and scoped services, leaves the slot empty so a later
    /// resolution tries again.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use opscope::{DiError, Lifetime, ServiceCollection, Resolver};
    ///
    /// struct Connection;
    ///
    /// let mut services = ServiceCollection::new();
    /// services.register::<Connection, _>(Lifetime::Transient, |_| {
    ///     Err(DiError::construction::<Connection>("database offline"))
    /// });
    ///
    /// let provider = services.build();
    /// let err = provider.get::<Connection>().err().unwrap();
    /// assert!(!err.is_configuration());
    /// ```
    pub fn register<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            factory(r).map(|value| Arc::new(value) as AnyArc)
        };
        self.insert(key_of_type::<T>(), Registration::new(lifetime, Arc::new(ctor)))
    }

    /// Binds a trait object type (the capability) to a fallible factory
    /// under `lifetime`.
    ///
    /// Several traits may be bound to the same implementation; each is a
    /// separate capability with its own lifetime and its own instances.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use opscope::{Lifetime, ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Clock: Send + Sync {
    ///     fn now(&self) -> u64;
    /// }
    ///
    /// struct Fixed;
    /// impl Clock for Fixed {
    ///     fn now(&self) -> u64 { 42 }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.register_trait::<dyn Clock, _>(Lifetime::Singleton, |_| Ok(Arc::new(Fixed)));
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required_trait::<dyn Clock>().now(), 42);
    /// ```
    pub fn register_trait<Trait, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            // Stored as Arc<Arc<dyn Trait>> so the Any can be downcast.
            factory(r).map(|value| Arc::new(value) as AnyArc)
        };
        self.insert(key_of_trait::<Trait>(), Registration::new(lifetime, Arc::new(ctor)))
    }

    fn insert(&mut self, key: Key, registration: Registration) -> &mut Self {
        let lifetime = registration.lifetime;
        if let Some(previous) = self.registry.insert(key.clone(), registration) {
            tracing::debug!(
                service = key.display_name(),
                previous = %previous.lifetime,
                current = %lifetime,
                "replacing existing registration"
            );
        }
        self
    }

    // ----- Concrete type registrations -----

    /// Registers a ready-made singleton instance.
    ///
    /// ```rust
    /// # use opscope::ServiceCollection;
    /// struct Config {
    ///     database_url: String
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Config {
    ///     database_url: "postgres://localhost".to_string()
    /// });
    /// ```
    pub fn add_singleton<T: 'static + Send + Sync>(&mut self, value: T) -> &mut Self {
        let arc: AnyArc = Arc::new(value);
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> { Ok(arc.clone()) };
        self.insert(key_of_type::<T>(), Registration::new(Lifetime::Singleton, Arc::new(ctor)))
    }

    /// Registers a singleton factory that creates the instance on first request.
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.register::<T, _>(Lifetime::Singleton, move |r| Ok(factory(r)))
    }

    /// Registers a scoped factory that creates one instance per scope.
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.register::<T, _>(Lifetime::Scoped, move |r| Ok(factory(r)))
    }

    /// Registers a transient factory that creates a new instance on every request.
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.register::<T, _>(Lifetime::Transient, move |r| Ok(factory(r)))
    }

    // ----- Trait registrations -----

    /// Registers a ready-made singleton trait implementation.
    ///
    /// ```rust
    /// # use opscope::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Logger: Send + Sync {
    ///     fn log(&self, message: &str);
    /// }
    ///
    /// struct NullLogger;
    /// impl Logger for NullLogger {
    ///     fn log(&self, _message: &str) {}
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_trait::<dyn Logger>(Arc::new(NullLogger));
    /// ```
    pub fn add_singleton_trait<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
    {
        self.register_trait::<T, _>(Lifetime::Singleton, move |_| Ok(value.clone()))
    }

    /// Registers a singleton trait factory.
    pub fn add_singleton_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.register_trait::<Trait, _>(Lifetime::Singleton, move |r| Ok(factory(r)))
    }

    /// Registers a scoped trait factory.
    pub fn add_scoped_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.register_trait::<Trait, _>(Lifetime::Scoped, move |r| Ok(factory(r)))
    }

    /// Registers a transient trait factory.
    pub fn add_transient_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.register_trait::<Trait, _>(Lifetime::Transient, move |r| Ok(factory(r)))
    }

    // ----- Observers and introspection -----

    /// Adds an observer notified around every resolution.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// `true` if a concrete type `T` is registered.
    pub fn contains<T: 'static>(&self) -> bool {
        self.registry.contains_key(&key_of_type::<T>())
    }

    /// `true` if a trait object type `T` is registered.
    pub fn contains_trait<T: ?Sized + 'static>(&self) -> bool {
        self.registry.contains_key(&key_of_trait::<T>())
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Freezes the registrations into a [`ServiceProvider`].
    pub fn build(mut self) -> ServiceProvider {
        self.registry.finalize();
        tracing::debug!(
            registrations = self.registry.len(),
            scoped_slots = self.registry.scoped_count,
            "service provider built"
        );
        ServiceProvider::new(self.registry, self.observers)
    }
}
