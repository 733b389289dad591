//! Service provider module for dependency injection.
//!
//! This module contains the ServiceProvider type and related functionality
//! for resolving registered services from the DI container.

use std::fmt;
use std::sync::Arc;

use crate::internal::{get_or_build, ResolutionGuard};
use crate::observer::Observers;
use crate::registration::{AnyArc, Registration, Registry};
use crate::traits::ResolverCore;
use crate::{DiError, DiResult, Key, Lifetime};

pub mod context;
pub mod scope;
pub use context::ResolverContext;
pub use scope::Scope;

/// Service provider for resolving dependencies from the DI container.
///
/// The provider is the process-wide half of the container: it owns the frozen
/// registry and, for every singleton registration, the slot holding the one
/// retained instance. Request-scoped state lives in [`Scope`]s created from it.
///
/// # Thread Safety
///
/// `ServiceProvider` is `Send + Sync` and cheap to clone (it is an `Arc`
/// internally). A singleton's first construction is guarded by one-time
/// initialization: concurrent first resolutions wait for a single factory
/// call instead of each building their own instance. A wait that would close
/// a cycle of singleton factories, even one split across threads, fails with
/// [`DiError::Circular`] instead of blocking.
///
/// # Examples
///
/// ```
/// use opscope::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(Database { url: "postgres://localhost".to_string() });
/// collection.add_transient_factory::<UserService, _>(|resolver| {
///     UserService { db: resolver.get_required::<Database>() }
/// });
///
/// let provider = collection.build();
/// let user_service = provider.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    pub(crate) registry: Registry,
    pub(crate) observers: Observers,
}

impl ServiceProvider {
    pub(crate) fn new(registry: Registry, observers: Observers) -> Self {
        Self {
            inner: Arc::new(ProviderInner { registry, observers }),
        }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &ProviderInner {
        &self.inner
    }

    /// Creates a new scope for resolving scoped services.
    ///
    /// Each scope holds one empty slot per scoped registration. Singletons are
    /// still served from this provider.
    ///
    /// # Examples
    ///
    /// ```
    /// use opscope::{ServiceCollection, Resolver};
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// struct RequestId(usize);
    ///
    /// let counter = Arc::new(AtomicUsize::new(0));
    /// let mut collection = ServiceCollection::new();
    /// collection.add_scoped_factory::<RequestId, _>(move |_| {
    ///     RequestId(counter.fetch_add(1, Ordering::SeqCst))
    /// });
    ///
    /// let provider = collection.build();
    /// let scope1 = provider.create_scope();
    /// let scope2 = provider.create_scope();
    ///
    /// let req1a = scope1.get_required::<RequestId>();
    /// let req1b = scope1.get_required::<RequestId>();
    /// let req2 = scope2.get_required::<RequestId>();
    ///
    /// assert!(Arc::ptr_eq(&req1a, &req1b));
    /// assert!(!Arc::ptr_eq(&req1a, &req2));
    /// ```
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.clone())
    }

    /// Constructs every singleton registration now instead of on first use.
    ///
    /// Returns how many singletons are available afterwards. Stops at the
    /// first factory failure.
    pub fn warm_singletons(&self) -> DiResult<usize> {
        let mut warmed = 0;
        for (key, reg) in self.inner().registry.iter() {
            if reg.lifetime == Lifetime::Singleton {
                self.resolve_any(key)?;
                warmed += 1;
            }
        }
        tracing::debug!(warmed, "singletons constructed eagerly");
        Ok(warmed)
    }

    /// Lifetime a key was registered with, if any.
    pub fn lifetime_of(&self, key: &Key) -> Option<Lifetime> {
        self.inner().registry.get(key).map(|reg| reg.lifetime)
    }

    /// Number of registered capabilities.
    pub fn registration_count(&self) -> usize {
        self.inner().registry.len()
    }

    /// Returns the process-wide instance, constructing it on first use.
    ///
    /// The factory always resolves its own dependencies through the root
    /// provider, never through the calling scope.
    pub(crate) fn resolve_singleton(&self, key: &Key, reg: &Registration) -> DiResult<AnyArc> {
        match &reg.single_runtime {
            Some(cell) => get_or_build(cell, key.display_name(), || {
                let ctx = ResolverContext::new(self);
                (reg.ctor)(&ctx)
            }),
            None => Err(DiError::WrongLifetime("Registration has no singleton slot")),
        }
    }

    fn resolve_any_impl(&self, key: &Key) -> DiResult<AnyArc> {
        let inner = self.inner();
        let Some(reg) = inner.registry.get(key) else {
            let err = DiError::NotFound(key.display_name());
            inner.observers.failed(key, &err);
            return Err(err);
        };

        inner.observers.observe(key, reg.lifetime, || match reg.lifetime {
            Lifetime::Singleton => self.resolve_singleton(key, reg),
            Lifetime::Scoped => Err(DiError::WrongLifetime(
                "Cannot resolve scoped service from root provider",
            )),
            Lifetime::Transient => {
                let ctx = ResolverContext::new(self);
                (reg.ctor)(&ctx)
            }
        })
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        let _guard = ResolutionGuard::enter(key.display_name())
            .inspect_err(|err| self.inner().observers.failed(key, err))?;
        self.resolve_any_impl(key)
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registrations", &self.registration_count())
            .field("scoped_slots", &self.inner().registry.scoped_count)
            .finish()
    }
}
