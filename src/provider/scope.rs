//! Scoped service resolution.
//!
//! This module contains the Scope type, the request-scoped cache that sits
//! between a handler and the root provider.

use std::fmt;

use once_cell::sync::OnceCell;

use super::{ResolverContext, ServiceProvider};
use crate::internal::ResolutionGuard;
use crate::registration::{AnyArc, Registration};
use crate::traits::ResolverCore;
use crate::{DiError, DiResult, Key, Lifetime};

/// Scoped service container for request-scoped dependency resolution.
///
/// # Lifetime Behavior
///
/// - **Singleton**: resolved and cached in the root provider (shared across all scopes)
/// - **Scoped**: resolved and cached within this specific scope
/// - **Transient**: created fresh on every resolution (no caching)
///
/// Dropping the scope drops every scoped instance it created.
///
/// # Examples
///
/// ```
/// use opscope::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct DatabaseConnection(String);
///
/// struct UserService {
///     db: Arc<DatabaseConnection>,
/// }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_scoped_factory::<DatabaseConnection, _>(|_| {
///     DatabaseConnection("connection-123".to_string())
/// });
/// collection.add_transient_factory::<UserService, _>(|resolver| {
///     UserService {
///         db: resolver.get_required::<DatabaseConnection>(),
///     }
/// });
///
/// let provider = collection.build();
/// let scope = provider.create_scope();
///
/// let user1 = scope.get_required::<UserService>();
/// let user2 = scope.get_required::<UserService>();
/// assert!(!Arc::ptr_eq(&user1, &user2));
/// assert!(Arc::ptr_eq(&user1.db, &user2.db));
/// ```
pub struct Scope {
    root: ServiceProvider,
    // One slot per scoped registration, indexed by `Registration::scoped_slot`.
    scoped_cells: Box<[OnceCell<AnyArc>]>,
}

impl Scope {
    pub(crate) fn new(root: ServiceProvider) -> Self {
        let scoped_count = root.inner().registry.scoped_count;
        let scoped_cells: Box<[OnceCell<AnyArc>]> = (0..scoped_count)
            .map(|_| OnceCell::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self { root, scoped_cells }
    }

    /// The provider this scope was created from.
    pub fn provider(&self) -> &ServiceProvider {
        &self.root
    }

    /// Number of scoped instances constructed so far in this scope.
    pub fn materialized(&self) -> usize {
        self.scoped_cells.iter().filter(|cell| cell.get().is_some()).count()
    }

    #[inline(always)]
    fn resolve_scoped(&self, reg: &Registration) -> DiResult<AnyArc> {
        let cell = reg
            .scoped_slot
            .and_then(|slot| self.scoped_cells.get(slot))
            .ok_or(DiError::WrongLifetime("Scoped registration has no slot in this scope"))?;

        cell.get_or_try_init(|| {
            let ctx = ResolverContext::new(self);
            (reg.ctor)(&ctx)
        })
        .cloned()
    }

    fn resolve_any_impl(&self, key: &Key) -> DiResult<AnyArc> {
        let inner = self.root.inner();
        let Some(reg) = inner.registry.get(key) else {
            let err = DiError::NotFound(key.display_name());
            inner.observers.failed(key, &err);
            return Err(err);
        };

        inner.observers.observe(key, reg.lifetime, || match reg.lifetime {
            Lifetime::Singleton => self.root.resolve_singleton(key, reg),
            Lifetime::Scoped => self.resolve_scoped(reg),
            Lifetime::Transient => {
                let ctx = ResolverContext::new(self);
                (reg.ctor)(&ctx)
            }
        })
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        let _guard = ResolutionGuard::enter(key.display_name())
            .inspect_err(|err| self.root.inner().observers.failed(key, err))?;
        self.resolve_any_impl(key)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("slots", &self.scoped_cells.len())
            .field("materialized", &self.materialized())
            .finish()
    }
}
