//! Resolver context for dependency injection.
//!
//! This module contains the ResolverContext type which provides
//! the interface for factory functions to resolve dependencies.

use std::any::Any;
use std::sync::Arc;

use crate::error::DiResult;
use crate::key::Key;
use crate::traits::ResolverCore;

/// Context passed to factory functions for resolving dependencies.
///
/// Wraps whichever resolver invoked the factory. Singleton factories always
/// see the root provider, so a singleton cannot capture a scoped dependency;
/// scoped and transient factories resolved through a scope see that scope.
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
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database {
///     url: "postgres://localhost".to_string()
/// });
/// services.add_transient_factory::<UserService, _>(|resolver| {
///     UserService {
///         db: resolver.get_required::<Database>(),
///     }
/// });
///
/// let provider = services.build();
/// assert_eq!(provider.get_required::<UserService>().db.url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    resolver: &'a dyn ResolverCore,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new<T>(resolver: &'a T) -> Self
    where
        T: ResolverCore,
    {
        Self { resolver }
    }
}

impl<'a> ResolverCore for ResolverContext<'a> {
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>> {
        self.resolver.resolve_any(key)
    }
}
