//! Service lifetime definitions.

use std::fmt;

/// Service lifetimes controlling instance caching behavior
///
/// Defines how long a constructed instance is reused once the container has
/// built it.
///
/// # Lifetime Characteristics
///
/// - **Singleton**: one instance per provider, i.e. per running process
/// - **Scoped**: one instance per scope, i.e. per inbound request
/// - **Transient**: a new instance on every resolution
///
/// # Examples
///
/// ```rust
/// use opscope::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db_url: String }
/// struct RequestModel { id: u32 }
///
/// let mut services = ServiceCollection::new();
///
/// services.add_singleton(Database {
///     url: "postgres://localhost".to_string()
/// });
/// services.add_scoped_factory::<Repository, _>(|r| {
///     let db = r.get_required::<Database>();
///     Repository { db_url: db.url.clone() }
/// });
/// services.add_transient_factory::<RequestModel, _>(|_| {
///     RequestModel { id: 12345 }
/// });
///
/// let provider = services.build();
///
/// // Singleton: same instance across scopes
/// let db1 = provider.get_required::<Database>();
/// let scope1 = provider.create_scope();
/// let db2 = scope1.get_required::<Database>();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// // Scoped: same within a scope, different across scopes
/// let repo1a = scope1.get_required::<Repository>();
/// let repo1b = scope1.get_required::<Repository>();
/// assert!(Arc::ptr_eq(&repo1a, &repo1b));
///
/// let scope2 = provider.create_scope();
/// let repo2 = scope2.get_required::<Repository>();
/// assert!(!Arc::ptr_eq(&repo1a, &repo2));
///
/// // Transient: always different
/// let model1 = scope1.get_required::<RequestModel>();
/// let model2 = scope1.get_required::<RequestModel>();
/// assert!(!Arc::ptr_eq(&model1, &model2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Single instance per root provider, cached until the provider is dropped
    ///
    /// Created on first resolution (or by
    /// [`ServiceProvider::warm_singletons`](crate::ServiceProvider::warm_singletons))
    /// and shared across all scopes and threads.
    Singleton,
    /// Single instance per scope, cached for the scope's lifetime
    ///
    /// Only resolvable through a [`Scope`](crate::Scope). In the HTTP layer a
    /// scope lives exactly as long as one request.
    Scoped,
    /// New instance per resolution, never cached
    Transient,
}

impl Lifetime {
    /// Human-facing label, matching the names used in the `/getservices` body.
    pub fn label(self) -> &'static str {
        match self {
            Lifetime::Singleton => "Singleton",
            Lifetime::Scoped => "Scoped",
            Lifetime::Transient => "Transient",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
