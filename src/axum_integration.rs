//! Axum web framework integration.
//!
//! The provider is installed on the router as an `Extension`; the [`DiScope`]
//! extractor turns it into a fresh [`Scope`] for every request. The scope is
//! dropped with the extractor when the handler returns, which ends the
//! request's scoped instances.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Extension, Router,
};

use crate::traits::Resolver;
use crate::{DiResult, Scope, ServiceProvider};

/// Extractor for the request-scoped DI container
pub struct DiScope {
    scope: Scope,
}

impl DiScope {
    /// Resolve a concrete service from the request scope
    pub fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.scope.get()
    }

    /// Resolve a trait capability from the request scope
    pub fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.scope.get_trait()
    }

    /// Get a required service from the scoped container
    ///
    /// # Panics
    ///
    /// Panics if the service cannot be resolved.
    pub fn get_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        self.scope.get_required()
    }

    /// Get the underlying scope for advanced usage
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for DiScope
where
    S: Send + Sync,
{
    type Rejection = DiRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let provider = parts
            .extensions
            .get::<Arc<ServiceProvider>>()
            .ok_or(DiRejection::MissingProvider)?;

        Ok(DiScope {
            scope: provider.create_scope(),
        })
    }
}

/// Rejection type for DI extraction failures
#[derive(Debug, thiserror::Error)]
pub enum DiRejection {
    #[error("ServiceProvider not found in request extensions; build the router with create_app_with_di")]
    MissingProvider,
}

impl IntoResponse for DiRejection {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request scope could not be created");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

/// Builds a router whose handlers can extract [`DiScope`].
///
/// ```rust
/// use axum::routing::get;
/// use opscope::axum_integration::{create_app_with_di, DiScope};
/// use opscope::ServiceCollection;
/// use std::sync::Arc;
///
/// async fn handler(scope: DiScope) -> String {
///     scope.get::<String>().map(|s| s.to_string()).unwrap_or_default()
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton("v1".to_string());
/// let provider = Arc::new(services.build());
///
/// let app = create_app_with_di(provider, |router| router.route("/version", get(handler)));
/// # let _ = app;
/// ```
pub fn create_app_with_di<F>(provider: Arc<ServiceProvider>, configure: F) -> Router
where
    F: FnOnce(Router) -> Router,
{
    configure(Router::new()).layer(Extension(provider))
}
