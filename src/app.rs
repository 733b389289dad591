//! The `/getservices` application: container setup, route and server loop.

use std::future::Future;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::axum_integration::{create_app_with_di, DiScope};
use crate::config::AppConfig;
use crate::observer::TracingObserver;
use crate::operation::{add_operations, Operation, ScopedOperation, SingletonOperation, TransientOperation};
use crate::{DiError, ServiceCollection, ServiceProvider};

/// Path of the only route.
pub const GET_SERVICES_PATH: &str = "/getservices";

/// Container with the three operation capabilities and tracing of every
/// resolution.
pub fn build_services() -> ServiceCollection {
    let mut services = ServiceCollection::new();
    add_operations(&mut services);
    services.add_observer(Arc::new(TracingObserver::new()));
    services
}

/// Router serving `GET /getservices` from `provider`.
pub fn router(provider: Arc<ServiceProvider>) -> Router {
    create_app_with_di(provider, |router| router.route(GET_SERVICES_PATH, get(get_services)))
}

/// Formats the response body.
pub fn render_services(singleton: Uuid, transient: Uuid, scoped: Uuid) -> String {
    format!("Singleton - {singleton} | Transient - {transient} | Scoped - {scoped}")
}

/// Reports the identifier seen through each lifetime for this request.
pub async fn get_services(scope: DiScope) -> Result<String, ApiError> {
    let transient = scope.get_trait::<dyn TransientOperation>()?;
    let singleton = scope.get_trait::<dyn SingletonOperation>()?;
    let scoped = scope.get_trait::<dyn ScopedOperation>()?;

    Ok(render_services(
        singleton.operation_id(),
        transient.operation_id(),
        scoped.operation_id(),
    ))
}

/// Handler failure. Always a 500; the cause is logged, never returned.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] DiError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = if self.0.is_configuration() {
            "configuration"
        } else {
            "construction"
        };
        tracing::error!(error = %self.0, kind, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

/// Builds the provider for `config`, warming singletons when requested.
pub fn build_provider(config: &AppConfig) -> Result<Arc<ServiceProvider>, DiError> {
    let provider = build_services().build();
    if config.eager_singletons {
        provider.warm_singletons()?;
    }
    Ok(Arc::new(provider))
}

/// Serves the application on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    provider: Arc<ServiceProvider>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(provider);
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, path = GET_SERVICES_PATH, "listening");
    }
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
