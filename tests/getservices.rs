use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use opscope::app::{self, GET_SERVICES_PATH};
use opscope::operation::SingletonOperation;
use opscope::{DiError, Lifetime, ServiceCollection, ServiceProvider};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceExt;
use uuid::Uuid;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
struct Ids {
    singleton: Uuid,
    transient: Uuid,
    scoped: Uuid,
}

fn parse_body(body: &str) -> Ids {
    let parts: Vec<&str> = body.split(" | ").collect();
    assert_eq!(parts.len(), 3, "unexpected body: {body}");

    let field = |part: &str, label: &str| -> Uuid {
        let id = part
            .strip_prefix(label)
            .and_then(|rest| rest.strip_prefix(" - "))
            .unwrap_or_else(|| panic!("expected `{label} - <id>`, got `{part}`"));
        Uuid::parse_str(id).unwrap()
    };

    Ids {
        singleton: field(parts[0], "Singleton"),
        transient: field(parts[1], "Transient"),
        scoped: field(parts[2], "Scoped"),
    }
}

fn provider() -> Arc<ServiceProvider> {
    Arc::new(app::build_services().build())
}

async fn call(router: Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_getservices_returns_three_ids() {
    let (status, content_type, body) = call(app::router(provider()), GET_SERVICES_PATH).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain"));

    let ids = parse_body(&body);
    assert_ne!(ids.singleton, ids.transient);
    assert_ne!(ids.singleton, ids.scoped);
    assert_ne!(ids.transient, ids.scoped);
}

#[tokio::test]
async fn test_successive_requests_follow_each_lifetime() {
    let router = app::router(provider());

    let (_, _, first) = call(router.clone(), GET_SERVICES_PATH).await;
    let (_, _, second) = call(router, GET_SERVICES_PATH).await;
    let first = parse_body(&first);
    let second = parse_body(&second);

    assert_eq!(first.singleton, second.singleton);
    assert_ne!(first.scoped, second.scoped);
    assert_ne!(first.transient, second.transient);
}

#[tokio::test]
async fn test_unregistered_capability_is_a_generic_server_error() {
    let router = app::router(Arc::new(ServiceCollection::new().build()));
    let (status, _, body) = call(router, GET_SERVICES_PATH).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");
}

#[tokio::test]
async fn test_failing_factory_is_a_generic_server_error() {
    let mut services = app::build_services();
    services.register_trait::<dyn SingletonOperation, _>(Lifetime::Singleton, |_| {
        Err(DiError::construction::<dyn SingletonOperation>("entropy source unavailable"))
    });
    let router = app::router(Arc::new(services.build()));

    let (status, _, body) = call(router, GET_SERVICES_PATH).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("entropy"));
}

#[tokio::test]
async fn test_router_without_provider_is_a_server_error() {
    let router = Router::new().route(GET_SERVICES_PATH, get(app::get_services));
    let (status, _, body) = call(router, GET_SERVICES_PATH).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");
}

#[tokio::test]
async fn test_other_paths_are_not_found() {
    let (status, _, _) = call(app::router(provider()), "/services").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_other_methods_are_not_allowed() {
    let response = app::router(provider())
        .oneshot(Request::post(GET_SERVICES_PATH).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_requests_share_the_singleton() {
    let router = app::router(provider());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let router = router.clone();
            tokio::spawn(async move { call(router, GET_SERVICES_PATH).await })
        })
        .collect();

    let mut bodies = Vec::new();
    for handle in handles {
        let (status, _, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        bodies.push(parse_body(&body));
    }

    assert!(bodies.iter().all(|ids| ids.singleton == bodies[0].singleton));
}

#[tokio::test]
async fn test_end_to_end_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(app::serve(listener, provider(), async move {
        let _ = stop_rx.await;
    }));

    let url = format!("http://{addr}{GET_SERVICES_PATH}");
    let first = reqwest::get(&url).await.unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);
    let first = parse_body(&first.text().await.unwrap());

    let second = parse_body(&reqwest::get(&url).await.unwrap().text().await.unwrap());

    assert_eq!(first.singleton, second.singleton);
    assert_ne!(first.scoped, second.scoped);
    assert_ne!(first.transient, second.transient);

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
