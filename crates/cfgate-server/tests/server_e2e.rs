//! Server tests: full pipeline plus dispatcher, in memory and over TCP.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use cfgate_config::ServerConfig;
use cfgate_core::{
    handler_fn, ApiError, ApiResponse, AuthInfo, BoxFuture, Identity, IdentityProvider,
    RequestContext, RoleBinding, RoleBindingLister, CORRELATION_ID_HEADER,
};
use cfgate_middleware::stages::{
    AuthenticationMiddleware, CfUserMiddleware, CliVersionMiddleware, CorrelationMiddleware,
    LoggingMiddleware,
};
use cfgate_middleware::{Pipeline, Response};
use cfgate_server::{Dispatcher, Health, Route, RouteSet, Server, ShutdownSignal, HEALTH_PATH};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

struct AnyToken;

impl IdentityProvider for AnyToken {
    fn identity<'a>(&'a self, info: &'a AuthInfo) -> BoxFuture<'a, Result<Identity, ApiError>> {
        Box::pin(async move {
            match info {
                AuthInfo::Token(token) => Ok(Identity::user(token.clone())),
                AuthInfo::ClientCert(_) => Err(ApiError::invalid_auth_token()),
            }
        })
    }
}

struct NoBindings;

impl RoleBindingLister for NoBindings {
    fn list_role_bindings<'a>(
        &'a self,
        _namespace: &'a str,
    ) -> BoxFuture<'a, Result<Vec<RoleBinding>, ApiError>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

struct Apps;

impl RouteSet for Apps {
    fn authenticated_routes(&self) -> Vec<Route> {
        vec![
            Route::get(
                "/v3/apps/{guid}",
                handler_fn(|ctx: RequestContext| async move {
                    match ctx.param("guid") {
                        Some("missing") => Err(ApiError::not_found("App")),
                        Some(guid) => Ok(ApiResponse::ok(serde_json::json!({ "guid": guid }))),
                        None => Err(ApiError::not_found("App")),
                    }
                }),
            ),
            Route::get(
                "/v3/slow",
                handler_fn(|_ctx| async {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(ApiResponse::no_content())
                }),
            ),
            Route::post(
                "/v3/explode",
                handler_fn(|_ctx| async {
                    Err(ApiError::unknown(std::io::Error::other("database password leaked")))
                }),
            ),
        ]
    }
}

fn server_with(config: ServerConfig) -> Server {
    let pipeline = Pipeline::builder()
        .stage(CorrelationMiddleware::new())
        .stage(LoggingMiddleware::new())
        .stage(CliVersionMiddleware::new("8.5.0"))
        .stage(
            AuthenticationMiddleware::new(Arc::new(AnyToken))
                .and_then(|mw| mw.allow(HEALTH_PATH))
                .unwrap(),
        )
        .stage(CfUserMiddleware::new(Arc::new(NoBindings), "cf"))
        .build();

    let dispatcher = Dispatcher::builder()
        .request_timeout(config.request_timeout())
        .route_set(&Health)
        .unwrap()
        .route_set(&Apps)
        .unwrap()
        .build();

    Server::new(config, pipeline, dispatcher)
}

fn server() -> Server {
    server_with(ServerConfig::default())
}

fn get(path: &str, token: Option<&str>) -> http::Request<Full<Bytes>> {
    let mut builder = http::Request::builder().method(Method::GET).uri(path);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Full::new(Bytes::new())).unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_healthz_without_credentials() {
    let response = server().handle(get("/healthz", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(CORRELATION_ID_HEADER));
    assert_eq!(json_body(response).await, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn test_authenticated_route_with_warning() {
    let response = server().handle(get("/v3/apps/a-1", Some("alice"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-cf-warnings"));
    assert_eq!(json_body(response).await["guid"], "a-1");
}

#[tokio::test]
async fn test_trailing_slash_is_stripped() {
    let response = server().handle(get("/v3/apps/a-1/", Some("alice"))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_endpoint_renders_not_found() {
    let response = server().handle(get("/v3/nothing-here", Some("alice"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["title"], "CF-ResourceNotFound");
    assert_eq!(body["errors"][0]["code"], 10010);
}

#[tokio::test]
async fn test_handler_error_envelope_has_three_keys() {
    let response = server().handle(get("/v3/apps/missing", Some("alice"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body = json_body(response).await;
    let entry = body["errors"][0].as_object().unwrap();
    let mut keys: Vec<_> = entry.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["code", "detail", "title"]);
}

#[tokio::test]
async fn test_unknown_error_hides_cause() {
    let request = http::Request::builder()
        .method(Method::POST)
        .uri("/v3/explode")
        .header("authorization", "Bearer alice")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = server().handle(request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["title"], "UnknownError");
    assert!(!body.to_string().contains("password"));
}

#[tokio::test]
async fn test_unsupported_content_type_rejected_before_handler() {
    let request = http::Request::builder()
        .method(Method::POST)
        .uri("/v3/explode")
        .header("authorization", "Bearer alice")
        .header("content-type", "text/plain")
        .body(Full::new(Bytes::from_static(b"hello")))
        .unwrap();
    let response = server().handle(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["errors"][0]["detail"]
        .as_str()
        .unwrap()
        .contains("Unsupported Content-Type: text/plain"));
}

#[tokio::test(start_paused = true)]
async fn test_request_timeout_renders_unknown() {
    let config = ServerConfig {
        request_timeout_secs: 5,
        ..ServerConfig::default()
    };
    let response = server_with(config).handle(get("/v3/slow", Some("alice"))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_invalid_address_rejected() {
    let config = ServerConfig {
        http_addr: "not-an-address".to_string(),
        ..ServerConfig::default()
    };
    let err = server_with(config)
        .run_with_shutdown(ShutdownSignal::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid address"));
}

#[tokio::test]
async fn test_serves_over_tcp_and_shuts_down() {
    let config = ServerConfig {
        shutdown_timeout_secs: 1,
        ..ServerConfig::default()
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let running = tokio::spawn(server_with(config).serve(listener, shutdown.clone()));

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    assert!(raw.starts_with("HTTP/1.1 200 OK"));
    assert!(raw.to_ascii_lowercase().contains("x-correlation-id:"));
    assert!(raw.ends_with(r#"{"status":"ok"}"#));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("server stops after shutdown")
        .expect("task should not panic")
        .expect("clean shutdown");
}
