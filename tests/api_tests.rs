//! End-to-end tests for the HTTP surface.
//!
//! The router is driven directly with `tower::ServiceExt::oneshot` against a
//! stub control plane; the task metadata endpoint is a real HTTP server bound
//! to an ephemeral local port so the metadata client's network behavior
//! (timeouts, refused connections) is exercised for real.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use capmap::config::{
    AppConfig, EcsConfig, HttpServerConfig, LoggingConfig, MetadataConfig,
};
use capmap::ecs::{ControlPlane, TaskDescription, UpstreamError};
use capmap::metadata::MetadataClient;
use capmap::routes::create_router;
use capmap::state::AppState;

/// Stub control plane with canned task data and call recording.
struct StubControlPlane {
    /// (task ARN, capacity provider) pairs returned by describe
    tasks: Vec<(String, Option<String>)>,
    fail_list: bool,
    /// Clusters each operation was invoked with
    list_calls: Mutex<Vec<String>>,
    describe_calls: Mutex<Vec<String>>,
}

impl StubControlPlane {
    fn with_tasks(tasks: Vec<(&str, Option<&str>)>) -> Self {
        Self {
            tasks: tasks
                .into_iter()
                .map(|(arn, cp)| (arn.to_string(), cp.map(str::to_string)))
                .collect(),
            fail_list: false,
            list_calls: Mutex::new(Vec::new()),
            describe_calls: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            tasks: Vec::new(),
            fail_list: true,
            list_calls: Mutex::new(Vec::new()),
            describe_calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ControlPlane for StubControlPlane {
    async fn list_tasks(&self, cluster: &str) -> Result<Vec<String>, UpstreamError> {
        self.list_calls.lock().unwrap().push(cluster.to_string());
        if self.fail_list {
            return Err(UpstreamError::new(
                "ListTasks",
                cluster,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "not authorized"),
            ));
        }
        Ok(self.tasks.iter().map(|(arn, _)| arn.clone()).collect())
    }

    async fn describe_tasks(
        &self,
        cluster: &str,
        tasks: &[String],
    ) -> Result<Vec<TaskDescription>, UpstreamError> {
        self.describe_calls.lock().unwrap().push(cluster.to_string());
        Ok(self
            .tasks
            .iter()
            .filter(|(arn, _)| tasks.contains(arn))
            .map(|(arn, cp)| TaskDescription {
                task_arn: arn.clone(),
                capacity_provider_name: cp.clone(),
            })
            .collect())
    }
}

/// Spawn a metadata endpoint stub serving the given body at `/task`.
async fn spawn_metadata_stub(body: &'static str, delay: Option<Duration>) -> SocketAddr {
    let app = Router::new().route(
        "/task",
        get(move || async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            body
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind metadata stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve metadata stub");
    });
    addr
}

/// An address nothing is listening on.
async fn unreachable_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe addr");
    drop(listener);
    addr
}

fn test_config(metadata_base: String) -> AppConfig {
    AppConfig {
        http: HttpServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        ecs: EcsConfig {
            list_cluster: "pool-cluster".to_string(),
            describe_cluster: "workload-cluster".to_string(),
            region: None,
        },
        metadata: MetadataConfig {
            base_url: Some(metadata_base),
            timeout_seconds: 1,
        },
        logging: LoggingConfig::default(),
    }
}

fn build_router(control_plane: Arc<dyn ControlPlane>, metadata_base: String) -> Router {
    let config = test_config(metadata_base.clone());
    let metadata = MetadataClient::new(metadata_base, &config.metadata).expect("client");
    create_router(AppState::new(config, control_plane, metadata))
}

async fn get_json(app: Router, path: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_is_ok_and_touches_no_upstream() {
    // A control plane that fails loudly if consulted
    let control_plane = Arc::new(StubControlPlane::failing());
    let base = format!("http://{}", unreachable_addr().await);
    let app = build_router(control_plane.clone(), base);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(&bytes[..], &b"ok"[..]);
    assert!(control_plane.list_calls.lock().unwrap().is_empty());
    assert!(control_plane.describe_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn report_maps_tasks_to_providers_with_sentinel() {
    let control_plane = Arc::new(StubControlPlane::with_tasks(vec![
        ("arn:1", Some("cp-a")),
        ("arn:2", None),
    ]));
    let addr = spawn_metadata_stub(r#"{"TaskARN":"arn:1"}"#, None).await;
    let app = build_router(control_plane.clone(), format!("http://{}", addr));

    let (status, body) = get_json(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({
            "MY_ARN": "arn:1",
            "ALL_TASKS": {"arn:1": "cp-a", "arn:2": "NON_DEFAULT"}
        })
    );

    // The list/describe cluster asymmetry is part of the contract.
    assert_eq!(
        *control_plane.list_calls.lock().unwrap(),
        vec!["pool-cluster".to_string()]
    );
    assert_eq!(
        *control_plane.describe_calls.lock().unwrap(),
        vec!["workload-cluster".to_string()]
    );
}

#[tokio::test]
async fn empty_cluster_yields_empty_report() {
    let control_plane = Arc::new(StubControlPlane::with_tasks(vec![]));
    let addr = spawn_metadata_stub(r#"{"TaskARN":"arn:me"}"#, None).await;
    let app = build_router(control_plane.clone(), format!("http://{}", addr));

    let (status, body) = get_json(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["MY_ARN"], "arn:me");
    assert_eq!(body["ALL_TASKS"], serde_json::json!({}));
    // Describe must be skipped entirely for an empty listing
    assert!(control_plane.describe_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_metadata_endpoint_is_bad_gateway() {
    let control_plane = Arc::new(StubControlPlane::with_tasks(vec![(
        "arn:1",
        Some("cp-a"),
    )]));
    let base = format!("http://{}", unreachable_addr().await);
    let app = build_router(control_plane, base);

    let (status, body) = get_json(app, "/").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "network");
    assert!(body.get("ALL_TASKS").is_none());
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn metadata_timeout_is_not_a_success() {
    let control_plane = Arc::new(StubControlPlane::with_tasks(vec![(
        "arn:1",
        Some("cp-a"),
    )]));
    // Stub responds well past the 1s client timeout
    let addr = spawn_metadata_stub(r#"{"TaskARN":"arn:1"}"#, Some(Duration::from_secs(3))).await;
    let app = build_router(control_plane, format!("http://{}", addr));

    let (status, body) = get_json(app, "/").await;

    assert_ne!(status, StatusCode::OK);
    assert!(body.get("ALL_TASKS").is_none());
}

#[tokio::test]
async fn metadata_without_task_arn_is_missing_field() {
    let control_plane = Arc::new(StubControlPlane::with_tasks(vec![]));
    let addr = spawn_metadata_stub(r#"{"Cluster":"workload-cluster"}"#, None).await;
    let app = build_router(control_plane, format!("http://{}", addr));

    let (status, body) = get_json(app, "/").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "missing_field");
}

#[tokio::test]
async fn upstream_failure_is_a_structured_error() {
    let control_plane = Arc::new(StubControlPlane::failing());
    let addr = spawn_metadata_stub(r#"{"TaskARN":"arn:1"}"#, None).await;
    let app = build_router(control_plane, format!("http://{}", addr));

    let (status, body) = get_json(app, "/").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream");
    assert!(body["message"]
        .as_str()
        .expect("message is a string")
        .contains("ListTasks"));
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn report_is_served_with_no_store() {
    let control_plane = Arc::new(StubControlPlane::with_tasks(vec![]));
    let addr = spawn_metadata_stub(r#"{"TaskARN":"arn:me"}"#, None).await;
    let app = build_router(control_plane, format!("http://{}", addr));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(http::header::CACHE_CONTROL)
            .expect("cache-control header"),
        "no-store"
    );
}
