//! GraphQL client tests against a local stub endpoint

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use railtrack::errors::ApiError;
use railtrack::http::{HttpClient, PlatformApi};
use railtrack::models::{DeploymentKey, DeploymentStatus, LogTarget, Severity};

type Responder = Arc<dyn Fn(&Value) -> (StatusCode, String) + Send + Sync>;

/// Requests seen by the stub: authorization header and JSON body
type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

async fn stub<F>(respond: F) -> (String, Seen)
where
    F: Fn(&Value) -> (StatusCode, String) + Send + Sync + 'static,
{
    let respond: Responder = Arc::new(respond);
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();

    let app = Router::new().route(
        "/graphql",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let respond = respond.clone();
            let recorded = recorded.clone();
            async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let reply = respond(&body);
                recorded.lock().unwrap().push((auth, body));
                reply
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/graphql"), seen)
}

fn ok(body: Value) -> (StatusCode, String) {
    (StatusCode::OK, body.to_string())
}

fn query_of(body: &Value) -> &str {
    body["query"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_projects_are_read_from_edges_with_bearer() {
    let (endpoint, seen) = stub(|_| {
        ok(json!({
            "data": { "projects": { "edges": [
                { "node": { "id": "p2", "name": "api", "description": null,
                            "createdAt": "2025-01-01T00:00:00Z", "updatedAt": "2025-01-02T00:00:00Z" } },
                { "node": { "id": "p1", "name": "web", "description": "frontend",
                            "createdAt": "2025-01-01T00:00:00Z", "updatedAt": "2025-01-02T00:00:00Z" } }
            ] } }
        }))
    })
    .await;

    let client = HttpClient::new(&endpoint).unwrap();
    client.set_credential("secret-token".to_string());
    let projects = client.fetch_projects().await.unwrap();

    // Remote order is kept
    let ids: Vec<_> = projects.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p2", "p1"]);
    assert_eq!(projects[1].description.as_deref(), Some("frontend"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].0.as_deref(), Some("Bearer secret-token"));
    assert!(query_of(&seen[0].1).contains("projects"));
}

#[tokio::test]
async fn test_no_header_without_credential() {
    let (endpoint, seen) = stub(|_| ok(json!({ "data": { "projects": { "edges": [] } } }))).await;

    let client = HttpClient::new(&endpoint).unwrap();
    assert!(client.fetch_projects().await.unwrap().is_empty());

    assert!(seen.lock().unwrap()[0].0.is_none());
}

#[tokio::test]
async fn test_http_status_classification() {
    let (endpoint, _) = stub(|_| (StatusCode::UNAUTHORIZED, "bad token".to_string())).await;
    let client = HttpClient::new(&endpoint).unwrap();
    assert!(matches!(client.fetch_projects().await, Err(ApiError::Unauthorized(_))));

    let (endpoint, _) = stub(|_| (StatusCode::BAD_GATEWAY, "upstream".to_string())).await;
    let client = HttpClient::new(&endpoint).unwrap();
    assert!(matches!(client.fetch_projects().await, Err(ApiError::Unreachable(_))));
}

#[tokio::test]
async fn test_graphql_errors_classification() {
    let (endpoint, _) = stub(|_| {
        ok(json!({ "data": null, "errors": [{ "message": "Not Authorized" }] }))
    })
    .await;
    let client = HttpClient::new(&endpoint).unwrap();
    assert!(matches!(client.fetch_projects().await, Err(ApiError::Unauthorized(_))));

    let (endpoint, _) = stub(|_| {
        ok(json!({
            "data": { "projects": { "edges": [] } },
            "errors": [{ "message": "Problem processing request" }]
        }))
    })
    .await;
    let client = HttpClient::new(&endpoint).unwrap();
    assert!(matches!(
        client.fetch_projects().await,
        Err(ApiError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn test_malformed_bodies() {
    let (endpoint, _) = stub(|_| (StatusCode::OK, "<html>oops</html>".to_string())).await;
    let client = HttpClient::new(&endpoint).unwrap();
    assert!(matches!(
        client.fetch_projects().await,
        Err(ApiError::MalformedResponse(_))
    ));

    let (endpoint, _) = stub(|_| ok(json!({ "data": { "somethingElse": {} } }))).await;
    let client = HttpClient::new(&endpoint).unwrap();
    assert!(matches!(
        client.fetch_environments("p1").await,
        Err(ApiError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn test_deployments_skip_undecodable_nodes() {
    let (endpoint, seen) = stub(|_| {
        ok(json!({
            "data": { "deployments": { "edges": [
                { "node": { "id": "d2", "status": "BUILDING", "staticUrl": null,
                            "createdAt": "2025-01-01T00:02:00Z", "updatedAt": "2025-01-01T00:03:00Z",
                            "serviceId": "s1", "environmentId": "e1" } },
                { "node": { "id": "d1", "status": "QUEUED_ON_MARS",
                            "createdAt": "2025-01-01T00:00:00Z", "updatedAt": "2025-01-01T00:01:00Z",
                            "serviceId": "s1", "environmentId": "e1" } }
            ] } }
        }))
    })
    .await;

    let client = HttpClient::new(&endpoint).unwrap();
    let deployments = client
        .fetch_deployments(&DeploymentKey::new("s1", "e1"), 10)
        .await
        .unwrap();

    assert_eq!(deployments.len(), 1);
    assert_eq!(deployments[0].id, "d2");
    assert_eq!(deployments[0].status, DeploymentStatus::Building);

    let seen = seen.lock().unwrap();
    let variables = &seen[0].1["variables"];
    assert_eq!(variables["first"], 10);
    assert_eq!(variables["input"]["serviceId"], "s1");
    assert_eq!(variables["input"]["environmentId"], "e1");
}

#[tokio::test]
async fn test_service_logs_follow_newest_deployment() {
    let (endpoint, seen) = stub(|body| {
        if query_of(body).contains("deploymentLogs") {
            ok(json!({ "data": { "deploymentLogs": [
                { "message": "booting", "timestamp": "2025-01-01T00:00:00Z", "severity": "info" },
                { "message": "disk almost full", "timestamp": "2025-01-01T00:00:01Z", "severity": "WARN" },
                { "message": "panic", "timestamp": "2025-01-01T00:00:02Z", "severity": "error" },
                { "message": "???", "timestamp": "2025-01-01T00:00:03Z", "severity": "chatty" },
                { "message": "bare", "timestamp": "2025-01-01T00:00:04Z" }
            ] } }))
        } else {
            ok(json!({ "data": { "deployments": { "edges": [
                { "node": { "id": "d9", "status": "SUCCESS",
                            "createdAt": "2025-01-01T00:00:00Z", "updatedAt": "2025-01-01T00:00:00Z",
                            "serviceId": "s1", "environmentId": "e1" } }
            ] } } }))
        }
    })
    .await;

    let client = HttpClient::new(&endpoint).unwrap();
    let target = LogTarget::Service {
        service_id: "s1".to_string(),
        environment_id: "e1".to_string(),
    };
    let lines = client.fetch_logs(&target, 500).await.unwrap();

    let severities: Vec<_> = lines.iter().map(|l| l.severity).collect();
    assert_eq!(
        severities,
        vec![
            Severity::Info,
            Severity::Warning,
            Severity::Error,
            Severity::Info,
            Severity::Info
        ]
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].1["variables"]["first"], 1);
    assert_eq!(seen[1].1["variables"]["deploymentId"], "d9");
    assert_eq!(seen[1].1["variables"]["limit"], 500);
}

#[tokio::test]
async fn test_service_without_deployments_has_no_logs() {
    let (endpoint, seen) = stub(|_| ok(json!({ "data": { "deployments": { "edges": [] } } }))).await;

    let client = HttpClient::new(&endpoint).unwrap();
    let target = LogTarget::Service {
        service_id: "s1".to_string(),
        environment_id: "e1".to_string(),
    };

    assert!(client.fetch_logs(&target, 500).await.unwrap().is_empty());
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_connection_refused_is_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpClient::new(&format!("http://{addr}/graphql")).unwrap();
    assert!(matches!(client.fetch_projects().await, Err(ApiError::Unreachable(_))));
}
