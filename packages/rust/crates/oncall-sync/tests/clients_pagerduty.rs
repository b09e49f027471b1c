#![allow(missing_docs)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
};
use chrono::DateTime;
use oncall_sync::{OnCallSource, PagerDutyClient, SyncError};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct SeenRequest {
    schedule_id: String,
    authorization: String,
    accept: String,
    since: String,
    until: String,
}

#[derive(Clone, Default)]
struct MockPagerDutyState {
    requests: Arc<Mutex<Vec<SeenRequest>>>,
}

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn handle_schedule_users(
    State(state): State<MockPagerDutyState>,
    Path(schedule_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    state.requests.lock().await.push(SeenRequest {
        schedule_id: schedule_id.clone(),
        authorization: header(&headers, "authorization"),
        accept: header(&headers, "accept"),
        since: query.get("since").cloned().unwrap_or_default(),
        until: query.get("until").cloned().unwrap_or_default(),
    });

    match schedule_id.as_str() {
        "PBROKEN" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": {"message": "boom"}})),
        ),
        "PEMPTY" => (StatusCode::OK, Json(serde_json::json!({"users": []}))),
        _ => (
            StatusCode::OK,
            Json(serde_json::json!({
                "users": [
                    {"id": "PU1", "email": "alice@example.com"},
                    {"id": "PU2", "email": "Bob@example.com"},
                    {"id": "PU3"},
                    {"id": "PU4", "email": "bob@example.com"},
                    {"id": "PU5", "email": " carol@example.com "}
                ]
            })),
        ),
    }
}

async fn spawn_mock_pagerduty_api()
-> Result<Option<(String, MockPagerDutyState, tokio::task::JoinHandle<()>)>> {
    let state = MockPagerDutyState::default();
    let app = Router::new()
        .route("/schedules/{schedule_id}/users", get(handle_schedule_users))
        .with_state(state.clone());

    let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
            eprintln!("skipping pagerduty client tests: local socket bind is not permitted");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    tokio::time::sleep(Duration::from_millis(40)).await;
    Ok(Some((format!("http://{addr}"), state, handle)))
}

fn window_secs(request: &SeenRequest) -> Result<i64> {
    let since = DateTime::parse_from_rfc3339(&request.since)?;
    let until = DateTime::parse_from_rfc3339(&request.until)?;
    Ok((until - since).num_seconds())
}

#[tokio::test]
async fn current_on_call_sends_auth_and_one_second_window() -> Result<()> {
    let Some((api_base, state, handle)) = spawn_mock_pagerduty_api().await? else {
        return Ok(());
    };

    let client = PagerDutyClient::with_base_url("pd-token", &format!("{api_base}/"))?;
    let emails = client.current_on_call("PSCHED1").await?;

    assert_eq!(
        emails,
        vec![
            "alice@example.com".to_string(),
            "Bob@example.com".to_string(),
            "carol@example.com".to_string(),
        ]
    );

    let requests = state.requests.lock().await.clone();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.schedule_id, "PSCHED1");
    assert_eq!(request.authorization, "Token token=pd-token");
    assert_eq!(request.accept, "application/vnd.pagerduty+json;version=2");
    assert_eq!(window_secs(request)?, 1);

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn on_call_within_uses_lookahead_window() -> Result<()> {
    let Some((api_base, state, handle)) = spawn_mock_pagerduty_api().await? else {
        return Ok(());
    };

    let client = PagerDutyClient::with_base_url("pd-token", &api_base)?;
    let emails = client
        .on_call_within("PSCHED1", Duration::from_secs(7 * 24 * 3600))
        .await?;
    assert_eq!(emails.len(), 3);

    let empty = client
        .on_call_within("PEMPTY", Duration::from_secs(3600))
        .await?;
    assert!(empty.is_empty());

    let requests = state.requests.lock().await.clone();
    assert_eq!(window_secs(&requests[0])?, 7 * 24 * 3600);
    assert_eq!(window_secs(&requests[1])?, 3600);

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn server_error_maps_to_upstream_unavailable() -> Result<()> {
    let Some((api_base, _state, handle)) = spawn_mock_pagerduty_api().await? else {
        return Ok(());
    };

    let client = PagerDutyClient::with_base_url("pd-token", &api_base)?;
    let error = client
        .current_on_call("PBROKEN")
        .await
        .expect_err("500 should fail");

    match error {
        SyncError::UpstreamUnavailable {
            rotation_id,
            message,
        } => {
            assert_eq!(rotation_id, "PBROKEN");
            assert!(message.contains("500"), "unexpected message: {message}");
            assert!(message.contains("boom"), "unexpected message: {message}");
        }
        other => panic!("expected UpstreamUnavailable, got {other:?}"),
    }
    assert!(!SyncError::UpstreamUnavailable {
        rotation_id: String::new(),
        message: String::new(),
    }
    .is_fatal());

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn unreachable_host_maps_to_upstream_unavailable() -> Result<()> {
    let client = PagerDutyClient::with_base_url("pd-token", "http://127.0.0.1:1")?;
    let error = client
        .current_on_call("PSCHED1")
        .await
        .expect_err("connection refused");
    assert!(matches!(error, SyncError::UpstreamUnavailable { .. }));
    Ok(())
}

#[test]
fn blank_token_is_rejected() {
    let error = PagerDutyClient::new("  ").err().expect("blank token");
    assert!(matches!(
        error,
        SyncError::ClientInit {
            client: "pagerduty",
            ..
        }
    ));
    assert!(error.is_fatal());
}
