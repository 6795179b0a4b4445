//! Integration tests for the media-hub control API
//!
//! Exercises the router with `tower::ServiceExt::oneshot` over a broker
//! backed by fake engines.

mod helpers;

use axum::body::Body;
use axum::http::StatusCode;
use helpers::{FakeEngineFactory, RecordingPower};
use http::{Method, Request};
use http_body_util::BodyExt;
use mediahub_common::events::EventBus;
use mediahub_server::api::{create_router, AppContext};
use mediahub_server::engine::{EngineEvent, EngineState};
use mediahub_server::player::SessionSettings;
use mediahub_server::security::ConfiguredContextResolver;
use mediahub_server::SessionBroker;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct TestServer {
    app: axum::Router,
    broker: Arc<SessionBroker>,
    factory: Arc<FakeEngineFactory>,
}

fn setup_test_server() -> TestServer {
    let factory = Arc::new(FakeEngineFactory::default());
    let resolver = ConfiguredContextResolver::new(
        "",
        HashMap::from([
            (
                "music".to_string(),
                "com.ubuntu.music_music_2.0".to_string(),
            ),
            ("shell".to_string(), "unconfined".to_string()),
        ]),
    );
    let broker = SessionBroker::new(
        factory.clone(),
        Arc::new(RecordingPower::default()),
        Arc::new(resolver),
        SessionSettings::default(),
        EventBus::new(256),
    );
    let app = create_router(AppContext {
        broker: broker.clone(),
    });
    TestServer {
        app,
        broker,
        factory,
    }
}

/// Send one request; returns status and parsed JSON body (if any)
async fn make_request(
    app: &axum::Router,
    method: Method,
    path: &str,
    body: Option<Value>,
    client_id: Option<&str>,
) -> (StatusCode, Option<Value>) {
    let mut request = Request::builder().method(method).uri(path);
    if let Some(id) = client_id {
        request = request.header("x-client-id", id);
    }

    let request = match body {
        Some(json_body) => request
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let json_body = if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(&bytes).ok()
    };
    (status, json_body)
}

async fn create_session(app: &axum::Router) -> u64 {
    let (status, body) = make_request(app, Method::POST, "/api/v1/sessions", None, None).await;
    assert_eq!(status, StatusCode::CREATED);
    body.unwrap()["key"].as_u64().unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = setup_test_server();
    create_session(&server.app).await;

    let (status, body) = make_request(&server.app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.expect("Expected response body");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "media_hub");
    assert_eq!(body["sessions"], 1);
    assert!(body["version"].is_string());
    assert!(body["git_hash"].is_string());
    assert!(body["build_timestamp"].is_string());
    assert!(body["build_profile"].is_string());
}

#[tokio::test]
async fn test_session_lifecycle() {
    let server = setup_test_server();
    let key = create_session(&server.app).await;

    let (status, body) = make_request(
        &server.app,
        Method::GET,
        &format!("/api/v1/sessions/{}/key", key),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["key"], key);

    let (status, _) = make_request(
        &server.app,
        Method::DELETE,
        &format!("/api/v1/sessions/{}", key),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(server.broker.session_count(), 0);

    let (status, body) = make_request(
        &server.app,
        Method::POST,
        &format!("/api/v1/sessions/{}/play", key),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.unwrap()["status"]
        .as_str()
        .unwrap()
        .starts_with("error"));
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let server = setup_test_server();
    for path in [
        "/api/v1/sessions/99/pause",
        "/api/v1/sessions/99/stop",
        "/api/v1/sessions/99/next",
    ] {
        let (status, _) = make_request(&server.app, Method::POST, path, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", path);
    }
    let (status, _) = make_request(
        &server.app,
        Method::DELETE,
        "/api/v1/sessions/99",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_open_checks_client_access() {
    let server = setup_test_server();
    let key = create_session(&server.app).await;
    let path = format!("/api/v1/sessions/{}/open", key);

    let (status, body) = make_request(
        &server.app,
        Method::POST,
        &path,
        Some(json!({"uri": "file:///home/u/Music/song.ogg"})),
        Some("music"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["opened"], true);

    // Unknown client resolves to the empty default context
    let (_, body) = make_request(
        &server.app,
        Method::POST,
        &path,
        Some(json!({"uri": "file:///home/u/Music/song.ogg"})),
        None,
    )
    .await;
    assert_eq!(body.unwrap()["opened"], false);

    let (_, body) = make_request(
        &server.app,
        Method::POST,
        &path,
        Some(json!({"uri": "http://host/live", "headers": {"Cookie": "a=b"}})),
        Some("shell"),
    )
    .await;
    assert_eq!(body.unwrap()["opened"], true);

    let engine = server.factory.engine(key as u32);
    assert_eq!(
        engine.opened(),
        vec!["file:///home/u/Music/song.ogg", "http://host/live"]
    );
    assert_eq!(engine.opened_headers()[0].get("Cookie").unwrap(), "a=b");
}

#[tokio::test]
async fn test_open_empty_uri_is_false() {
    let server = setup_test_server();
    let key = create_session(&server.app).await;

    let (status, body) = make_request(
        &server.app,
        Method::POST,
        &format!("/api/v1/sessions/{}/open", key),
        Some(json!({"uri": ""})),
        Some("shell"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["opened"], false);
}

#[tokio::test]
async fn test_transport_routes() {
    let server = setup_test_server();
    let key = create_session(&server.app).await;
    let engine = server.factory.engine(key as u32);

    for action in ["play", "pause", "stop", "next", "previous"] {
        let (status, body) = make_request(
            &server.app,
            Method::POST,
            &format!("/api/v1/sessions/{}/{}", key, action),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", action);
        assert_eq!(body.unwrap()["ok"], true, "{}", action);
    }

    let (status, _) = make_request(
        &server.app,
        Method::POST,
        &format!("/api/v1/sessions/{}/seek", key),
        Some(json!({"offset_us": 1_500_000})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = make_request(
        &server.app,
        Method::POST,
        &format!("/api/v1/sessions/{}/video_sink", key),
        Some(json!({"texture_id": 3})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(engine.play_calls(), 1);
    assert_eq!(engine.pause_calls(), 1);
    assert_eq!(engine.stop_calls(), 1);
    assert_eq!(engine.seeks().len(), 1);
    assert_eq!(engine.video_sinks(), vec![3]);
}

#[tokio::test]
async fn test_play_pause_route() {
    let server = setup_test_server();
    let key = create_session(&server.app).await;
    let session = server.broker.session(key as u32).unwrap();
    let engine = server.factory.engine(key as u32);

    session.handle_engine_event(EngineEvent::StateChanged(EngineState::Playing));

    let (status, body) = make_request(
        &server.app,
        Method::POST,
        &format!("/api/v1/sessions/{}/play_pause", key),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["ok"], true);
    assert_eq!(engine.pause_calls(), 1);
}

#[tokio::test]
async fn test_properties_read_and_update() {
    let server = setup_test_server();
    let key = create_session(&server.app).await;
    let path = format!("/api/v1/sessions/{}/properties", key);

    let (status, body) = make_request(&server.app, Method::GET, &path, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["playback_status"], "null");
    assert_eq!(body["shuffle"], true);
    assert_eq!(body["audio_stream_role"], "multimedia");
    assert_eq!(body["lifetime"], "normal");
    assert_eq!(body["duration"], 180_000_000u64);

    let (status, body) = make_request(
        &server.app,
        Method::PATCH,
        &path,
        Some(json!({"volume": 0.5, "loop_status": "playlist", "lifetime": "resumable"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["volume"], 0.5);
    assert_eq!(body["loop_status"], "playlist");
    assert_eq!(body["lifetime"], "resumable");

    let (status, _) = make_request(&server.app, Method::PATCH, &path, Some(json!({})), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_track_queue_routes() {
    let server = setup_test_server();
    let key = create_session(&server.app).await;
    let tracks = format!("/api/v1/sessions/{}/tracks", key);

    let (status, body) = make_request(
        &server.app,
        Method::POST,
        &tracks,
        Some(json!({"uri": "file:///m/b.ogg"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let b = body.unwrap()["track_id"].clone();

    let (_, body) = make_request(
        &server.app,
        Method::POST,
        &tracks,
        Some(json!({"uri": "file:///m/a.ogg", "before": b, "make_current": true})),
        None,
    )
    .await;
    let a = body.unwrap()["track_id"].clone();

    let (status, body) = make_request(&server.app, Method::GET, &tracks, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["can_edit"], true);
    assert_eq!(body["current"], a);
    let list = body["tracks"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["track_id"], a);
    assert_eq!(list[0]["uri"], "file:///m/a.ogg");
    assert_eq!(list[1]["metadata"]["xesam:url"], "file:///m/b.ogg");

    let (status, _) = make_request(
        &server.app,
        Method::POST,
        &format!("{}/goto", tracks),
        Some(json!({"track_id": b})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = make_request(
        &server.app,
        Method::POST,
        &format!("{}/remove", tracks),
        Some(json!({"track_id": a})),
        None,
    )
    .await;
    assert_eq!(body.unwrap()["removed"], true);

    let (_, body) = make_request(
        &server.app,
        Method::POST,
        &format!("{}/remove", tracks),
        Some(json!({"track_id": "/no/such/track"})),
        None,
    )
    .await;
    assert_eq!(body.unwrap()["removed"], false);

    let (_, body) = make_request(&server.app, Method::GET, &tracks, None, None).await;
    let body = body.unwrap();
    assert_eq!(body["tracks"].as_array().unwrap().len(), 1);
    assert!(body["current"].is_null());
}

#[tokio::test]
async fn test_add_track_rejects_empty_uri() {
    let server = setup_test_server();
    let key = create_session(&server.app).await;

    let (status, _) = make_request(
        &server.app,
        Method::POST,
        &format!("/api/v1/sessions/{}/tracks", key),
        Some(json!({"uri": ""})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Event stream
// ============================================================================

/// Read SSE frames until `count` events arrived or the stream goes quiet;
/// returns (event name, JSON payload) pairs
async fn read_sse_events(body: &mut Body, count: usize) -> Vec<(String, Value)> {
    let mut buffer = String::new();
    let mut events = Vec::new();

    while events.len() < count {
        let frame = match tokio::time::timeout(Duration::from_secs(1), body.frame()).await {
            Ok(Some(Ok(frame))) => frame,
            _ => break,
        };
        let Ok(data) = frame.into_data() else {
            continue;
        };
        buffer.push_str(&String::from_utf8_lossy(&data));

        while let Some(end) = buffer.find("\n\n") {
            let block: String = buffer.drain(..end + 2).collect();
            let mut name = None;
            let mut payload = None;
            for line in block.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    name = Some(value.trim_start().to_string());
                } else if let Some(value) = line.strip_prefix("data:") {
                    payload = serde_json::from_str::<Value>(value.trim_start()).ok();
                }
            }
            // Keep-alive comments carry neither field
            if let (Some(name), Some(payload)) = (name, payload) {
                events.push((name, payload));
            }
        }
    }
    events
}

#[tokio::test]
async fn test_event_stream_filters_by_session_key() {
    let server = setup_test_server();
    let other = create_session(&server.app).await;
    let key = create_session(&server.app).await;

    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("/api/v1/events?key={}", key))
        .body(Body::empty())
        .unwrap();
    let response = server.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    let mut body = response.into_body();

    // Events for the other session must not reach this subscriber
    make_request(
        &server.app,
        Method::POST,
        &format!("/api/v1/sessions/{}/tracks", other),
        Some(json!({"uri": "file:///m/other.ogg"})),
        None,
    )
    .await;
    make_request(
        &server.app,
        Method::POST,
        &format!("/api/v1/sessions/{}/tracks", key),
        Some(json!({"uri": "file:///m/mine.ogg"})),
        None,
    )
    .await;
    make_request(
        &server.app,
        Method::PATCH,
        &format!("/api/v1/sessions/{}/properties", key),
        Some(json!({"volume": 0.25})),
        None,
    )
    .await;

    let events = read_sse_events(&mut body, 2).await;
    assert_eq!(events.len(), 2, "events: {:?}", events);
    for (name, payload) in &events {
        assert_eq!(payload["type"], name.as_str());
        assert_eq!(payload["key"], key);
    }
    assert_eq!(events[0].0, "TrackAdded");
    assert_eq!(events[1].0, "PropertyChanged");

    // Nothing else queued, in particular nothing for the other session
    assert!(read_sse_events(&mut body, 1).await.is_empty());
    assert_eq!(server.broker.session_count(), 2);
}
