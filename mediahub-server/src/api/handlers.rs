//! HTTP request handlers
//!
//! Each handler resolves the session from the path key and forwards to the
//! player control surface. Unknown keys map to 404.

use crate::api::server::AppContext;
use crate::engine::Headers;
use crate::error::Error;
use crate::player::{PropertiesSnapshot, PropertiesUpdate};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use mediahub_common::events::{PlayerKey, TrackId, TrackMetadata};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Header carrying the caller's identity for access checks
pub const CLIENT_ID_HEADER: &str = "x-client-id";

type ApiError = (StatusCode, Json<StatusResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
    pub build_profile: String,
    pub sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub key: PlayerKey,
}

/// Result of a transport call as reported by the engine
#[derive(Debug, Serialize, Deserialize)]
pub struct TransportResponse {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    /// Absolute offset in microseconds
    pub offset_us: u64,
}

#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    pub uri: String,
    #[serde(default)]
    pub headers: Option<Headers>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenResponse {
    pub opened: bool,
}

#[derive(Debug, Deserialize)]
pub struct VideoSinkRequest {
    pub texture_id: u32,
}

#[derive(Debug, Deserialize)]
pub struct AddTrackRequest {
    pub uri: String,
    /// Insert before this track; append when absent or unknown
    #[serde(default)]
    pub before: Option<TrackId>,
    #[serde(default)]
    pub make_current: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddTrackResponse {
    pub track_id: TrackId,
}

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub track_id: TrackId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveTrackResponse {
    pub removed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackInfo {
    pub track_id: TrackId,
    pub uri: String,
    pub metadata: TrackMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackListResponse {
    pub can_edit: bool,
    pub current: Option<TrackId>,
    pub tracks: Vec<TrackInfo>,
}

fn error_response(e: Error) -> ApiError {
    let status = match &e {
        Error::SessionNotFound(_) => StatusCode::NOT_FOUND,
        Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "media_hub".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
        sessions: ctx.broker.session_count(),
    })
}

// ============================================================================
// Session Lifecycle
// ============================================================================

/// POST /api/v1/sessions
pub async fn create_session(
    State(ctx): State<AppContext>,
) -> (StatusCode, Json<SessionResponse>) {
    let session = ctx.broker.create_session();
    (
        StatusCode::CREATED,
        Json(SessionResponse { key: session.key() }),
    )
}

/// DELETE /api/v1/sessions/:key
pub async fn destroy_session(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
) -> ApiResult<StatusResponse> {
    ctx.broker.destroy_session(key).map_err(error_response)?;
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

/// GET /api/v1/sessions/:key/key
pub async fn get_key(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
) -> ApiResult<SessionResponse> {
    let session = ctx.broker.session(key).map_err(error_response)?;
    Ok(Json(SessionResponse { key: session.key() }))
}

// ============================================================================
// Transport
// ============================================================================

/// POST /api/v1/sessions/:key/play
pub async fn play(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
) -> ApiResult<TransportResponse> {
    let session = ctx.broker.session(key).map_err(error_response)?;
    Ok(Json(TransportResponse { ok: session.play() }))
}

/// POST /api/v1/sessions/:key/pause
pub async fn pause(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
) -> ApiResult<TransportResponse> {
    let session = ctx.broker.session(key).map_err(error_response)?;
    Ok(Json(TransportResponse { ok: session.pause() }))
}

/// POST /api/v1/sessions/:key/stop
pub async fn stop(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
) -> ApiResult<TransportResponse> {
    let session = ctx.broker.session(key).map_err(error_response)?;
    Ok(Json(TransportResponse { ok: session.stop() }))
}

/// POST /api/v1/sessions/:key/play_pause
pub async fn play_pause(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
) -> ApiResult<TransportResponse> {
    let control = ctx.broker.control(key).map_err(error_response)?;
    Ok(Json(TransportResponse {
        ok: control.play_pause(),
    }))
}

/// POST /api/v1/sessions/:key/next
pub async fn next(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
) -> ApiResult<TransportResponse> {
    let session = ctx.broker.session(key).map_err(error_response)?;
    Ok(Json(TransportResponse { ok: session.next() }))
}

/// POST /api/v1/sessions/:key/previous
pub async fn previous(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
) -> ApiResult<TransportResponse> {
    let session = ctx.broker.session(key).map_err(error_response)?;
    Ok(Json(TransportResponse {
        ok: session.previous(),
    }))
}

/// POST /api/v1/sessions/:key/seek
pub async fn seek(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
    Json(req): Json<SeekRequest>,
) -> ApiResult<TransportResponse> {
    let session = ctx.broker.session(key).map_err(error_response)?;
    Ok(Json(TransportResponse {
        ok: session.seek(req.offset_us),
    }))
}

/// POST /api/v1/sessions/:key/open
///
/// The caller's identity comes from the `X-Client-Id` header.
pub async fn open(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
    headers: HeaderMap,
    Json(req): Json<OpenRequest>,
) -> ApiResult<OpenResponse> {
    let control = ctx.broker.control(key).map_err(error_response)?;

    let client_id = headers
        .get(CLIENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let opened = control
        .open_uri(client_id, &req.uri, req.headers.as_ref())
        .await;
    if opened {
        info!("Session {}: opened {}", key, req.uri);
    } else {
        warn!("Session {}: could not open {}", key, req.uri);
    }
    Ok(Json(OpenResponse { opened }))
}

/// POST /api/v1/sessions/:key/video_sink
pub async fn create_video_sink(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
    Json(req): Json<VideoSinkRequest>,
) -> ApiResult<StatusResponse> {
    let session = ctx.broker.session(key).map_err(error_response)?;
    session.create_video_sink(req.texture_id);
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

// ============================================================================
// Properties
// ============================================================================

/// GET /api/v1/sessions/:key/properties
pub async fn get_properties(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
) -> ApiResult<PropertiesSnapshot> {
    let session = ctx.broker.session(key).map_err(error_response)?;
    Ok(Json(session.properties()))
}

/// PATCH /api/v1/sessions/:key/properties
pub async fn update_properties(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
    Json(update): Json<PropertiesUpdate>,
) -> ApiResult<PropertiesSnapshot> {
    let session = ctx.broker.session(key).map_err(error_response)?;
    if update.is_empty() {
        return Err(error_response(Error::BadRequest(
            "no writable property given".to_string(),
        )));
    }
    session.apply_update(&update);
    Ok(Json(session.properties()))
}

// ============================================================================
// Track Queue
// ============================================================================

/// GET /api/v1/sessions/:key/tracks
pub async fn list_tracks(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
) -> ApiResult<TrackListResponse> {
    let session = ctx.broker.session(key).map_err(error_response)?;
    let tracks = session
        .tracks()
        .into_iter()
        .map(|track_id| TrackInfo {
            uri: session.locator_for(&track_id),
            metadata: session.metadata_for(&track_id),
            track_id,
        })
        .collect();

    Ok(Json(TrackListResponse {
        can_edit: session.can_edit_tracks(),
        current: session.current_track(),
        tracks,
    }))
}

/// POST /api/v1/sessions/:key/tracks
pub async fn add_track(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
    Json(req): Json<AddTrackRequest>,
) -> ApiResult<AddTrackResponse> {
    let session = ctx.broker.session(key).map_err(error_response)?;
    if req.uri.is_empty() {
        return Err(error_response(Error::BadRequest("empty uri".to_string())));
    }
    let track_id = session.add_track(&req.uri, req.before.as_ref(), req.make_current);
    Ok(Json(AddTrackResponse { track_id }))
}

/// POST /api/v1/sessions/:key/tracks/remove
pub async fn remove_track(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
    Json(req): Json<TrackRequest>,
) -> ApiResult<RemoveTrackResponse> {
    let session = ctx.broker.session(key).map_err(error_response)?;
    Ok(Json(RemoveTrackResponse {
        removed: session.remove_track(&req.track_id),
    }))
}

/// POST /api/v1/sessions/:key/tracks/goto
pub async fn go_to_track(
    State(ctx): State<AppContext>,
    Path(key): Path<PlayerKey>,
    Json(req): Json<TrackRequest>,
) -> ApiResult<StatusResponse> {
    let session = ctx.broker.session(key).map_err(error_response)?;
    session.go_to_track(&req.track_id);
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}
