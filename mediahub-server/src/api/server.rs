//! HTTP server setup and routing

use crate::api::{handlers, sse};
use crate::broker::SessionBroker;
use crate::config::Config;
use crate::error::{Error, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub broker: Arc<SessionBroker>,
}

/// Build the router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let sessions = Router::new()
        .route("/", post(handlers::create_session))
        .route("/:key", axum::routing::delete(handlers::destroy_session))
        .route("/:key/key", get(handlers::get_key))
        // Transport
        .route("/:key/play", post(handlers::play))
        .route("/:key/pause", post(handlers::pause))
        .route("/:key/stop", post(handlers::stop))
        .route("/:key/play_pause", post(handlers::play_pause))
        .route("/:key/next", post(handlers::next))
        .route("/:key/previous", post(handlers::previous))
        .route("/:key/seek", post(handlers::seek))
        .route("/:key/open", post(handlers::open))
        .route("/:key/video_sink", post(handlers::create_video_sink))
        // Properties
        .route(
            "/:key/properties",
            get(handlers::get_properties).patch(handlers::update_properties),
        )
        // Track queue
        .route(
            "/:key/tracks",
            get(handlers::list_tracks).post(handlers::add_track),
        )
        .route("/:key/tracks/remove", post(handlers::remove_track))
        .route("/:key/tracks/goto", post(handlers::go_to_track));

    let api = Router::new()
        .nest("/sessions", sessions)
        .route("/events", get(sse::event_stream));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

/// Serve the control API until `shutdown` resolves
pub async fn run(
    config: &Config,
    broker: Arc<SessionBroker>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router(AppContext { broker });

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .map_err(|e| Error::Http(format!("Invalid bind address: {}", e)))?;

    info!("Control API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
