use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{handlers, infra::app_state::AppState};

/// Every route of the service with its middleware, ready to serve.
pub fn create_app(state: AppState) -> Router {
    let cors_layer = cors_layer(&state.config().cors_allowed_origin);

    Router::new()
        .route("/", get(handlers::list_catalog_handler))
        .route("/movie", post(handlers::submit_movie_handler))
        .route("/actor", post(handlers::upsert_actor_handler))
        .route("/play", post(handlers::record_play_handler))
        .route("/images/{category}/{image}", get(handlers::image_handler))
        .route("/ping", get(handlers::ping_handler))
        // Outer to inner: CORS, then request tracing.
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = match HeaderValue::from_str(origin) {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            warn!(
                "Invalid CORS origin {:?}; cross-origin requests refused",
                origin
            );
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
}
