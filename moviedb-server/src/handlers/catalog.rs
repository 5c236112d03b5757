use axum::{Json, extract::State, http::StatusCode};
use moviedb_model::{Actor, CatalogSnapshot, MovieSubmission, PlayRequest};
use tracing::debug;

use crate::infra::{app_state::AppState, errors::AppResult};

/// GET / - every movie, actor and genre.
pub async fn list_catalog_handler(
    State(state): State<AppState>,
) -> AppResult<Json<CatalogSnapshot>> {
    Ok(Json(state.catalog().snapshot().await?))
}

/// POST /movie - resolve cast/genre names and upsert by `MovieID`.
pub async fn submit_movie_handler(
    State(state): State<AppState>,
    Json(submission): Json<MovieSubmission>,
) -> AppResult<StatusCode> {
    debug!("Movie submission for {}", submission.id);
    state.catalog().submit_movie(submission).await?;
    Ok(StatusCode::OK)
}

/// POST /actor - upsert by `ActorID`.
pub async fn upsert_actor_handler(
    State(state): State<AppState>,
    Json(actor): Json<Actor>,
) -> AppResult<StatusCode> {
    state.catalog().upsert_actor(actor).await?;
    Ok(StatusCode::OK)
}

/// POST /play - count one play. Unknown ids still answer 200.
pub async fn record_play_handler(
    State(state): State<AppState>,
    Json(request): Json<PlayRequest>,
) -> AppResult<StatusCode> {
    state.catalog().record_play(request.movie_id).await?;
    Ok(StatusCode::OK)
}
