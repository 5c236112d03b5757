use axum::{
    body::Body,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use moviedb_core::image::{DerivedImage, ImageOutcome};
use moviedb_model::ImageQuery;
use tracing::{debug, warn};

use crate::infra::{app_state::AppState, errors::AppError};

const IMAGE_CACHE_CONTROL: &str = "public, max-age=86400";

/// GET /images/{category}/{image} - derived cover, thumbnail, portrait or
/// face crop. Missing images answer 404 with the category placeholder.
pub async fn image_handler(
    State(state): State<AppState>,
    Path((category, image)): Path<(String, String)>,
    query: Result<Query<ImageQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(err) => {
            debug!("Ignoring unreadable image query: {}", err);
            ImageQuery::default()
        }
    };
    let directives = query.directives();

    match state.images().render(&category, &image, directives).await {
        Ok(ImageOutcome::Ready(derived)) => image_response(StatusCode::OK, derived),
        Ok(ImageOutcome::Placeholder(derived)) => {
            image_response(StatusCode::NOT_FOUND, derived)
        }
        Ok(ImageOutcome::Unavailable) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            warn!("Image request {}/{} failed: {}", category, image, err);
            AppError::internal(err.to_string()).into_response()
        }
    }
}

fn image_response(status: StatusCode, image: DerivedImage) -> Response {
    let length = image.bytes.len();
    (
        status,
        [
            (header::CONTENT_TYPE, image.content_type.to_string()),
            (header::CONTENT_LENGTH, length.to_string()),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string()),
        ],
        Body::from(image.bytes),
    )
        .into_response()
}
