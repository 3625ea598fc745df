use axum::Extension;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{delete, post};
use axum::{Router, middleware};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::db::{RatingExt, RecipeExt};
use crate::dtos::{RateResponseDto, RatingInput};
use crate::error::{ErrorMessage, HttpError};
use crate::middleware::{JWTAuthMiddleware, auth};

/// Router for the rating upsert nested under /recipes/{recipe_id}/rating
pub fn rating_handler(app_state: AppState) -> Router<AppState> {
    Router::new().route(
        "/",
        post(rate_recipe).route_layer(middleware::from_fn_with_state(app_state, auth)),
    )
}

/// Router for rating endpoints addressed by rating id
pub fn ratings_handler(app_state: AppState) -> Router<AppState> {
    Router::new().route(
        "/{rating_id}",
        delete(delete_rating).route_layer(middleware::from_fn_with_state(app_state, auth)),
    )
}

/// Rate a recipe, creating or updating the acting user's single rating
///
/// Returns the freshly recomputed aggregate. Rating twice never produces
/// two rows; the score just moves.
#[instrument(skip(app_state, body, jwt), fields(user_id = %jwt.user.id))]
pub async fn rate_recipe(
    Path(recipe_id): Path<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<RatingInput>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid rate_recipe input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    app_state
        .db_client
        .get_recipe(recipe_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting recipe for rating: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Recipe not found"))?;

    app_state
        .db_client
        .upsert_rating(jwt.user.id, recipe_id, body.score)
        .await
        .map_err(|e| {
            tracing::error!("DB error, upserting rating: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let aggregate = app_state
        .db_client
        .get_rating_aggregate(recipe_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, recomputing rating aggregate: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(RateResponseDto {
        status: "success".to_string(),
        average_rating: aggregate.average_rating,
        total_ratings: aggregate.total_ratings,
    });
    tracing::info!("rate_recipe successful");
    Ok(response)
}

/// Withdraw a rating; only its author may do so
#[instrument(skip(app_state, jwt), fields(user_id = %jwt.user.id))]
async fn delete_rating(
    Path(rating_id): Path<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let existing = app_state
        .db_client
        .get_rating(rating_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting rating for delete: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Rating not found"))?;

    if existing.user_id != jwt.user.id {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    app_state
        .db_client
        .delete_rating(rating_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, deleting rating: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Rating not found"))?;

    tracing::info!("delete_rating successful");
    Ok(StatusCode::NO_CONTENT)
}
