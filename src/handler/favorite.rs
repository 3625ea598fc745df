use axum::Extension;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use axum::routing::post;
use axum::{Router, middleware};
use tracing::instrument;
use uuid::Uuid;

use crate::AppState;
use crate::db::{CommentExt, FavoriteExt, RecipeExt};
use crate::dtos::FavoriteToggleResponseDto;
use crate::error::{ErrorMessage, HttpError};
use crate::middleware::{JWTAuthMiddleware, auth};

/// Router for the favorite toggle nested under /recipes/{recipe_id}/favorite
pub fn favorite_handler(app_state: AppState) -> Router<AppState> {
    Router::new().route(
        "/",
        post(toggle_favorite).route_layer(middleware::from_fn_with_state(app_state, auth)),
    )
}

/// Flip the acting user's favorite on a recipe
///
/// First call creates the pair and reports liked=true, the next removes it
/// and reports liked=false, together with the fresh counts.
#[instrument(skip(app_state, jwt), fields(user_id = %jwt.user.id))]
pub async fn toggle_favorite(
    Path(recipe_id): Path<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .get_recipe(recipe_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting recipe for favorite: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Recipe not found"))?;

    let is_liked = app_state
        .db_client
        .toggle_favorite(jwt.user.id, recipe_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, toggling favorite: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let (like_count, comment_count) = tokio::try_join!(
        app_state.db_client.get_recipe_favorite_count(recipe_id),
        app_state.db_client.get_recipe_comment_count(recipe_id),
    )
    .map_err(|e| {
        tracing::error!("DB error, counting after favorite toggle: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let response = Json(FavoriteToggleResponseDto {
        status: "success".to_string(),
        is_liked,
        like_count,
        comment_count,
    });
    tracing::info!("toggle_favorite successful");
    Ok(response)
}
