use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::db::CommentExt;
use crate::dtos::{CommentDto, CommentInput, CommentResponseDto, ListQueryParams};
use crate::error::{ErrorMessage, HttpError};
use crate::middleware::{JWTAuthMiddleware, auth};
use crate::pagination::{PageParams, PaginatedResponse, calculate_pagination};

/// Router for comment routes nested under /recipes/{recipe_id}/comments
pub fn recipe_comment_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_recipe_comments))
        .route(
            "/",
            post(create_comment)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// Router for comment endpoints addressed by comment id
pub fn comment_handler(app_state: AppState) -> Router<AppState> {
    Router::new().route(
        "/{comment_id}",
        put(edit_comment)
            .delete(delete_comment)
            .route_layer(middleware::from_fn_with_state(app_state, auth)),
    )
}

/// Get paginated comments on a recipe
///
/// Publicly accessible; newest first unless a sort override is given.
#[instrument(skip(app_state))]
pub async fn get_recipe_comments(
    Query(params): Query<ListQueryParams>,
    Path(recipe_id): Path<Uuid>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_recipe_comments input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let PageParams { page, limit, skip } = calculate_pagination(params.page, params.limit);

    let (rows, total) = tokio::try_join!(
        app_state.db_client.get_recipe_comments(
            recipe_id,
            limit,
            skip,
            params.sort_by.as_deref(),
            params.sort_order,
        ),
        app_state.db_client.get_recipe_comment_count(recipe_id),
    )
    .map_err(|e| {
        tracing::error!("DB error, getting comments: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let data: Vec<CommentDto> = rows.into_iter().map(CommentDto::from_row).collect();

    tracing::info!("get_recipe_comments successful");
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}

/// Create comment on a recipe
///
/// Request body: { content }. Returns 201 Created with the new comment.
#[instrument(skip(app_state, body, jwt), fields(user_id = %jwt.user.id))]
pub async fn create_comment(
    Path(recipe_id): Path<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<CommentInput>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_comment input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let comment = app_state
        .db_client
        .create_comment(jwt.user.id, recipe_id, &body.content)
        .await
        .map_err(|e| {
            tracing::error!("DB error, creating comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(CommentResponseDto {
        status: "success".to_string(),
        data: CommentDto::from_row(comment),
    });
    tracing::info!("create_comment successful");
    Ok((StatusCode::CREATED, response))
}

/// Edit comment; only its author may do so
#[instrument(skip(app_state, body, jwt), fields(user_id = %jwt.user.id))]
pub async fn edit_comment(
    Path(comment_id): Path<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<CommentInput>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid edit_comment input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    // Ownership predicate before the write keeps 403 and 404 distinct
    let existing = app_state
        .db_client
        .get_comment(comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comment for edit: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Comment not found"))?;

    if existing.user_id != jwt.user.id {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    let updated = app_state
        .db_client
        .update_comment(comment_id, &body.content)
        .await
        .map_err(|e| {
            tracing::error!("DB error, editing comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Comment not found"))?;

    let response = Json(CommentResponseDto {
        status: "success".to_string(),
        data: CommentDto::from_row(updated),
    });
    tracing::info!("edit_comment successful");
    Ok(response)
}

/// Delete comment; only its author may do so
#[instrument(skip(app_state, jwt), fields(user_id = %jwt.user.id))]
async fn delete_comment(
    Path(comment_id): Path<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let existing = app_state
        .db_client
        .get_comment(comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comment for delete: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Comment not found"))?;

    if existing.user_id != jwt.user.id {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    app_state
        .db_client
        .delete_comment(comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, deleting comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Comment not found"))?;

    tracing::info!("delete_comment successful");
    Ok(StatusCode::NO_CONTENT)
}
