use axum::Extension;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::{Router, middleware};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::db::{CommentExt, FavoriteExt, RatingExt, RecipeExt, UserExt};
use crate::dtos::{
    CommentWithRecipeDto, FavoriteDto, ListQueryParams, PublicUserDto, RatingDto, RecipeDto,
    SearchQueryParams, UserMeData, UserMeResponseDto,
};
use crate::error::{ErrorMessage, HttpError};
use crate::middleware::{JWTAuthMiddleware, auth};
use crate::pagination::{PageParams, PaginatedResponse, calculate_pagination};

/// Router for profile and user search endpoints
///
/// Everything under /me requires authentication; search is public.
pub fn users_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/me",
            get(get_me).route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/me/recipes",
            get(get_my_recipes)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/me/favorites",
            get(get_my_favorites)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/me/comments",
            get(get_my_comments)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/me/ratings",
            get(get_my_ratings)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
        .route("/search", get(search_users))
}

/// Get the acting user's profile with statistics
#[instrument(skip(app_state, jwt), fields(user_id = %jwt.user.id))]
pub async fn get_me(
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state
        .db_client
        .get_user_stats(jwt.user.id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user stats: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(UserMeResponseDto {
        status: "success".to_string(),
        data: UserMeData {
            user: PublicUserDto::from_model(&jwt.user),
            stats,
        },
    });
    tracing::info!("get_me successful");
    Ok(response)
}

/// Get the acting user's recipes
#[instrument(skip(app_state, jwt), fields(user_id = %jwt.user.id))]
pub async fn get_my_recipes(
    Query(params): Query<ListQueryParams>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_my_recipes input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let PageParams { page, limit, skip } = calculate_pagination(params.page, params.limit);

    let (rows, total) = tokio::try_join!(
        app_state.db_client.get_recipes_by_author(
            jwt.user.id,
            limit,
            skip,
            params.sort_by.as_deref(),
            params.sort_order,
        ),
        app_state.db_client.get_author_recipe_count(jwt.user.id),
    )
    .map_err(|e| {
        tracing::error!("DB error, listing user recipes: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let recipe_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let averages = app_state
        .db_client
        .get_rating_aggregates(&recipe_ids)
        .await
        .map_err(|e| {
            tracing::error!("DB error, batch rating aggregation: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let data = RecipeDto::from_rows(rows, &averages);

    tracing::info!("get_my_recipes successful");
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}

/// Get the acting user's favorites, each carrying its full recipe
#[instrument(skip(app_state, jwt), fields(user_id = %jwt.user.id))]
pub async fn get_my_favorites(
    Query(params): Query<ListQueryParams>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_my_favorites input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let PageParams { page, limit, skip } = calculate_pagination(params.page, params.limit);

    let (rows, total) = tokio::try_join!(
        app_state.db_client.get_user_favorites(
            jwt.user.id,
            limit,
            skip,
            params.sort_by.as_deref(),
            params.sort_order,
        ),
        app_state.db_client.get_user_favorite_count(jwt.user.id),
    )
    .map_err(|e| {
        tracing::error!("DB error, listing user favorites: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    // The embedded recipes get the same enrichment as any recipe listing
    let recipe_ids: Vec<Uuid> = rows.iter().map(|row| row.recipe_id).collect();
    let averages = app_state
        .db_client
        .get_rating_aggregates(&recipe_ids)
        .await
        .map_err(|e| {
            tracing::error!("DB error, batch rating aggregation: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let data = FavoriteDto::from_rows(rows, &averages);

    tracing::info!("get_my_favorites successful");
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}

/// Get the acting user's comments with the recipes they were left on
#[instrument(skip(app_state, jwt), fields(user_id = %jwt.user.id))]
pub async fn get_my_comments(
    Query(params): Query<ListQueryParams>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_my_comments input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let PageParams { page, limit, skip } = calculate_pagination(params.page, params.limit);

    let (rows, total) = tokio::try_join!(
        app_state.db_client.get_user_comments(
            jwt.user.id,
            limit,
            skip,
            params.sort_by.as_deref(),
            params.sort_order,
        ),
        app_state.db_client.get_user_comment_count(jwt.user.id),
    )
    .map_err(|e| {
        tracing::error!("DB error, listing user comments: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let data: Vec<CommentWithRecipeDto> = rows
        .into_iter()
        .map(CommentWithRecipeDto::from_row)
        .collect();

    tracing::info!("get_my_comments successful");
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}

/// Get the acting user's ratings with recipe summaries
#[instrument(skip(app_state, jwt), fields(user_id = %jwt.user.id))]
pub async fn get_my_ratings(
    Query(params): Query<ListQueryParams>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_my_ratings input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let PageParams { page, limit, skip } = calculate_pagination(params.page, params.limit);

    let (rows, total) = tokio::try_join!(
        app_state.db_client.get_user_ratings(
            jwt.user.id,
            limit,
            skip,
            params.sort_by.as_deref(),
            params.sort_order,
        ),
        app_state.db_client.get_user_rating_count(jwt.user.id),
    )
    .map_err(|e| {
        tracing::error!("DB error, listing user ratings: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let data: Vec<RatingDto> = rows.into_iter().map(RatingDto::from_row).collect();

    tracing::info!("get_my_ratings successful");
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}

/// Search users by name or email, name ascending by default
#[instrument(skip(app_state))]
pub async fn search_users(
    Query(params): Query<SearchQueryParams>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid search_users input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let query_text = params
        .q
        .as_deref()
        .ok_or_else(|| HttpError::bad_request("Search query is required"))?;

    let PageParams { page, limit, skip } = calculate_pagination(params.page, params.limit);

    let (users, total) = tokio::try_join!(
        app_state.db_client.search_users(
            query_text,
            limit,
            skip,
            params.sort_by.as_deref(),
            params.sort_order,
        ),
        app_state.db_client.search_user_count(query_text),
    )
    .map_err(|e| {
        tracing::error!("DB error, searching users: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let data = PublicUserDto::from_models(&users);

    tracing::info!("search_users successful");
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}
