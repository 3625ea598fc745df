use axum::Router;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use crate::db::IngredientExt;
use crate::dtos::{IngredientDto, SearchQueryParams};
use crate::error::{ErrorMessage, HttpError};
use crate::pagination::{PageParams, PaginatedResponse, calculate_pagination};

pub fn ingredient_handler() -> Router<AppState> {
    Router::new().route("/", get(get_ingredients))
}

/// List ingredients, optionally filtered by a name substring, name
/// ascending by default
#[instrument(skip(app_state))]
pub async fn get_ingredients(
    Query(params): Query<SearchQueryParams>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_ingredients input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let PageParams { page, limit, skip } = calculate_pagination(params.page, params.limit);
    let query_text = params.q.as_deref();

    let (ingredients, total) = tokio::try_join!(
        app_state.db_client.get_ingredients(
            query_text,
            limit,
            skip,
            params.sort_by.as_deref(),
            params.sort_order,
        ),
        app_state.db_client.get_ingredient_count(query_text),
    )
    .map_err(|e| {
        tracing::error!("DB error, listing ingredients: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let data: Vec<IngredientDto> = ingredients
        .into_iter()
        .map(IngredientDto::from_model)
        .collect();

    tracing::info!("get_ingredients successful");
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}
