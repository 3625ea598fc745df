use axum::Extension;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::db::{RatingExt, RecipeExt};
use crate::dtos::{
    IngredientInput, RecipeDetailDto, RecipeDto, RecipeForm, RecipeIngredientDto,
    RecipeListType, RecipeResponseDto, RecipesQueryParams,
};
use crate::error::{ErrorMessage, HttpError};
use crate::handler::{comment, favorite, rating};
use crate::middleware::{JWTAuthMiddleware, auth};
use crate::pagination::{PageParams, PaginatedResponse, calculate_pagination};
use crate::utils::upload::{self, ImageUpload};

/// Router for recipe endpoints, with the recipe-scoped comment, favorite
/// and rating routes nested underneath
pub fn recipe_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_recipes))
        .route(
            "/",
            post(create_recipe)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{recipe_id}", get(get_recipe))
        .route(
            "/{recipe_id}",
            put(edit_recipe)
                .delete(delete_recipe)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .nest(
            "/{recipe_id}/comments",
            comment::recipe_comment_handler(app_state.clone()),
        )
        .nest(
            "/{recipe_id}/favorite",
            favorite::favorite_handler(app_state.clone()),
        )
        .nest("/{recipe_id}/rating", rating::rating_handler(app_state))
}

/// List recipes: free-text search when `q` is present, otherwise recent or
/// popular according to `type`
///
/// Returns the uniform envelope; every row carries its average rating.
#[instrument(skip(app_state))]
pub async fn get_recipes(
    Query(params): Query<RecipesQueryParams>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_recipes input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let PageParams { page, limit, skip } = calculate_pagination(params.page, params.limit);
    let sort_by = params.sort_by.as_deref();
    let sort_order = params.sort_order;

    // Data slice and total count for the same filter, fetched concurrently
    let (rows, total) = if let Some(q) = params.q.as_deref() {
        tokio::try_join!(
            app_state
                .db_client
                .search_recipes(q, limit, skip, sort_by, sort_order),
            app_state.db_client.search_recipe_count(q),
        )
    } else if params.list_type == Some(RecipeListType::Popular) {
        tokio::try_join!(
            app_state.db_client.get_popular_recipes(limit, skip),
            app_state.db_client.get_recipe_count(),
        )
    } else {
        tokio::try_join!(
            app_state
                .db_client
                .get_recent_recipes(limit, skip, sort_by, sort_order),
            app_state.db_client.get_recipe_count(),
        )
    }
    .map_err(|e| {
        tracing::error!("DB error, listing recipes: {}", e);
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

    tracing::info!("get_recipes successful");
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}

/// Get single recipe with its ingredient list
#[instrument(skip(app_state))]
pub async fn get_recipe(
    Path(recipe_id): Path<Uuid>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let row = app_state
        .db_client
        .get_recipe(recipe_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting recipe: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Recipe not found"))?;

    let (ingredients, aggregate) = tokio::try_join!(
        app_state.db_client.get_recipe_ingredients(recipe_id),
        app_state.db_client.get_rating_aggregate(recipe_id),
    )
    .map_err(|e| {
        tracing::error!("DB error, getting recipe detail: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let response = Json(RecipeResponseDto {
        status: "success".to_string(),
        data: RecipeDetailDto {
            recipe: RecipeDto::from_row(row, aggregate.average_rating),
            ingredients: ingredients
                .into_iter()
                .map(RecipeIngredientDto::from_row)
                .collect(),
        },
    });

    Ok(response)
}

/// Create recipe from an authenticated multipart submission
///
/// Field validation runs before the image is stored, and the recipe plus
/// its ingredient links are written in one transaction.
#[instrument(skip(app_state, jwt, multipart), fields(user_id = %jwt.user.id))]
pub async fn create_recipe(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let (form, image) = read_recipe_form(multipart).await?;

    form.validate().map_err(|e| {
        tracing::error!("Invalid create_recipe input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let image = image
        .ok_or_else(|| HttpError::bad_request("Please provide an image for the recipe."))?;
    let image_url = upload::save_image(&app_state.env.upload_dir, &image).await?;

    let recipe_id = app_state
        .db_client
        .create_recipe(jwt.user.id, &form, &image_url)
        .await
        .map_err(|e| {
            tracing::error!("DB error, creating recipe: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = recipe_detail(&app_state, recipe_id).await?;

    tracing::info!("create_recipe successful");
    Ok((StatusCode::CREATED, Json(response)))
}

/// Edit recipe; only its author may do so
///
/// Ingredient links are replaced wholesale; a new image replaces the old
/// one, which is then removed best-effort.
#[instrument(skip(app_state, jwt, multipart), fields(user_id = %jwt.user.id))]
pub async fn edit_recipe(
    Path(recipe_id): Path<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    // Explicit ownership predicate: missing and foreign rows answer
    // differently
    let existing = app_state
        .db_client
        .get_recipe(recipe_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting recipe for edit: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Recipe not found"))?;

    if existing.author_id != jwt.user.id {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    let (form, image) = read_recipe_form(multipart).await?;

    form.validate().map_err(|e| {
        tracing::error!("Invalid edit_recipe input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let image_url = match &image {
        Some(image) => upload::save_image(&app_state.env.upload_dir, image).await?,
        None => existing.image_url.clone(),
    };

    let updated = app_state
        .db_client
        .update_recipe(recipe_id, &form, &image_url)
        .await
        .map_err(|e| {
            tracing::error!("DB error, updating recipe: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    if updated.is_none() {
        return Err(HttpError::not_found("Recipe not found"));
    }

    if image.is_some() {
        upload::delete_image(&app_state.env.upload_dir, &existing.image_url).await;
    }

    let response = recipe_detail(&app_state, recipe_id).await?;

    tracing::info!("edit_recipe successful");
    Ok(Json(response))
}

/// Delete recipe; only its author may do so
#[instrument(skip(app_state, jwt), fields(user_id = %jwt.user.id))]
pub async fn delete_recipe(
    Path(recipe_id): Path<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let existing = app_state
        .db_client
        .get_recipe(recipe_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting recipe for delete: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Recipe not found"))?;

    if existing.author_id != jwt.user.id {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    let deleted_image = app_state
        .db_client
        .delete_recipe(recipe_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, deleting recipe: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    match deleted_image {
        Some(image_url) => {
            upload::delete_image(&app_state.env.upload_dir, &image_url).await;
            tracing::info!("delete_recipe successful");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(HttpError::not_found("Recipe not found")),
    }
}

/// Fetch the full detail response for a freshly written recipe
async fn recipe_detail(
    app_state: &AppState,
    recipe_id: Uuid,
) -> Result<RecipeResponseDto, HttpError> {
    let row = app_state
        .db_client
        .get_recipe(recipe_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, reloading recipe: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Recipe not found"))?;

    let (ingredients, aggregate) = tokio::try_join!(
        app_state.db_client.get_recipe_ingredients(recipe_id),
        app_state.db_client.get_rating_aggregate(recipe_id),
    )
    .map_err(|e| {
        tracing::error!("DB error, reloading recipe detail: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    Ok(RecipeResponseDto {
        status: "success".to_string(),
        data: RecipeDetailDto {
            recipe: RecipeDto::from_row(row, aggregate.average_rating),
            ingredients: ingredients
                .into_iter()
                .map(RecipeIngredientDto::from_row)
                .collect(),
        },
    })
}

/// Pull the recipe fields and the optional image out of the multipart body
async fn read_recipe_form(
    mut multipart: Multipart,
) -> Result<(RecipeForm, Option<ImageUpload>), HttpError> {
    let mut title = String::new();
    let mut description = String::new();
    let mut prep_time: i32 = 0;
    let mut category = String::new();
    let mut instructions: Option<String> = None;
    let mut ingredients: Vec<IngredientInput> = Vec::new();
    let mut image: Option<ImageUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => {
                title = field
                    .text()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?;
            }
            "description" => {
                description = field
                    .text()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?;
            }
            "prepTime" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?;
                // Garbage parses to 0 and fails range validation later
                prep_time = text.trim().parse().unwrap_or(0);
            }
            "category" => {
                category = field
                    .text()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?;
            }
            "instructions" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?;
                if !text.is_empty() {
                    instructions = Some(text);
                }
            }
            "ingredients" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?;
                ingredients = parse_ingredients(&text);
            }
            "image" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?
                    .to_vec();
                if !data.is_empty() {
                    image = Some(ImageUpload { content_type, data });
                }
            }
            _ => {}
        }
    }

    let form = RecipeForm {
        title,
        description,
        prep_time,
        category,
        instructions,
        ingredients,
    };

    Ok((form, image))
}

/// Parse the ingredients field: a JSON array of lines, with a fallback for
/// plain comma-separated names
fn parse_ingredients(raw: &str) -> Vec<IngredientInput> {
    serde_json::from_str(raw).unwrap_or_else(|_| {
        raw.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| IngredientInput {
                name: name.to_string(),
                quantity: Some(1.0),
                unit: None,
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ingredient_json() {
        let parsed = parse_ingredients(
            r#"[{"name":"Tomato","quantity":2.0,"unit":"piece"},{"name":"salt"}]"#,
        );
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "Tomato");
        assert_eq!(parsed[0].quantity, Some(2.0));
        assert_eq!(parsed[0].unit.as_deref(), Some("piece"));
        assert_eq!(parsed[1].quantity, None);
    }

    #[test]
    fn falls_back_to_comma_separated_names() {
        let parsed = parse_ingredients("tomato, salt , , pepper");
        let names: Vec<&str> = parsed.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["tomato", "salt", "pepper"]);
        assert!(parsed.iter().all(|i| i.quantity == Some(1.0)));
    }

    #[test]
    fn empty_input_yields_no_ingredients() {
        assert!(parse_ingredients("").is_empty());
    }
}
