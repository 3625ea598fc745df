use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User model representing the users table
///
/// Accounts are provisioned by the surrounding identity platform; this
/// service only reads them to resolve the acting user and author data.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Ingredient model; names are unique and stored lower-cased
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
}

/// Comment model; mutable only by its author
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rating model; unique per (user_id, recipe_id), re-rating updates in place
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Rating {
    pub id: Uuid,
    pub score: i32,
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Joined row types returned by the listing queries
// ============================================================================

/// Recipe listing row: recipe columns joined with its author and the
/// per-recipe counts
///
/// The average rating is not part of the row; it is filled in by the batch
/// aggregate pass before the row is exposed to clients.
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct RecipeRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub prep_time: i32,
    pub category: String,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_name: Option<String>,
    pub author_image: Option<String>,
    pub comment_count: i64,
    pub favorite_count: i64,
    pub rating_count: i64,
}

/// Comment row joined with its author
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct CommentRow {
    pub id: Uuid,
    pub content: String,
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_image: Option<String>,
}

/// Comment row joined with its author and a summary of the recipe it
/// belongs to, used by the comments-by-user listing
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct CommentWithRecipeRow {
    pub id: Uuid,
    pub content: String,
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_image: Option<String>,
    pub recipe_title: String,
    pub recipe_image_url: String,
}

/// Rating row joined with a recipe summary, used by the ratings-by-user listing
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct RatingWithRecipeRow {
    pub id: Uuid,
    pub score: i32,
    pub recipe_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub recipe_title: String,
    pub recipe_image_url: String,
}

/// Favorite row carrying the full recipe listing row it points at,
/// used by the favorites-by-user listing
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct FavoriteRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub recipe_id: Uuid,
    pub recipe_title: String,
    pub recipe_description: String,
    pub recipe_image_url: String,
    pub recipe_prep_time: i32,
    pub recipe_category: String,
    pub recipe_instructions: Option<String>,
    pub recipe_created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_name: Option<String>,
    pub author_image: Option<String>,
    pub comment_count: i64,
    pub favorite_count: i64,
    pub rating_count: i64,
}

/// Ingredient joined with its per-recipe quantity and unit
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct RecipeIngredientRow {
    pub id: Uuid,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}
