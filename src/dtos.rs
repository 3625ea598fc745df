use crate::models::{
    CommentRow, CommentWithRecipeRow, FavoriteRow, Ingredient, RatingWithRecipeRow,
    RecipeIngredientRow, RecipeRow, User,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

// DTOs define the structure of data exchanged with clients.
// They are separate from database models to control exactly what is exposed.

// ============================================================================
// Query parameter DTOs
// ============================================================================

/// Sort direction accepted on every listing endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Recipe listing mode: newest first, or most-rated first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeListType {
    Recent,
    Popular,
}

/// Query parameters for GET /api/recipes
///
/// `q` and `type` are alternatives; when both are present the text search
/// wins. Out-of-range page/limit values are clamped later, so no range
/// validation here.
#[derive(Debug, Deserialize, Validate)]
pub struct RecipesQueryParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,

    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,

    #[serde(rename = "sortOrder")]
    pub sort_order: Option<SortOrder>,

    #[serde(rename = "type")]
    pub list_type: Option<RecipeListType>,

    #[validate(length(min = 1, message = "Search query must not be empty"))]
    pub q: Option<String>,
}

/// Generic pagination + sort query parameters used by the other listings
#[derive(Debug, Deserialize, Validate)]
pub struct ListQueryParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,

    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,

    #[serde(rename = "sortOrder")]
    pub sort_order: Option<SortOrder>,
}

/// Query parameters for the ingredient and user search endpoints
#[derive(Debug, Deserialize, Validate)]
pub struct SearchQueryParams {
    #[validate(length(min = 1, message = "Search query must not be empty"))]
    pub q: Option<String>,

    pub page: Option<i64>,
    pub limit: Option<i64>,

    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,

    #[serde(rename = "sortOrder")]
    pub sort_order: Option<SortOrder>,
}

// ============================================================================
// Input DTOs
// ============================================================================

/// One ingredient line of a recipe submission
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IngredientInput {
    #[validate(length(min = 1, message = "Ingredient name is required"))]
    pub name: String,

    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

/// Recipe creation/update fields, collected from the multipart form
///
/// The image file travels beside these fields and is validated separately.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RecipeForm {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(range(min = 1, message = "Prep time must be at least 1 minute"))]
    pub prep_time: i32,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    pub instructions: Option<String>,

    #[validate(nested)]
    pub ingredients: Vec<IngredientInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Content must be between 1 and 1000 characters"
    ))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RatingInput {
    #[validate(range(min = 1, max = 5, message = "Score must be between 1 and 5"))]
    pub score: i32,
}

// ============================================================================
// Recipe response DTOs
// ============================================================================

/// Author data embedded in recipe and comment responses
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthorDto {
    pub id: Uuid,
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Short recipe reference embedded in comment and rating listings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecipeSummaryDto {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

/// Recipe as returned by every listing and detail endpoint
///
/// `averageRating` is always present and always computed; a recipe without
/// ratings reports 0.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecipeDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "prepTime")]
    pub prep_time: i32,
    pub category: String,
    pub instructions: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub author: AuthorDto,
    #[serde(rename = "commentCount")]
    pub comment_count: i64,
    #[serde(rename = "favoriteCount")]
    pub favorite_count: i64,
    #[serde(rename = "ratingCount")]
    pub rating_count: i64,
    #[serde(rename = "averageRating")]
    pub average_rating: f64,
}

impl RecipeDto {
    /// Combine a listing row with its computed average rating
    pub fn from_row(row: RecipeRow, average_rating: f64) -> Self {
        RecipeDto {
            id: row.id,
            title: row.title,
            description: row.description,
            image_url: row.image_url,
            prep_time: row.prep_time,
            category: row.category,
            instructions: row.instructions,
            created_at: row.created_at,
            author: AuthorDto {
                id: row.author_id,
                name: row.author_name,
                image: row.author_image,
            },
            comment_count: row.comment_count,
            favorite_count: row.favorite_count,
            rating_count: row.rating_count,
            average_rating,
        }
    }

    /// Enrich a page of rows with the batch-computed averages
    ///
    /// A recipe missing from the map gets 0, so every row always carries
    /// an average.
    pub fn from_rows(rows: Vec<RecipeRow>, averages: &HashMap<Uuid, f64>) -> Vec<Self> {
        rows.into_iter()
            .map(|row| {
                let average = averages.get(&row.id).copied().unwrap_or(0.0);
                RecipeDto::from_row(row, average)
            })
            .collect()
    }
}

/// Ingredient line of a recipe detail response
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecipeIngredientDto {
    pub id: Uuid,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

impl RecipeIngredientDto {
    pub fn from_row(row: RecipeIngredientRow) -> Self {
        RecipeIngredientDto {
            id: row.id,
            name: row.name,
            quantity: row.quantity,
            unit: row.unit,
        }
    }
}

/// Full recipe detail: the listing shape plus the ingredient list
#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeDetailDto {
    #[serde(flatten)]
    pub recipe: RecipeDto,
    pub ingredients: Vec<RecipeIngredientDto>,
}

/// Single recipe response
#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeResponseDto {
    pub status: String,
    pub data: RecipeDetailDto,
}

// ============================================================================
// Comment response DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommentDto {
    pub id: Uuid,
    pub content: String,
    #[serde(rename = "recipeId")]
    pub recipe_id: Uuid,
    pub user: AuthorDto,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl CommentDto {
    pub fn from_row(row: CommentRow) -> Self {
        CommentDto {
            id: row.id,
            content: row.content,
            recipe_id: row.recipe_id,
            user: AuthorDto {
                id: row.user_id,
                name: row.user_name,
                image: row.user_image,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Comment with the recipe it was left on, for the profile listing
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommentWithRecipeDto {
    pub id: Uuid,
    pub content: String,
    pub user: AuthorDto,
    pub recipe: RecipeSummaryDto,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl CommentWithRecipeDto {
    pub fn from_row(row: CommentWithRecipeRow) -> Self {
        CommentWithRecipeDto {
            id: row.id,
            content: row.content,
            user: AuthorDto {
                id: row.user_id,
                name: row.user_name,
                image: row.user_image,
            },
            recipe: RecipeSummaryDto {
                id: row.recipe_id,
                title: row.recipe_title,
                image_url: row.recipe_image_url,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Single comment response
#[derive(Debug, Serialize)]
pub struct CommentResponseDto {
    pub status: String,
    pub data: CommentDto,
}

// ============================================================================
// Rating & favorite response DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RatingDto {
    pub id: Uuid,
    pub score: i32,
    pub recipe: RecipeSummaryDto,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl RatingDto {
    pub fn from_row(row: RatingWithRecipeRow) -> Self {
        RatingDto {
            id: row.id,
            score: row.score,
            recipe: RecipeSummaryDto {
                id: row.recipe_id,
                title: row.recipe_title,
                image_url: row.recipe_image_url,
            },
            created_at: row.created_at,
        }
    }
}

/// Favorite with the full recipe it points at, for the profile listing
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FavoriteDto {
    pub id: Uuid,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub recipe: RecipeDto,
}

impl FavoriteDto {
    /// Combine a favorite row with the average rating of its recipe
    pub fn from_row(row: FavoriteRow, average_rating: f64) -> Self {
        FavoriteDto {
            id: row.id,
            created_at: row.created_at,
            recipe: RecipeDto {
                id: row.recipe_id,
                title: row.recipe_title,
                description: row.recipe_description,
                image_url: row.recipe_image_url,
                prep_time: row.recipe_prep_time,
                category: row.recipe_category,
                instructions: row.recipe_instructions,
                created_at: row.recipe_created_at,
                author: AuthorDto {
                    id: row.author_id,
                    name: row.author_name,
                    image: row.author_image,
                },
                comment_count: row.comment_count,
                favorite_count: row.favorite_count,
                rating_count: row.rating_count,
                average_rating,
            },
        }
    }

    pub fn from_rows(rows: Vec<FavoriteRow>, averages: &HashMap<Uuid, f64>) -> Vec<Self> {
        rows.into_iter()
            .map(|row| {
                let average = averages.get(&row.recipe_id).copied().unwrap_or(0.0);
                FavoriteDto::from_row(row, average)
            })
            .collect()
    }
}

/// Response of the favorite toggle
#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteToggleResponseDto {
    pub status: String,
    #[serde(rename = "isLiked")]
    pub is_liked: bool,
    #[serde(rename = "likeCount")]
    pub like_count: i64,
    #[serde(rename = "commentCount")]
    pub comment_count: i64,
}

/// Response of the rating upsert: the freshly recomputed aggregate
#[derive(Debug, Serialize, Deserialize)]
pub struct RateResponseDto {
    pub status: String,
    #[serde(rename = "averageRating")]
    pub average_rating: f64,
    #[serde(rename = "totalRatings")]
    pub total_ratings: i64,
}

// ============================================================================
// Ingredient response DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IngredientDto {
    pub id: Uuid,
    pub name: String,
}

impl IngredientDto {
    pub fn from_model(ingredient: Ingredient) -> Self {
        IngredientDto {
            id: ingredient.id,
            name: ingredient.name,
        }
    }
}

// ============================================================================
// User response DTOs
// ============================================================================

/// Public user data; the email column is the only sensitive-ish field and
/// is part of the public shape in this application
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PublicUserDto {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl PublicUserDto {
    pub fn from_model(user: &User) -> Self {
        PublicUserDto {
            id: user.id,
            name: user.name.to_owned(),
            email: user.email.to_owned(),
            image: user.image.to_owned(),
            created_at: user.created_at,
        }
    }

    pub fn from_models(users: &[User]) -> Vec<Self> {
        users.iter().map(PublicUserDto::from_model).collect()
    }
}

/// Profile statistics shown on the user's own page
#[derive(Debug, Serialize, Deserialize)]
pub struct UserStatsDto {
    #[serde(rename = "recipesCount")]
    pub recipes_count: i64,
    #[serde(rename = "favoritesCount")]
    pub favorites_count: i64,
    #[serde(rename = "ratingsCount")]
    pub ratings_count: i64,
    #[serde(rename = "commentsCount")]
    pub comments_count: i64,
    #[serde(rename = "averageRatingReceived")]
    pub average_rating_received: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserMeData {
    pub user: PublicUserDto,
    pub stats: UserStatsDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserMeResponseDto {
    pub status: String,
    pub data: UserMeData,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(id: Uuid) -> RecipeRow {
        RecipeRow {
            id,
            title: "Shakshuka".to_string(),
            description: "Eggs poached in tomato sauce".to_string(),
            image_url: "/uploads/recipes/x.jpg".to_string(),
            prep_time: 25,
            category: "breakfast".to_string(),
            instructions: None,
            created_at: Utc::now(),
            author_id: Uuid::new_v4(),
            author_name: Some("Ana".to_string()),
            author_image: None,
            comment_count: 2,
            favorite_count: 1,
            rating_count: 3,
        }
    }

    #[test]
    fn recipe_enrichment_defaults_missing_average_to_zero() {
        let rated = Uuid::new_v4();
        let unrated = Uuid::new_v4();
        let averages = HashMap::from([(rated, 4.0)]);

        let dtos = RecipeDto::from_rows(vec![sample_row(rated), sample_row(unrated)], &averages);

        assert_eq!(dtos[0].average_rating, 4.0);
        assert_eq!(dtos[1].average_rating, 0.0);
    }

    #[test]
    fn recipe_dto_uses_wire_field_names() {
        let dto = RecipeDto::from_row(sample_row(Uuid::new_v4()), 3.5);
        let json = serde_json::to_value(&dto).unwrap();
        assert!(json.get("averageRating").is_some());
        assert!(json.get("prepTime").is_some());
        assert!(json.get("imageUrl").is_some());
        assert!(json.get("commentCount").is_some());
        assert!(json.get("average_rating").is_none());
    }

    #[test]
    fn rating_input_bounds() {
        assert!(RatingInput { score: 1 }.validate().is_ok());
        assert!(RatingInput { score: 5 }.validate().is_ok());
        assert!(RatingInput { score: 0 }.validate().is_err());
        assert!(RatingInput { score: 6 }.validate().is_err());
    }

    #[test]
    fn comment_input_rejects_empty_and_oversized() {
        assert!(CommentInput { content: "".to_string() }.validate().is_err());
        assert!(CommentInput { content: "x".repeat(1001) }.validate().is_err());
        assert!(CommentInput { content: "Delicious!".to_string() }.validate().is_ok());
    }

    #[test]
    fn recipe_form_requires_positive_prep_time() {
        use validator::Validate;
        let mut form = RecipeForm {
            title: "Soup".to_string(),
            description: "Warm".to_string(),
            prep_time: 0,
            category: "dinner".to_string(),
            instructions: None,
            ingredients: vec![],
        };
        assert!(form.validate().is_err());
        form.prep_time = 15;
        assert!(form.validate().is_ok());
    }
}
