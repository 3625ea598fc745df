use super::DBClient;
use crate::db::order_clause;
use crate::dtos::{IngredientInput, RecipeForm, SortOrder};
use crate::models::{RecipeIngredientRow, RecipeRow};
use sqlx::PgConnection;
use uuid::Uuid;

/// Shared projection for recipe listing rows: recipe columns, author,
/// and the per-recipe counts
const RECIPE_SELECT: &str = r#"
    SELECT r.id, r.title, r.description, r.image_url, r.prep_time, r.category,
           r.instructions, r.created_at,
           u.id AS author_id, u.name AS author_name, u.image AS author_image,
           (SELECT COUNT(*) FROM comments c WHERE c.recipe_id = r.id) AS comment_count,
           (SELECT COUNT(*) FROM favorites f WHERE f.recipe_id = r.id) AS favorite_count,
           (SELECT COUNT(*) FROM ratings t WHERE t.recipe_id = r.id) AS rating_count
    FROM recipes r
    INNER JOIN users u ON r.author_id = u.id
"#;

const RECIPE_SORT_FIELDS: &[(&str, &str)] = &[
    ("createdAt", "r.created_at"),
    ("title", "r.title"),
    ("prepTime", "r.prep_time"),
];

/// Recipe database operations trait
pub trait RecipeExt {
    /// Get single recipe with author and counts; None when missing
    async fn get_recipe(&self, recipe_id: Uuid) -> Result<Option<RecipeRow>, sqlx::Error>;

    /// Get the ingredient lines of a recipe
    async fn get_recipe_ingredients(
        &self,
        recipe_id: Uuid,
    ) -> Result<Vec<RecipeIngredientRow>, sqlx::Error>;

    /// Get paginated recipes, newest first by default
    async fn get_recent_recipes(
        &self,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<RecipeRow>, sqlx::Error>;

    /// Get paginated recipes ordered by rating count
    async fn get_popular_recipes(&self, limit: i64, skip: i64)
    -> Result<Vec<RecipeRow>, sqlx::Error>;

    /// Count all recipes
    async fn get_recipe_count(&self) -> Result<i64, sqlx::Error>;

    /// Get paginated recipes by one author
    async fn get_recipes_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<RecipeRow>, sqlx::Error>;

    /// Count recipes by one author
    async fn get_author_recipe_count(&self, author_id: Uuid) -> Result<i64, sqlx::Error>;

    /// Case-insensitive substring search over title and description
    async fn search_recipes(
        &self,
        query: &str,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<RecipeRow>, sqlx::Error>;

    /// Count rows the same search would match
    async fn search_recipe_count(&self, query: &str) -> Result<i64, sqlx::Error>;

    /// Create recipe and its ingredient links in one transaction
    async fn create_recipe(
        &self,
        author_id: Uuid,
        form: &RecipeForm,
        image_url: &str,
    ) -> Result<Uuid, sqlx::Error>;

    /// Update recipe fields and replace its ingredient links wholesale,
    /// in one transaction; None when the recipe no longer exists
    async fn update_recipe(
        &self,
        recipe_id: Uuid,
        form: &RecipeForm,
        image_url: &str,
    ) -> Result<Option<()>, sqlx::Error>;

    /// Delete recipe and its ingredient links; returns the stored image
    /// reference for cleanup, None when no such recipe
    async fn delete_recipe(&self, recipe_id: Uuid) -> Result<Option<String>, sqlx::Error>;
}

impl RecipeExt for DBClient {
    async fn get_recipe(&self, recipe_id: Uuid) -> Result<Option<RecipeRow>, sqlx::Error> {
        let query = format!("{} WHERE r.id = $1", RECIPE_SELECT);

        sqlx::query_as(&query)
            .bind(recipe_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_recipe_ingredients(
        &self,
        recipe_id: Uuid,
    ) -> Result<Vec<RecipeIngredientRow>, sqlx::Error> {
        sqlx::query_as::<_, RecipeIngredientRow>(
            r#"
            SELECT i.id, i.name, ri.quantity, ri.unit
            FROM recipe_ingredients ri
            INNER JOIN ingredients i ON ri.ingredient_id = i.id
            WHERE ri.recipe_id = $1
            ORDER BY i.name ASC
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_recent_recipes(
        &self,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<RecipeRow>, sqlx::Error> {
        let order_by = order_clause(
            sort_by,
            sort_order,
            RECIPE_SORT_FIELDS,
            SortOrder::Desc,
            "r.created_at DESC",
        );

        let query = format!("{} ORDER BY {} LIMIT $1 OFFSET $2", RECIPE_SELECT, order_by);

        sqlx::query_as(&query)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_popular_recipes(
        &self,
        limit: i64,
        skip: i64,
    ) -> Result<Vec<RecipeRow>, sqlx::Error> {
        // Popularity is rating volume, not score
        let query = format!(
            "{} ORDER BY rating_count DESC LIMIT $1 OFFSET $2",
            RECIPE_SELECT
        );

        sqlx::query_as(&query)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_recipe_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recipes")
            .fetch_one(&self.pool)
            .await
    }

    async fn get_recipes_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<RecipeRow>, sqlx::Error> {
        let order_by = order_clause(
            sort_by,
            sort_order,
            RECIPE_SORT_FIELDS,
            SortOrder::Desc,
            "r.created_at DESC",
        );

        let query = format!(
            "{} WHERE r.author_id = $1 ORDER BY {} LIMIT $2 OFFSET $3",
            RECIPE_SELECT, order_by
        );

        sqlx::query_as(&query)
            .bind(author_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_author_recipe_count(&self, author_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn search_recipes(
        &self,
        query_text: &str,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<RecipeRow>, sqlx::Error> {
        let order_by = order_clause(
            sort_by,
            sort_order,
            RECIPE_SORT_FIELDS,
            SortOrder::Desc,
            "r.created_at DESC",
        );

        let query = format!(
            "{} WHERE r.title ILIKE '%' || $1 || '%' OR r.description ILIKE '%' || $1 || '%' \
             ORDER BY {} LIMIT $2 OFFSET $3",
            RECIPE_SELECT, order_by
        );

        sqlx::query_as(&query)
            .bind(query_text)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
    }

    async fn search_recipe_count(&self, query_text: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM recipes r
            WHERE r.title ILIKE '%' || $1 || '%' OR r.description ILIKE '%' || $1 || '%'
            "#,
        )
        .bind(query_text)
        .fetch_one(&self.pool)
        .await
    }

    async fn create_recipe(
        &self,
        author_id: Uuid,
        form: &RecipeForm,
        image_url: &str,
    ) -> Result<Uuid, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let recipe_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO recipes (title, description, image_url, prep_time, category, instructions, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&form.title)
        .bind(&form.description)
        .bind(image_url)
        .bind(form.prep_time)
        .bind(&form.category)
        .bind(&form.instructions)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await?;

        link_ingredients(&mut tx, recipe_id, &form.ingredients).await?;

        tx.commit().await?;

        Ok(recipe_id)
    }

    async fn update_recipe(
        &self,
        recipe_id: Uuid,
        form: &RecipeForm,
        image_url: &str,
    ) -> Result<Option<()>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE recipes
            SET title = $1, description = $2, image_url = $3, prep_time = $4,
                category = $5, instructions = $6
            WHERE id = $7
            "#,
        )
        .bind(&form.title)
        .bind(&form.description)
        .bind(image_url)
        .bind(form.prep_time)
        .bind(&form.category)
        .bind(&form.instructions)
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Ok(None);
        }

        // Ingredient links are replaced wholesale on every update
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;

        link_ingredients(&mut tx, recipe_id, &form.ingredients).await?;

        tx.commit().await?;

        Ok(Some(()))
    }

    async fn delete_recipe(&self, recipe_id: Uuid) -> Result<Option<String>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;

        let image_url = sqlx::query_scalar::<_, String>(
            "DELETE FROM recipes WHERE id = $1 RETURNING image_url",
        )
        .bind(recipe_id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(image_url)
    }
}

/// Insert the ingredient links of a recipe inside an open transaction
///
/// Each name is normalized to lower case and resolved with an atomic
/// insert-if-absent, so two recipes submitting the same new ingredient
/// concurrently converge on a single row. Blank names are skipped.
async fn link_ingredients(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    recipe_id: Uuid,
    ingredients: &[IngredientInput],
) -> Result<(), sqlx::Error> {
    for ingredient in ingredients {
        let name = ingredient.name.trim().to_lowercase();
        if name.is_empty() {
            continue;
        }

        let ingredient_id = resolve_ingredient(&mut *tx, &name).await?;

        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity, unit)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(recipe_id)
        .bind(ingredient_id)
        .bind(ingredient.quantity)
        .bind(ingredient.unit.as_deref().map(str::trim))
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Find or create an ingredient by its normalized name
async fn resolve_ingredient(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query("INSERT INTO ingredients (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    sqlx::query_scalar::<_, Uuid>("SELECT id FROM ingredients WHERE name = $1")
        .bind(name)
        .fetch_one(&mut *conn)
        .await
}
