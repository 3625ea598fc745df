use super::DBClient;
use crate::db::order_clause;
use crate::dtos::SortOrder;
use crate::models::FavoriteRow;
use uuid::Uuid;

/// Favorite database operations trait
pub trait FavoriteExt {
    /// Flip the (user, recipe) favorite: remove it when present, create it
    /// otherwise. Returns the resulting liked state.
    async fn toggle_favorite(&self, user_id: Uuid, recipe_id: Uuid)
    -> Result<bool, sqlx::Error>;

    /// Count favorites on a recipe
    async fn get_recipe_favorite_count(&self, recipe_id: Uuid) -> Result<i64, sqlx::Error>;

    /// Get paginated favorites of a user, each carrying its full recipe
    async fn get_user_favorites(
        &self,
        user_id: Uuid,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<FavoriteRow>, sqlx::Error>;

    /// Count total favorites of a user
    async fn get_user_favorite_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error>;
}

impl FavoriteExt for DBClient {
    async fn toggle_favorite(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        // Delete-first keeps the toggle to two statements with no read
        // in between; the unique pair constraint absorbs a concurrent
        // create racing the insert.
        let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO favorites (user_id, recipe_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, recipe_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    async fn get_recipe_favorite_count(&self, recipe_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM favorites WHERE recipe_id = $1")
            .bind(recipe_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_user_favorites(
        &self,
        user_id: Uuid,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<FavoriteRow>, sqlx::Error> {
        let order_by = order_clause(
            sort_by,
            sort_order,
            &[("createdAt", "f.created_at")],
            SortOrder::Desc,
            "f.created_at DESC",
        );

        let query = format!(
            r#"
            SELECT f.id, f.created_at,
                   r.id AS recipe_id, r.title AS recipe_title,
                   r.description AS recipe_description, r.image_url AS recipe_image_url,
                   r.prep_time AS recipe_prep_time, r.category AS recipe_category,
                   r.instructions AS recipe_instructions, r.created_at AS recipe_created_at,
                   u.id AS author_id, u.name AS author_name, u.image AS author_image,
                   (SELECT COUNT(*) FROM comments c WHERE c.recipe_id = r.id) AS comment_count,
                   (SELECT COUNT(*) FROM favorites f2 WHERE f2.recipe_id = r.id) AS favorite_count,
                   (SELECT COUNT(*) FROM ratings t WHERE t.recipe_id = r.id) AS rating_count
            FROM favorites f
            INNER JOIN recipes r ON f.recipe_id = r.id
            INNER JOIN users u ON r.author_id = u.id
            WHERE f.user_id = $1
            ORDER BY {}
            LIMIT $2 OFFSET $3
            "#,
            order_by
        );

        sqlx::query_as(&query)
            .bind(user_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_user_favorite_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }
}
