use super::DBClient;
use crate::db::order_clause;
use crate::dtos::SortOrder;
use crate::models::{Comment, CommentRow, CommentWithRecipeRow};
use uuid::Uuid;

/// Comment database operations trait
///
/// Ownership is not folded into these queries; handlers check the author
/// explicitly before calling the keyed update/delete, so "forbidden" and
/// "not found" stay distinguishable.
pub trait CommentExt {
    /// Get single comment by ID, for the ownership check
    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, sqlx::Error>;

    /// Get paginated comments on a recipe with their authors
    async fn get_recipe_comments(
        &self,
        recipe_id: Uuid,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<CommentRow>, sqlx::Error>;

    /// Count total comments on a recipe
    async fn get_recipe_comment_count(&self, recipe_id: Uuid) -> Result<i64, sqlx::Error>;

    /// Get paginated comments by a user, each with a recipe summary
    async fn get_user_comments(
        &self,
        user_id: Uuid,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<CommentWithRecipeRow>, sqlx::Error>;

    /// Count total comments by a user
    async fn get_user_comment_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error>;

    /// Create new comment on a recipe
    async fn create_comment(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        content: &str,
    ) -> Result<CommentRow, sqlx::Error>;

    /// Update comment content by ID; None when no such row
    async fn update_comment(
        &self,
        comment_id: Uuid,
        content: &str,
    ) -> Result<Option<CommentRow>, sqlx::Error>;

    /// Delete comment by ID; None when no such row
    async fn delete_comment(&self, comment_id: Uuid) -> Result<Option<Uuid>, sqlx::Error>;
}

impl CommentExt for DBClient {
    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, content, user_id, recipe_id, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_recipe_comments(
        &self,
        recipe_id: Uuid,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<CommentRow>, sqlx::Error> {
        let order_by = order_clause(
            sort_by,
            sort_order,
            &[("createdAt", "c.created_at")],
            SortOrder::Desc,
            "c.created_at DESC",
        );

        let query = format!(
            r#"
            SELECT c.id, c.content, c.user_id, c.recipe_id, c.created_at, c.updated_at,
                   u.name AS user_name, u.image AS user_image
            FROM comments c
            INNER JOIN users u ON c.user_id = u.id
            WHERE c.recipe_id = $1
            ORDER BY {}
            LIMIT $2 OFFSET $3
            "#,
            order_by
        );

        sqlx::query_as(&query)
            .bind(recipe_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_recipe_comment_count(&self, recipe_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE recipe_id = $1")
            .bind(recipe_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_user_comments(
        &self,
        user_id: Uuid,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<CommentWithRecipeRow>, sqlx::Error> {
        let order_by = order_clause(
            sort_by,
            sort_order,
            &[("createdAt", "c.created_at")],
            SortOrder::Desc,
            "c.created_at DESC",
        );

        let query = format!(
            r#"
            SELECT c.id, c.content, c.user_id, c.recipe_id, c.created_at, c.updated_at,
                   u.name AS user_name, u.image AS user_image,
                   r.title AS recipe_title, r.image_url AS recipe_image_url
            FROM comments c
            INNER JOIN users u ON c.user_id = u.id
            INNER JOIN recipes r ON c.recipe_id = r.id
            WHERE c.user_id = $1
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

    async fn get_user_comment_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn create_comment(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        content: &str,
    ) -> Result<CommentRow, sqlx::Error> {
        // CTE so the fresh row comes back joined with its author
        sqlx::query_as::<_, CommentRow>(
            r#"
            WITH new_comment AS (
                INSERT INTO comments (user_id, recipe_id, content)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT nc.id, nc.content, nc.user_id, nc.recipe_id, nc.created_at, nc.updated_at,
                   u.name AS user_name, u.image AS user_image
            FROM new_comment nc
            INNER JOIN users u ON nc.user_id = u.id
            "#,
        )
        .bind(user_id)
        .bind(recipe_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_comment(
        &self,
        comment_id: Uuid,
        content: &str,
    ) -> Result<Option<CommentRow>, sqlx::Error> {
        sqlx::query_as::<_, CommentRow>(
            r#"
            WITH updated_comment AS (
                UPDATE comments
                SET content = $1, updated_at = NOW()
                WHERE id = $2
                RETURNING *
            )
            SELECT uc.id, uc.content, uc.user_id, uc.recipe_id, uc.created_at, uc.updated_at,
                   u.name AS user_name, u.image AS user_image
            FROM updated_comment uc
            INNER JOIN users u ON uc.user_id = u.id
            "#,
        )
        .bind(content)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>("DELETE FROM comments WHERE id = $1 RETURNING id")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await
    }
}
