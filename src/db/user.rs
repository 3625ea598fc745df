use super::DBClient;
use crate::db::order_clause;
use crate::dtos::{SortOrder, UserStatsDto};
use crate::models::User;
use uuid::Uuid;

/// User database operations trait
///
/// Accounts are created by the identity platform; this side only reads.
pub trait UserExt {
    /// Get single user by ID or email
    /// Returns Option - Some(user) if found, None if not found
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    /// Case-insensitive substring search over name and email,
    /// name ascending by default
    async fn search_users(
        &self,
        query: &str,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<User>, sqlx::Error>;

    /// Count users the same search would match
    async fn search_user_count(&self, query: &str) -> Result<i64, sqlx::Error>;

    /// Profile statistics: entity counts plus the average rating received
    /// across the user's recipes, fetched concurrently
    async fn get_user_stats(&self, user_id: Uuid) -> Result<UserStatsDto, sqlx::Error>;
}

impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(
                "SELECT id, name, email, image, created_at FROM users WHERE id = $1",
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(
                "SELECT id, name, email, image, created_at FROM users WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn search_users(
        &self,
        query_text: &str,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<User>, sqlx::Error> {
        let order_by = order_clause(
            sort_by,
            sort_order,
            &[("name", "u.name"), ("createdAt", "u.created_at")],
            SortOrder::Asc,
            "u.name ASC",
        );

        let query = format!(
            r#"
            SELECT u.id, u.name, u.email, u.image, u.created_at
            FROM users u
            WHERE u.name ILIKE '%' || $1 || '%' OR u.email ILIKE '%' || $1 || '%'
            ORDER BY {}
            LIMIT $2 OFFSET $3
            "#,
            order_by
        );

        sqlx::query_as(&query)
            .bind(query_text)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
    }

    async fn search_user_count(&self, query_text: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users u
            WHERE u.name ILIKE '%' || $1 || '%' OR u.email ILIKE '%' || $1 || '%'
            "#,
        )
        .bind(query_text)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_user_stats(&self, user_id: Uuid) -> Result<UserStatsDto, sqlx::Error> {
        let recipes = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM recipes WHERE author_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool);

        let favorites = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM favorites WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool);

        let ratings = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM ratings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool);

        let comments = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool);

        let received = sqlx::query_scalar::<_, Option<f64>>(
            r#"
            SELECT AVG(t.score)::float8
            FROM ratings t
            INNER JOIN recipes r ON t.recipe_id = r.id
            WHERE r.author_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool);

        // Independent aggregates; if any one fails the whole profile fails
        let (recipes_count, favorites_count, ratings_count, comments_count, average_received) =
            tokio::try_join!(recipes, favorites, ratings, comments, received)?;

        Ok(UserStatsDto {
            recipes_count,
            favorites_count,
            ratings_count,
            comments_count,
            average_rating_received: average_received.unwrap_or(0.0),
        })
    }
}
