use super::DBClient;
use crate::db::order_clause;
use crate::dtos::SortOrder;
use crate::models::{Rating, RatingWithRecipeRow};
use std::collections::HashMap;
use uuid::Uuid;

/// Mean and count of the ratings of one recipe, computed on demand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingAggregate {
    pub average_rating: f64,
    pub total_ratings: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct RatingAverageRow {
    recipe_id: Uuid,
    average: Option<f64>,
}

/// Rating database operations trait
pub trait RatingExt {
    /// Get single rating by ID
    async fn get_rating(&self, rating_id: Uuid) -> Result<Option<Rating>, sqlx::Error>;

    /// Compute the aggregate for one recipe; 0.0/0 when it has no ratings
    async fn get_rating_aggregate(&self, recipe_id: Uuid)
    -> Result<RatingAggregate, sqlx::Error>;

    /// Compute averages for a batch of recipes in one grouped query
    ///
    /// Every requested id is present in the result, defaulting to 0.0.
    async fn get_rating_aggregates(
        &self,
        recipe_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, f64>, sqlx::Error>;

    /// Create or update the (user, recipe) rating in one atomic statement
    async fn upsert_rating(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        score: i32,
    ) -> Result<Rating, sqlx::Error>;

    /// Get paginated ratings by a user, each with a recipe summary
    async fn get_user_ratings(
        &self,
        user_id: Uuid,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<RatingWithRecipeRow>, sqlx::Error>;

    /// Count total ratings by a user
    async fn get_user_rating_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error>;

    /// Delete rating by ID; None when no such row
    async fn delete_rating(&self, rating_id: Uuid) -> Result<Option<Uuid>, sqlx::Error>;
}

impl RatingExt for DBClient {
    async fn get_rating(&self, rating_id: Uuid) -> Result<Option<Rating>, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            "SELECT id, score, user_id, recipe_id, created_at FROM ratings WHERE id = $1",
        )
        .bind(rating_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_rating_aggregate(
        &self,
        recipe_id: Uuid,
    ) -> Result<RatingAggregate, sqlx::Error> {
        let (average, total): (Option<f64>, i64) = sqlx::query_as(
            r#"
            SELECT AVG(score)::float8 AS average, COUNT(score) AS total
            FROM ratings
            WHERE recipe_id = $1
            "#,
        )
        .bind(recipe_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(RatingAggregate {
            average_rating: average.unwrap_or(0.0),
            total_ratings: total,
        })
    }

    async fn get_rating_aggregates(
        &self,
        recipe_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, f64>, sqlx::Error> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, RatingAverageRow>(
            r#"
            SELECT recipe_id, AVG(score)::float8 AS average
            FROM ratings
            WHERE recipe_id = ANY($1)
            GROUP BY recipe_id
            "#,
        )
        .bind(recipe_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(average_map(recipe_ids, rows))
    }

    async fn upsert_rating(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        score: i32,
    ) -> Result<Rating, sqlx::Error> {
        // The unique (user_id, recipe_id) constraint arbitrates concurrent
        // raters; no read-then-branch here.
        sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings (user_id, recipe_id, score)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, recipe_id) DO UPDATE SET score = EXCLUDED.score
            RETURNING id, score, user_id, recipe_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(recipe_id)
        .bind(score)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_user_ratings(
        &self,
        user_id: Uuid,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<RatingWithRecipeRow>, sqlx::Error> {
        let order_by = order_clause(
            sort_by,
            sort_order,
            &[("createdAt", "t.created_at"), ("score", "t.score")],
            SortOrder::Desc,
            "t.created_at DESC",
        );

        let query = format!(
            r#"
            SELECT t.id, t.score, t.recipe_id, t.created_at,
                   r.title AS recipe_title, r.image_url AS recipe_image_url
            FROM ratings t
            INNER JOIN recipes r ON t.recipe_id = r.id
            WHERE t.user_id = $1
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

    async fn get_user_rating_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ratings WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn delete_rating(&self, rating_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>("DELETE FROM ratings WHERE id = $1 RETURNING id")
            .bind(rating_id)
            .fetch_optional(&self.pool)
            .await
    }
}

/// Merge grouped average rows over the requested id set
///
/// Ids the GROUP BY produced no row for stay at 0.0, so the map always
/// contains exactly the requested ids.
fn average_map(recipe_ids: &[Uuid], rows: Vec<RatingAverageRow>) -> HashMap<Uuid, f64> {
    let mut averages: HashMap<Uuid, f64> =
        recipe_ids.iter().map(|id| (*id, 0.0)).collect();
    for row in rows {
        averages.insert(row.recipe_id, row.average.unwrap_or(0.0));
    }
    averages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_map_never_omits_an_id() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        // Only A has ratings: {4, 5, 3} -> 4.0
        let rows = vec![RatingAverageRow {
            recipe_id: a,
            average: Some(4.0),
        }];

        let map = average_map(&[a, b, c], rows);
        assert_eq!(map.len(), 3);
        assert_eq!(map[&a], 4.0);
        assert_eq!(map[&b], 0.0);
        assert_eq!(map[&c], 0.0);
    }

    #[test]
    fn average_map_treats_null_average_as_zero() {
        let a = Uuid::new_v4();
        let map = average_map(
            &[a],
            vec![RatingAverageRow {
                recipe_id: a,
                average: None,
            }],
        );
        assert_eq!(map[&a], 0.0);
    }

    #[test]
    fn average_map_empty_input() {
        let map = average_map(&[], vec![]);
        assert!(map.is_empty());
    }
}
