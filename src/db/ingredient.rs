use super::DBClient;
use crate::db::order_clause;
use crate::dtos::SortOrder;
use crate::models::Ingredient;

/// Ingredient database operations trait
///
/// Creation goes through the recipe transaction (insert-if-absent by
/// normalized name); this trait only covers the read side.
pub trait IngredientExt {
    /// Get paginated ingredients, optionally filtered by a name substring,
    /// name ascending by default
    async fn get_ingredients(
        &self,
        query: Option<&str>,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<Ingredient>, sqlx::Error>;

    /// Count ingredients the same filter would match
    async fn get_ingredient_count(&self, query: Option<&str>) -> Result<i64, sqlx::Error>;
}

impl IngredientExt for DBClient {
    async fn get_ingredients(
        &self,
        query_text: Option<&str>,
        limit: i64,
        skip: i64,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Vec<Ingredient>, sqlx::Error> {
        let order_by = order_clause(
            sort_by,
            sort_order,
            &[("name", "i.name")],
            SortOrder::Asc,
            "i.name ASC",
        );

        let query = format!(
            r#"
            SELECT i.id, i.name
            FROM ingredients i
            WHERE $1::text IS NULL OR i.name ILIKE '%' || $1 || '%'
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

    async fn get_ingredient_count(&self, query_text: Option<&str>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM ingredients i
            WHERE $1::text IS NULL OR i.name ILIKE '%' || $1 || '%'
            "#,
        )
        .bind(query_text)
        .fetch_one(&self.pool)
        .await
    }
}
