use crate::dtos::SortOrder;
use sqlx::{Pool, Postgres};

mod user;
pub use user::UserExt;

mod recipe;
pub use recipe::RecipeExt;

mod ingredient;
pub use ingredient::IngredientExt;

mod comment;
pub use comment::CommentExt;

mod rating;
pub use rating::RatingExt;

mod favorite;
pub use favorite::FavoriteExt;

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Postgres>,
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}

/// Build an ORDER BY expression from client sort parameters
///
/// The requested field must appear in `allowed` (wire name -> column); raw
/// client input is never interpolated into SQL. Anything unknown or absent
/// falls back to `default`. The direction defaults to `fallback_dir` when
/// the client names a field but no direction.
pub(crate) fn order_clause(
    sort_by: Option<&str>,
    sort_order: Option<SortOrder>,
    allowed: &[(&str, &str)],
    fallback_dir: SortOrder,
    default: &str,
) -> String {
    if let Some(requested) = sort_by {
        if let Some((_, column)) = allowed.iter().find(|(name, _)| *name == requested) {
            let dir = sort_order.unwrap_or(fallback_dir);
            return format!("{} {}", column, dir.as_sql());
        }
    }
    default.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[(&str, &str)] = &[("createdAt", "r.created_at"), ("title", "r.title")];

    #[test]
    fn known_field_with_direction() {
        let clause = order_clause(
            Some("title"),
            Some(SortOrder::Asc),
            ALLOWED,
            SortOrder::Desc,
            "r.created_at DESC",
        );
        assert_eq!(clause, "r.title ASC");
    }

    #[test]
    fn known_field_defaults_direction() {
        let clause = order_clause(
            Some("createdAt"),
            None,
            ALLOWED,
            SortOrder::Desc,
            "r.created_at DESC",
        );
        assert_eq!(clause, "r.created_at DESC");
    }

    #[test]
    fn unknown_field_falls_back() {
        // A hostile sortBy must never reach the SQL string
        let clause = order_clause(
            Some("title; DROP TABLE recipes"),
            Some(SortOrder::Asc),
            ALLOWED,
            SortOrder::Desc,
            "r.created_at DESC",
        );
        assert_eq!(clause, "r.created_at DESC");
    }

    #[test]
    fn absent_field_falls_back() {
        let clause = order_clause(None, Some(SortOrder::Asc), ALLOWED, SortOrder::Desc, "r.created_at DESC");
        assert_eq!(clause, "r.created_at DESC");
    }
}
