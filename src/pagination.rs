use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Resolved pagination inputs, ready to feed into LIMIT/OFFSET
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
    pub skip: i64,
}

/// Normalize raw page/limit query inputs
///
/// Missing or out-of-range values clamp silently: page is at least 1,
/// limit stays within 1..=100. Never fails.
pub fn calculate_pagination(page: Option<i64>, limit: Option<i64>) -> PageParams {
    let page = page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let skip = (page - 1) * limit;

    PageParams { page, limit, skip }
}

/// Pagination metadata attached to every listing response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
    #[serde(rename = "hasNext")]
    pub has_next: bool,
    #[serde(rename = "hasPrev")]
    pub has_prev: bool,
}

/// The uniform envelope returned by every listing endpoint
///
/// Callers depend on the exact field names, so this is serialized as-is
/// with no extra wrapping.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PaginatedResponse<T> {
    /// Wrap a result slice and its total count into the envelope
    ///
    /// `total_pages` is ceil(total/limit), 0 when total is 0, in which case
    /// both navigation flags are false.
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        let limit = limit.max(1);
        let total_pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };

        PaginatedResponse {
            data,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages,
                has_next: page < total_pages,
                has_prev: page > 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let params = calculate_pagination(None, None);
        assert_eq!(params, PageParams { page: 1, limit: 10, skip: 0 });
    }

    #[test]
    fn page_clamps_to_one() {
        assert_eq!(calculate_pagination(Some(0), None).page, 1);
        assert_eq!(calculate_pagination(Some(-3), None).page, 1);
    }

    #[test]
    fn limit_clamps_to_bounds() {
        assert_eq!(calculate_pagination(None, Some(0)).limit, 1);
        assert_eq!(calculate_pagination(None, Some(-5)).limit, 1);
        assert_eq!(calculate_pagination(None, Some(101)).limit, 100);
        assert_eq!(calculate_pagination(None, Some(100)).limit, 100);
    }

    #[test]
    fn skip_is_page_minus_one_times_limit() {
        let params = calculate_pagination(Some(3), Some(25));
        assert_eq!(params.skip, 50);
        assert_eq!(calculate_pagination(Some(1), Some(10)).skip, 0);
    }

    #[test]
    fn envelope_flags_middle_page() {
        // 5 comments, page 2 of 3 at limit 2
        let response = PaginatedResponse::new(vec!["a", "b"], 5, 2, 2);
        assert_eq!(
            response.pagination,
            Pagination {
                page: 2,
                limit: 2,
                total: 5,
                total_pages: 3,
                has_next: true,
                has_prev: true,
            }
        );
    }

    #[test]
    fn envelope_first_and_last_page() {
        let first = PaginatedResponse::new(vec![1, 2], 6, 1, 2);
        assert!(first.pagination.has_next);
        assert!(!first.pagination.has_prev);

        let last = PaginatedResponse::new(vec![5, 6], 6, 3, 2);
        assert!(!last.pagination.has_next);
        assert!(last.pagination.has_prev);
    }

    #[test]
    fn envelope_empty_result() {
        let response = PaginatedResponse::new(Vec::<i32>::new(), 0, 1, 10);
        assert_eq!(response.pagination.total_pages, 0);
        assert!(!response.pagination.has_next);
        assert!(!response.pagination.has_prev);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PaginatedResponse::new(vec![()], 11, 1, 10).pagination.total_pages, 2);
        assert_eq!(PaginatedResponse::new(vec![()], 10, 1, 10).pagination.total_pages, 1);
        assert_eq!(PaginatedResponse::new(vec![()], 1, 1, 10).pagination.total_pages, 1);
    }

    #[test]
    fn envelope_serializes_with_wire_names() {
        let response = PaginatedResponse::new(vec![1], 1, 1, 10);
        let json = serde_json::to_value(&response).unwrap();
        let pagination = &json["pagination"];
        assert!(pagination.get("totalPages").is_some());
        assert!(pagination.get("hasNext").is_some());
        assert!(pagination.get("hasPrev").is_some());
        assert_eq!(json["data"], serde_json::json!([1]));
    }
}
