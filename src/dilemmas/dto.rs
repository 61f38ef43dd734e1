use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::dto::PublicUser,
    comments::repo::{Comment, CommentWithUser},
    votes::repo::{Vote, VoteWithUser},
};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;

/// Query string for the public listing: optional substring search plus
/// 1-based pagination.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Backslash-escape the LIKE metacharacters so user input matches literally.
/// Postgres treats `\` as the escape character by default.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl ListQuery {
    /// Clamp raw query values into (search pattern, page, limit). The pattern
    /// is ready for ILIKE; an absent search matches everything.
    pub fn normalize(&self) -> (String, i64, i64) {
        let pattern = match self.search.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => format!("%{}%", escape_like(s)),
            _ => "%".to_string(),
        };
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        (pattern, page, limit)
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = (total + limit - 1) / limit;
        Self {
            page,
            limit,
            total,
            total_pages,
            has_more: page * limit < total,
        }
    }
}

/// Request body for create and update. The author always comes from the
/// session, never from the body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DilemmaPayload {
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl DilemmaPayload {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".into());
        }
        if self.description.trim().is_empty() {
            return Err("Description is required".into());
        }
        if self.options.len() < 2 {
            return Err("At least two options are required".into());
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err("Options must not be empty".into());
        }
        if self.category.trim().is_empty() {
            return Err("Category is required".into());
        }
        Ok(())
    }
}

/// Listing item: author projection plus embedded votes and comments.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DilemmaListItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
    pub category: String,
    pub image_url: Option<String>,
    pub author_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub author: PublicUser,
    pub votes: Vec<Vote>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Serialize)]
pub struct DilemmaListResponse {
    pub data: Vec<DilemmaListItem>,
    pub pagination: PaginationMeta,
}

/// Full detail: voter and commenter projections included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DilemmaDetail {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
    pub category: String,
    pub image_url: Option<String>,
    pub author_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub author: PublicUser,
    pub votes: Vec<VoteWithUser>,
    pub comments: Vec<CommentWithUser>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub ok: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_defaults() {
        let (pattern, page, limit) = ListQuery::default().normalize();
        assert_eq!(pattern, "%");
        assert_eq!(page, 1);
        assert_eq!(limit, DEFAULT_LIMIT);
    }

    #[test]
    fn normalize_clamps_out_of_range_values() {
        let q = ListQuery {
            search: Some("  trolley  ".into()),
            page: Some(0),
            limit: Some(500),
        };
        let (pattern, page, limit) = q.normalize();
        assert_eq!(pattern, "%trolley%");
        assert_eq!(page, 1);
        assert_eq!(limit, MAX_LIMIT);
    }

    #[test]
    fn normalize_treats_blank_search_as_absent() {
        let q = ListQuery {
            search: Some("   ".into()),
            page: Some(3),
            limit: Some(25),
        };
        let (pattern, page, limit) = q.normalize();
        assert_eq!(pattern, "%");
        assert_eq!(page, 3);
        assert_eq!(limit, 25);
    }

    #[test]
    fn normalize_escapes_like_metacharacters() {
        let q = ListQuery {
            search: Some("50% of_us\\here".into()),
            page: None,
            limit: None,
        };
        let (pattern, _, _) = q.normalize();
        assert_eq!(pattern, "%50\\% of\\_us\\\\here%");
    }

    #[test]
    fn pagination_second_page_of_fifteen() {
        // 15 rows, page 2, limit 10: five items left, nothing after.
        let meta = PaginationMeta::new(2, 10, 15);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_more);
    }

    #[test]
    fn pagination_first_page_has_more() {
        let meta = PaginationMeta::new(1, 10, 15);
        assert_eq!(meta.total_pages, 2);
        assert!(meta.has_more);
    }

    #[test]
    fn pagination_exact_multiple() {
        let meta = PaginationMeta::new(2, 10, 20);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_more);
    }

    #[test]
    fn payload_validation() {
        let mut payload = DilemmaPayload {
            title: "Trolley problem".into(),
            description: "Pull the lever?".into(),
            options: vec!["Yes".into(), "No".into()],
            category: "ETHICS".into(),
            image_url: None,
        };
        assert!(payload.validate().is_ok());

        payload.options.pop();
        assert_eq!(
            payload.validate().unwrap_err(),
            "At least two options are required"
        );

        payload.options = vec!["Yes".into(), "   ".into()];
        assert_eq!(payload.validate().unwrap_err(), "Options must not be empty");

        payload.options = vec!["Yes".into(), "No".into()];
        payload.title = " ".into();
        assert_eq!(payload.validate().unwrap_err(), "Title is required");
    }

    #[test]
    fn pagination_meta_serializes_camel_case() {
        let json = serde_json::to_string(&PaginationMeta::new(1, 10, 3)).unwrap();
        assert!(json.contains("totalPages"));
        assert!(json.contains("hasMore"));
    }
}
