use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::dto::UserRef;

/// Comment record. Append-only: no update or delete operations exist.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub dilemma_id: Uuid,
    pub content: String,
    pub created_at: OffsetDateTime,
}

/// Comment with the commenter's public reference.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithUser {
    pub id: Uuid,
    pub dilemma_id: Uuid,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub user: UserRef,
}

#[derive(Debug, FromRow)]
struct CommentUserRow {
    id: Uuid,
    user_id: Uuid,
    dilemma_id: Uuid,
    content: String,
    created_at: OffsetDateTime,
    username: String,
}

impl From<CommentUserRow> for CommentWithUser {
    fn from(row: CommentUserRow) -> Self {
        CommentWithUser {
            id: row.id,
            dilemma_id: row.dilemma_id,
            content: row.content,
            created_at: row.created_at,
            user: UserRef {
                id: row.user_id,
                username: row.username,
            },
        }
    }
}

impl Comment {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        dilemma_id: Uuid,
        content: &str,
    ) -> Result<Comment, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (user_id, dilemma_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, dilemma_id, content, created_at
            "#,
        )
        .bind(user_id)
        .bind(dilemma_id)
        .bind(content)
        .fetch_one(db)
        .await
    }

    /// Every comment across all dilemmas, newest first.
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<CommentWithUser>> {
        let rows = sqlx::query_as::<_, CommentUserRow>(
            r#"
            SELECT c.id, c.user_id, c.dilemma_id, c.content, c.created_at, u.username
            FROM comments c
            JOIN users u ON u.id = c.user_id
            ORDER BY c.created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().map(CommentWithUser::from).collect())
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<CommentWithUser>> {
        let row = sqlx::query_as::<_, CommentUserRow>(
            r#"
            SELECT c.id, c.user_id, c.dilemma_id, c.content, c.created_at, u.username
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row.map(CommentWithUser::from))
    }

    /// Newest first, matching the original feed ordering.
    pub async fn for_dilemma(
        db: &PgPool,
        dilemma_id: Uuid,
    ) -> anyhow::Result<Vec<CommentWithUser>> {
        let rows = sqlx::query_as::<_, CommentUserRow>(
            r#"
            SELECT c.id, c.user_id, c.dilemma_id, c.content, c.created_at, u.username
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.dilemma_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(dilemma_id)
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().map(CommentWithUser::from).collect())
    }

    /// Comments for a page of dilemmas in one round trip.
    pub async fn for_dilemmas(db: &PgPool, dilemma_ids: &[Uuid]) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, user_id, dilemma_id, content, created_at
            FROM comments
            WHERE dilemma_id = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(dilemma_ids)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_serializes_camel_case() {
        let comment = Comment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            dilemma_id: Uuid::new_v4(),
            content: "hard one".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&comment).unwrap();
        assert!(json.contains("dilemmaId"));
        assert!(json.contains("createdAt"));
        assert!(json.contains("hard one"));
    }
}
