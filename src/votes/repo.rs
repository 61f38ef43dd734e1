use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::dto::UserRef;

/// Vote record: at most one per (user, dilemma), enforced by the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub dilemma_id: Uuid,
    pub option: i32,
    pub created_at: OffsetDateTime,
}

/// Vote with the voter's public reference, for dilemma detail views.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteWithUser {
    pub id: Uuid,
    pub dilemma_id: Uuid,
    pub option: i32,
    pub created_at: OffsetDateTime,
    pub user: UserRef,
}

#[derive(Debug, FromRow)]
struct VoteUserRow {
    id: Uuid,
    user_id: Uuid,
    dilemma_id: Uuid,
    option: i32,
    created_at: OffsetDateTime,
    username: String,
}

impl From<VoteUserRow> for VoteWithUser {
    fn from(row: VoteUserRow) -> Self {
        VoteWithUser {
            id: row.id,
            dilemma_id: row.dilemma_id,
            option: row.option,
            created_at: row.created_at,
            user: UserRef {
                id: row.user_id,
                username: row.username,
            },
        }
    }
}

impl Vote {
    /// Insert relies on the unique constraint for duplicate detection, so the
    /// raw sqlx error is surfaced for the handler to classify.
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        dilemma_id: Uuid,
        option: i32,
    ) -> Result<Vote, sqlx::Error> {
        sqlx::query_as::<_, Vote>(
            r#"
            INSERT INTO votes (user_id, dilemma_id, option)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, dilemma_id, option, created_at
            "#,
        )
        .bind(user_id)
        .bind(dilemma_id)
        .bind(option)
        .fetch_one(db)
        .await
    }

    pub async fn for_dilemma(db: &PgPool, dilemma_id: Uuid) -> anyhow::Result<Vec<VoteWithUser>> {
        let rows = sqlx::query_as::<_, VoteUserRow>(
            r#"
            SELECT v.id, v.user_id, v.dilemma_id, v.option, v.created_at, u.username
            FROM votes v
            JOIN users u ON u.id = v.user_id
            WHERE v.dilemma_id = $1
            ORDER BY v.created_at ASC
            "#,
        )
        .bind(dilemma_id)
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().map(VoteWithUser::from).collect())
    }

    /// Votes for a page of dilemmas in one round trip.
    pub async fn for_dilemmas(db: &PgPool, dilemma_ids: &[Uuid]) -> anyhow::Result<Vec<Vote>> {
        let rows = sqlx::query_as::<_, Vote>(
            r#"
            SELECT id, user_id, dilemma_id, option, created_at
            FROM votes
            WHERE dilemma_id = ANY($1)
            ORDER BY created_at ASC
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
    fn vote_serializes_camel_case() {
        let vote = Vote {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            dilemma_id: Uuid::new_v4(),
            option: 0,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&vote).unwrap();
        assert!(json.contains("userId"));
        assert!(json.contains("dilemmaId"));
        assert!(json.contains(r#""option":0"#));
    }

    #[test]
    fn vote_with_user_nests_voter_reference() {
        let row = VoteUserRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            dilemma_id: Uuid::new_v4(),
            option: 1,
            created_at: OffsetDateTime::now_utc(),
            username: "bob".into(),
        };
        let user_id = row.user_id;
        let vote = VoteWithUser::from(row);
        assert_eq!(vote.user.id, user_id);
        assert_eq!(vote.user.username, "bob");
    }
}
