use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::dto::PublicUser;

/// Dilemma record. Options live in a jsonb column as an array of strings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Dilemma {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub options: Json<Vec<String>>,
    pub category: String,
    pub image_url: Option<String>,
    pub author_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Page row: dilemma plus the author projection from the join.
#[derive(Debug, FromRow)]
pub struct DilemmaAuthorRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub options: Json<Vec<String>>,
    pub category: String,
    pub image_url: Option<String>,
    pub author_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub author_username: String,
    pub author_email: String,
}

impl DilemmaAuthorRow {
    pub fn author(&self) -> PublicUser {
        PublicUser {
            id: self.author_id,
            username: self.author_username.clone(),
            email: self.author_email.clone(),
        }
    }
}

const PAGE_FILTER: &str = r#"
    FROM dilemmas d
    JOIN users u ON u.id = d.author_id
    WHERE d.title ILIKE $1 OR d.description ILIKE $1 OR u.username ILIKE $1
"#;

impl Dilemma {
    /// One page, newest first. `pattern` is an ILIKE pattern over title,
    /// description and author username; `%` matches everything.
    pub async fn page(
        db: &PgPool,
        pattern: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<DilemmaAuthorRow>> {
        let sql = format!(
            r#"
            SELECT d.id, d.title, d.description, d.options, d.category, d.image_url,
                   d.author_id, d.created_at, d.updated_at,
                   u.username AS author_username, u.email AS author_email
            {PAGE_FILTER}
            ORDER BY d.created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query_as::<_, DilemmaAuthorRow>(&sql)
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    /// Total rows matching the same filter as `page`.
    pub async fn count(db: &PgPool, pattern: &str) -> anyhow::Result<i64> {
        let sql = format!("SELECT COUNT(*) {PAGE_FILTER}");
        let total: i64 = sqlx::query_scalar(&sql).bind(pattern).fetch_one(db).await?;
        Ok(total)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Dilemma>> {
        let dilemma = sqlx::query_as::<_, Dilemma>(
            r#"
            SELECT id, title, description, options, category, image_url,
                   author_id, created_at, updated_at
            FROM dilemmas
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(dilemma)
    }

    pub async fn list_by_author(
        db: &PgPool,
        author_id: Uuid,
    ) -> anyhow::Result<Vec<DilemmaAuthorRow>> {
        let rows = sqlx::query_as::<_, DilemmaAuthorRow>(
            r#"
            SELECT d.id, d.title, d.description, d.options, d.category, d.image_url,
                   d.author_id, d.created_at, d.updated_at,
                   u.username AS author_username, u.email AS author_email
            FROM dilemmas d
            JOIN users u ON u.id = d.author_id
            WHERE d.author_id = $1
            ORDER BY d.created_at DESC
            "#,
        )
        .bind(author_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn create(
        db: &PgPool,
        author_id: Uuid,
        title: &str,
        description: &str,
        options: &[String],
        category: &str,
        image_url: Option<&str>,
    ) -> anyhow::Result<Dilemma> {
        let dilemma = sqlx::query_as::<_, Dilemma>(
            r#"
            INSERT INTO dilemmas (title, description, options, category, image_url, author_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, options, category, image_url,
                      author_id, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(Json(options.to_vec()))
        .bind(category)
        .bind(image_url)
        .bind(author_id)
        .fetch_one(db)
        .await?;
        Ok(dilemma)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: &str,
        description: &str,
        options: &[String],
        category: &str,
        image_url: Option<&str>,
    ) -> anyhow::Result<Dilemma> {
        let dilemma = sqlx::query_as::<_, Dilemma>(
            r#"
            UPDATE dilemmas
            SET title = $2, description = $3, options = $4, category = $5,
                image_url = $6, updated_at = now()
            WHERE id = $1
            RETURNING id, title, description, options, category, image_url,
                      author_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(Json(options.to_vec()))
        .bind(category)
        .bind(image_url)
        .fetch_one(db)
        .await?;
        Ok(dilemma)
    }

    /// Votes and comments go with it via ON DELETE CASCADE.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM dilemmas WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
