use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{dto::PublicUser, repo::User, session::AuthUser},
    comments::repo::Comment,
    dilemmas::{
        dto::{
            DeletedResponse, DilemmaDetail, DilemmaListItem, DilemmaListResponse, DilemmaPayload,
            ListQuery, PaginationMeta,
        },
        repo::{Dilemma, DilemmaAuthorRow},
    },
    error::ApiError,
    state::AppState,
    votes::repo::Vote,
};

pub fn dilemma_routes() -> Router<AppState> {
    Router::new()
        .route("/dilemmas", get(list_dilemmas).post(create_dilemma))
        .route("/dilemmas/my-posts", get(my_dilemmas))
        .route(
            "/dilemmas/:id",
            get(get_dilemma).put(update_dilemma).delete(delete_dilemma),
        )
}

/// Attach votes and comments to a page of dilemma rows in two round trips.
async fn hydrate_rows(
    state: &AppState,
    rows: Vec<DilemmaAuthorRow>,
) -> Result<Vec<DilemmaListItem>, ApiError> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut votes_by_dilemma: HashMap<Uuid, Vec<Vote>> = HashMap::new();
    for vote in Vote::for_dilemmas(&state.db, &ids).await? {
        votes_by_dilemma.entry(vote.dilemma_id).or_default().push(vote);
    }
    let mut comments_by_dilemma: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for comment in Comment::for_dilemmas(&state.db, &ids).await? {
        comments_by_dilemma
            .entry(comment.dilemma_id)
            .or_default()
            .push(comment);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let author = row.author();
            DilemmaListItem {
                votes: votes_by_dilemma.remove(&row.id).unwrap_or_default(),
                comments: comments_by_dilemma.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                description: row.description,
                options: row.options.0,
                category: row.category,
                image_url: row.image_url,
                author_id: row.author_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
                author,
            }
        })
        .collect())
}

async fn load_detail(
    state: &AppState,
    dilemma: Dilemma,
    author: PublicUser,
) -> Result<DilemmaDetail, ApiError> {
    let votes = Vote::for_dilemma(&state.db, dilemma.id).await?;
    let comments = Comment::for_dilemma(&state.db, dilemma.id).await?;
    Ok(DilemmaDetail {
        id: dilemma.id,
        title: dilemma.title,
        description: dilemma.description,
        options: dilemma.options.0,
        category: dilemma.category,
        image_url: dilemma.image_url,
        author_id: dilemma.author_id,
        created_at: dilemma.created_at,
        updated_at: dilemma.updated_at,
        author,
        votes,
        comments,
    })
}

/// Only the author may mutate a dilemma. Existence is checked first, so a
/// non-author on an existing dilemma always gets 403, never 404.
fn ensure_author(dilemma: &Dilemma, user: &PublicUser, action: &str) -> Result<(), ApiError> {
    if dilemma.author_id != user.id {
        return Err(ApiError::Forbidden(format!(
            "Not authorized to {action} this dilemma"
        )));
    }
    Ok(())
}

async fn author_of(state: &AppState, dilemma: &Dilemma) -> Result<PublicUser, ApiError> {
    User::find_public_by_id(&state.db, dilemma.author_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dilemma not found".into()))
}

#[instrument(skip(state))]
pub async fn list_dilemmas(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<DilemmaListResponse>, ApiError> {
    let (pattern, page, limit) = query.normalize();
    let total = Dilemma::count(&state.db, &pattern).await?;
    let rows = Dilemma::page(&state.db, &pattern, limit, (page - 1) * limit).await?;
    let data = hydrate_rows(&state, rows).await?;
    Ok(Json(DilemmaListResponse {
        data,
        pagination: PaginationMeta::new(page, limit, total),
    }))
}

#[instrument(skip(state))]
pub async fn get_dilemma(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DilemmaDetail>, ApiError> {
    let dilemma = Dilemma::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dilemma not found".into()))?;
    let author = author_of(&state, &dilemma).await?;
    Ok(Json(load_detail(&state, dilemma, author).await?))
}

#[instrument(skip(state, user))]
pub async fn my_dilemmas(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<DilemmaListItem>>, ApiError> {
    let rows = Dilemma::list_by_author(&state.db, user.id).await?;
    Ok(Json(hydrate_rows(&state, rows).await?))
}

#[instrument(skip(state, user, payload))]
pub async fn create_dilemma(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<DilemmaPayload>,
) -> Result<Json<DilemmaDetail>, ApiError> {
    payload.validate().map_err(ApiError::Validation)?;

    // author_id always comes from the session, never the body.
    let dilemma = Dilemma::create(
        &state.db,
        user.id,
        payload.title.trim(),
        payload.description.trim(),
        &payload.options,
        payload.category.trim(),
        payload.image_url.as_deref(),
    )
    .await?;

    info!(dilemma_id = %dilemma.id, author_id = %user.id, "dilemma created");
    Ok(Json(load_detail(&state, dilemma, user).await?))
}

#[instrument(skip(state, user, payload))]
pub async fn update_dilemma(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DilemmaPayload>,
) -> Result<Json<DilemmaDetail>, ApiError> {
    payload.validate().map_err(ApiError::Validation)?;

    let existing = Dilemma::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dilemma not found".into()))?;
    ensure_author(&existing, &user, "edit")?;

    let updated = Dilemma::update(
        &state.db,
        id,
        payload.title.trim(),
        payload.description.trim(),
        &payload.options,
        payload.category.trim(),
        payload.image_url.as_deref(),
    )
    .await?;

    info!(dilemma_id = %id, author_id = %user.id, "dilemma updated");
    Ok(Json(load_detail(&state, updated, user).await?))
}

#[instrument(skip(state, user))]
pub async fn delete_dilemma(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let existing = Dilemma::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dilemma not found".into()))?;
    ensure_author(&existing, &user, "delete")?;

    Dilemma::delete(&state.db, id).await?;

    info!(dilemma_id = %id, author_id = %user.id, "dilemma deleted");
    Ok(Json(DeletedResponse {
        ok: true,
        message: "Dilemma deleted successfully".into(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use time::OffsetDateTime;

    use super::*;

    fn dilemma_by(author_id: Uuid) -> Dilemma {
        Dilemma {
            id: Uuid::new_v4(),
            title: "Trolley problem".into(),
            description: "Pull the lever?".into(),
            options: sqlx::types::Json(vec!["Yes".into(), "No".into()]),
            category: "ETHICS".into(),
            image_url: None,
            author_id,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn user(id: Uuid) -> PublicUser {
        PublicUser {
            id,
            username: "alice".into(),
            email: "alice@example.com".into(),
        }
    }

    #[test]
    fn author_may_mutate_own_dilemma() {
        let id = Uuid::new_v4();
        assert!(ensure_author(&dilemma_by(id), &user(id), "edit").is_ok());
    }

    #[test]
    fn non_author_gets_forbidden() {
        let err = ensure_author(&dilemma_by(Uuid::new_v4()), &user(Uuid::new_v4()), "delete")
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.user_message(), "Not authorized to delete this dilemma");
    }
}
