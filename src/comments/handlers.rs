use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{dto::UserRef, session::AuthUser},
    comments::{
        dto::CommentRequest,
        repo::{Comment, CommentWithUser},
    },
    dilemmas::repo::Dilemma,
    error::{is_foreign_key_violation, ApiError},
    state::AppState,
};

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/comments", get(list_comments).post(add_comment))
        .route("/comments/:id", get(get_comment))
        .route("/comments/dilemma/:dilemma_id", get(comments_for_dilemma))
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
) -> Result<Json<Vec<CommentWithUser>>, ApiError> {
    Ok(Json(Comment::list_all(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CommentWithUser>, ApiError> {
    let comment = Comment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".into()))?;
    Ok(Json(comment))
}

#[instrument(skip(state, user, payload))]
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<CommentWithUser>, ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::Validation("Content is required".into()));
    }

    Dilemma::find_by_id(&state.db, payload.dilemma_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dilemma not found".into()))?;

    let comment = match Comment::create(
        &state.db,
        user.id,
        payload.dilemma_id,
        payload.content.trim(),
    )
    .await
    {
        Ok(c) => c,
        Err(e) if is_foreign_key_violation(&e) => {
            return Err(ApiError::NotFound("Dilemma not found".into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(comment_id = %comment.id, dilemma_id = %comment.dilemma_id, user_id = %user.id, "comment added");
    Ok(Json(CommentWithUser {
        id: comment.id,
        dilemma_id: comment.dilemma_id,
        content: comment.content,
        created_at: comment.created_at,
        user: UserRef {
            id: user.id,
            username: user.username,
        },
    }))
}

#[instrument(skip(state))]
pub async fn comments_for_dilemma(
    State(state): State<AppState>,
    Path(dilemma_id): Path<Uuid>,
) -> Result<Json<Vec<CommentWithUser>>, ApiError> {
    Dilemma::find_by_id(&state.db, dilemma_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dilemma not found".into()))?;
    let comments = Comment::for_dilemma(&state.db, dilemma_id).await?;
    Ok(Json(comments))
}
