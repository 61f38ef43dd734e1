use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::session::AuthUser,
    dilemmas::repo::Dilemma,
    error::{is_foreign_key_violation, is_unique_violation, ApiError},
    state::AppState,
    votes::{
        dto::VoteRequest,
        repo::{Vote, VoteWithUser},
    },
};

pub fn vote_routes() -> Router<AppState> {
    Router::new()
        .route("/votes", post(cast_vote))
        .route("/votes/dilemma/:dilemma_id", get(votes_for_dilemma))
}

/// The option index must address one of the dilemma's options.
fn check_option_range(option: i32, option_count: usize) -> Result<(), ApiError> {
    if option < 0 || (option as usize) >= option_count {
        return Err(ApiError::Validation(format!(
            "Option must be between 0 and {}",
            option_count.saturating_sub(1)
        )));
    }
    Ok(())
}

#[instrument(skip(state, user))]
pub async fn cast_vote(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<Vote>, ApiError> {
    let dilemma = Dilemma::find_by_id(&state.db, payload.dilemma_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dilemma not found".into()))?;
    check_option_range(payload.option, dilemma.options.0.len())?;

    // Concurrent duplicates race here; the unique constraint picks exactly
    // one winner and the loser sees the violation.
    match Vote::create(&state.db, user.id, payload.dilemma_id, payload.option).await {
        Ok(vote) => {
            info!(vote_id = %vote.id, dilemma_id = %vote.dilemma_id, user_id = %user.id, "vote cast");
            Ok(Json(vote))
        }
        Err(e) if is_unique_violation(&e) => {
            warn!(dilemma_id = %payload.dilemma_id, user_id = %user.id, "duplicate vote");
            Err(ApiError::Validation(
                "You have already voted on this dilemma".into(),
            ))
        }
        // The dilemma can disappear between the existence check and the insert.
        Err(e) if is_foreign_key_violation(&e) => {
            Err(ApiError::NotFound("Dilemma not found".into()))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state))]
pub async fn votes_for_dilemma(
    State(state): State<AppState>,
    Path(dilemma_id): Path<Uuid>,
) -> Result<Json<Vec<VoteWithUser>>, ApiError> {
    Dilemma::find_by_id(&state.db, dilemma_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dilemma not found".into()))?;
    let votes = Vote::for_dilemma(&state.db, dilemma_id).await?;
    Ok(Json(votes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_zero_and_last_are_valid() {
        assert!(check_option_range(0, 2).is_ok());
        assert!(check_option_range(1, 2).is_ok());
    }

    #[test]
    fn option_out_of_range_is_rejected() {
        let err = check_option_range(2, 2).unwrap_err();
        assert_eq!(err.user_message(), "Option must be between 0 and 1");
        assert!(check_option_range(-1, 2).is_err());
    }
}
