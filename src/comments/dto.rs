use serde::Deserialize;
use uuid::Uuid;

/// Request body for adding a comment. The commenter comes from the session.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub dilemma_id: Uuid,
    pub content: String,
}
