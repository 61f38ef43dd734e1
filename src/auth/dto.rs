use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public part of the user returned to the client and attached to the
/// request context by the session resolver. Never carries the hash.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Request body for profile updates. Both fields are re-checked for
/// uniqueness against other accounts.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: String,
    pub email: String,
}

/// Request body for password changes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Minimal user reference embedded in votes and comments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRef {
    pub id: Uuid,
    pub username: String,
}

/// Response for register and login. Tokens travel in cookies, not the body.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
}

/// Response for `GET /api/auth/me`: `user` is null when unauthenticated.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<PublicUser>,
}

/// Response for refresh and logout.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn me_response_serializes_null_user() {
        let json = serde_json::to_string(&MeResponse { user: None }).unwrap();
        assert_eq!(json, r#"{"user":null}"#);
    }

    #[test]
    fn change_password_request_uses_camel_case_keys() {
        let req: ChangePasswordRequest = serde_json::from_str(
            r#"{"currentPassword":"old-secret","newPassword":"new-secret"}"#,
        )
        .unwrap();
        assert_eq!(req.current_password, "old-secret");
        assert_eq!(req.new_password, "new-secret");
    }

    #[test]
    fn public_user_serializes_all_fields() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("alice@example.com"));
        assert!(json.contains("username"));
    }
}
