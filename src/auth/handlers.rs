use axum::{
    extract::{FromRef, State},
    http::{header::SET_COOKIE, HeaderMap},
    routing::{get, post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        cookies::{self, ACCESS_COOKIE, REFRESH_COOKIE},
        dto::{
            AuthResponse, ChangePasswordRequest, LoginRequest, MeResponse, OkResponse,
            RegisterRequest, UpdateProfileRequest,
        },
        jwt::JwtKeys,
        password,
        repo::User,
        session::{cookie_value, AuthUser, MaybeUser},
    },
    error::{is_unique_violation, ApiError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/update-profile", put(update_profile))
        .route("/auth/change-password", put(change_password))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Both tokens as Set-Cookie headers, max-age matching each TTL.
fn session_cookies(
    keys: &JwtKeys,
    user_id: uuid::Uuid,
    production: bool,
) -> anyhow::Result<HeaderMap> {
    let access = keys.sign_access(user_id)?;
    let refresh = keys.sign_refresh(user_id)?;
    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        cookies::access_cookie(&access, keys.access_ttl.as_secs(), production).parse()?,
    );
    headers.append(
        SET_COOKIE,
        cookies::refresh_cookie(&refresh, keys.refresh_ttl.as_secs(), production).parse()?,
    );
    Ok(headers)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if payload.username.is_empty() {
        return Err(ApiError::Validation("Username is required".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::Validation("Password too short".into()));
    }

    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "username already registered");
        return Err(ApiError::Conflict("Username already exists".into()));
    }
    if User::find_by_email(&state.db, &payload.email)
        .await?
        .is_some()
    {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already exists".into()));
    }

    let hash = password::hash_password_blocking(payload.password).await?;

    // Concurrent registrations can still race past the pre-checks; the unique
    // constraints are the final arbiter.
    let user = match User::create(&state.db, &payload.username, &payload.email, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::Conflict("Username or email already exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let keys = JwtKeys::from_ref(&state);
    let headers = session_cookies(&keys, user.id, state.config.production)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((headers, Json(AuthResponse { user: user.public() })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    // Same generic failure for unknown email and wrong password so the
    // endpoint cannot be used to enumerate accounts.
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::invalid_credentials()
        })?;

    let ok =
        password::verify_password_blocking(payload.password, user.password_hash.clone()).await?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::invalid_credentials());
    }

    let keys = JwtKeys::from_ref(&state);
    let headers = session_cookies(&keys, user.id, state.config.production)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok((headers, Json(AuthResponse { user: user.public() })))
}

#[instrument(skip(state, req_headers))]
pub async fn refresh(
    State(state): State<AppState>,
    req_headers: HeaderMap,
) -> Result<(HeaderMap, Json<OkResponse>), ApiError> {
    let token = req_headers
        .get(axum::http::header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| cookie_value(raw, REFRESH_COOKIE))
        .ok_or_else(ApiError::unauthenticated)?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&token)
        .map_err(|_| ApiError::unauthenticated())?;

    // A deleted user must not be able to mint new sessions.
    let user = User::find_public_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(ApiError::unauthenticated)?;

    let access = keys.sign_access(user.id)?;
    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        cookies::access_cookie(&access, keys.access_ttl.as_secs(), state.config.production)
            .parse()
            .map_err(anyhow::Error::from)?,
    );

    info!(user_id = %user.id, "access token refreshed");
    Ok((headers, Json(OkResponse { ok: true })))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> (HeaderMap, Json<OkResponse>) {
    let production = state.config.production;
    let mut headers = HeaderMap::new();
    for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
        if let Ok(value) = cookies::clear_cookie(name, production).parse() {
            headers.append(SET_COOKIE, value);
        }
    }
    (headers, Json(OkResponse { ok: true }))
}

#[instrument(skip_all)]
pub async fn me(MaybeUser(user): MaybeUser) -> Json<MeResponse> {
    Json(MeResponse { user })
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(mut payload): Json<UpdateProfileRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if payload.username.is_empty() {
        return Err(ApiError::Validation("Username is required".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    // Uniqueness is re-checked against other accounts; keeping your own
    // username or email is not a conflict.
    if let Some(existing) = User::find_by_username(&state.db, &payload.username).await? {
        if existing.id != user.id {
            return Err(ApiError::Conflict("Username already exists".into()));
        }
    }
    if let Some(existing) = User::find_by_email(&state.db, &payload.email).await? {
        if existing.id != user.id {
            return Err(ApiError::Conflict("Email already exists".into()));
        }
    }

    let updated =
        match User::update_profile(&state.db, user.id, &payload.username, &payload.email).await {
            Ok(u) => u,
            Err(e) if is_unique_violation(&e) => {
                return Err(ApiError::Conflict("Username or email already exists".into()));
            }
            Err(e) => return Err(e.into()),
        };

    info!(user_id = %updated.id, username = %updated.username, "profile updated");
    Ok(Json(AuthResponse {
        user: updated.public(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    if payload.current_password.is_empty() {
        return Err(ApiError::Validation("Current password is required".into()));
    }
    if payload.new_password.len() < 8 {
        return Err(ApiError::Validation("Password too short".into()));
    }

    let record = User::find_by_id(&state.db, user.id)
        .await?
        .ok_or_else(ApiError::unauthenticated)?;

    let ok = password::verify_password_blocking(payload.current_password, record.password_hash)
        .await?;
    if !ok {
        warn!(user_id = %user.id, "password change with wrong current password");
        return Err(ApiError::Validation("Current password is incorrect".into()));
    }

    let hash = password::hash_password_blocking(payload.new_password).await?;
    User::update_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(OkResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
    }

    #[test]
    fn email_validation_rejects_garbage() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("spaces in@example.com"));
    }
}
