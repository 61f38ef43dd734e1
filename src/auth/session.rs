//! Session resolution shared by every route. One resolver turns a request
//! into `Option<PublicUser>`; the `AuthUser` extractor maps `None` to 401
//! while `MaybeUser` lets handlers branch on presence themselves.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::{
    auth::{cookies::ACCESS_COOKIE, dto::PublicUser, jwt::JwtKeys, repo::User},
    error::ApiError,
    state::AppState,
};

/// Pull a named cookie out of a `Cookie` header value.
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key == name {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Bearer token from the Authorization header if present, otherwise the
/// access cookie. Absent both ways means no identity was presented.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| cookie_value(raw, ACCESS_COOKIE))
}

/// Resolve the request's identity. Every failure mode (no token, bad
/// signature, expired, wrong kind, user since deleted) is simply `None`.
pub async fn resolve_identity(parts: &Parts, state: &AppState) -> Option<PublicUser> {
    let token = token_from_headers(&parts.headers)?;
    let keys = JwtKeys::from_ref(state);
    let claims = match keys.verify_access(&token) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "session token rejected");
            return None;
        }
    };
    match User::find_public_by_id(&state.db, claims.sub).await {
        Ok(user) => user,
        Err(e) => {
            debug!(error = %e, user_id = %claims.sub, "session user lookup failed");
            None
        }
    }
}

/// Optional identity: always succeeds, handlers see present-or-absent.
pub struct MaybeUser(pub Option<PublicUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve_identity(parts, state).await))
    }
}

/// Required identity: same resolution, absent identity becomes 401.
pub struct AuthUser(pub PublicUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_identity(parts, state)
            .await
            .map(AuthUser)
            .ok_or_else(ApiError::unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn cookie_value_finds_named_cookie() {
        let raw = "theme=dark; token=abc.def.ghi; other=1";
        assert_eq!(cookie_value(raw, "token").as_deref(), Some("abc.def.ghi"));
        assert_eq!(cookie_value(raw, "refreshToken"), None);
    }

    #[test]
    fn cookie_value_ignores_malformed_parts() {
        assert_eq!(cookie_value("novalue; token=x", "token").as_deref(), Some("x"));
        assert_eq!(cookie_value("", "token"), None);
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let map = headers(&[
            ("authorization", "Bearer header-token"),
            ("cookie", "token=cookie-token"),
        ]);
        assert_eq!(token_from_headers(&map).as_deref(), Some("header-token"));
    }

    #[test]
    fn falls_back_to_access_cookie() {
        let map = headers(&[("cookie", "token=cookie-token")]);
        assert_eq!(token_from_headers(&map).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let map = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(token_from_headers(&map), None);
    }

    #[test]
    fn no_token_means_no_identity() {
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }
}
