//! Session cookie construction. Browsers are the primary transport for both
//! tokens; a bearer header remains a fallback for non-browser clients.

pub const ACCESS_COOKIE: &str = "token";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Cross-origin frontend deployments need SameSite=None, which browsers only
/// accept together with Secure. Development stays on Lax over plain http.
fn flags(production: bool) -> &'static str {
    if production {
        "HttpOnly; Secure; SameSite=None"
    } else {
        "HttpOnly; SameSite=Lax"
    }
}

fn build(name: &str, value: &str, max_age_secs: u64, production: bool) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; {}",
        name,
        value,
        max_age_secs,
        flags(production)
    )
}

pub fn access_cookie(token: &str, max_age_secs: u64, production: bool) -> String {
    build(ACCESS_COOKIE, token, max_age_secs, production)
}

pub fn refresh_cookie(token: &str, max_age_secs: u64, production: bool) -> String {
    build(REFRESH_COOKIE, token, max_age_secs, production)
}

pub fn clear_cookie(name: &str, production: bool) -> String {
    build(name, "", 0, production)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_cookie_is_secure_and_cross_site() {
        let c = access_cookie("abc", 900, true);
        assert!(c.starts_with("token=abc; "));
        assert!(c.contains("Max-Age=900"));
        assert!(c.contains("HttpOnly"));
        assert!(c.contains("Secure"));
        assert!(c.contains("SameSite=None"));
    }

    #[test]
    fn development_cookie_is_lax_without_secure() {
        let c = refresh_cookie("xyz", 604800, false);
        assert!(c.starts_with("refreshToken=xyz; "));
        assert!(c.contains("Max-Age=604800"));
        assert!(c.contains("SameSite=Lax"));
        assert!(!c.contains("Secure"));
    }

    #[test]
    fn clearing_sets_empty_value_and_zero_age() {
        let c = clear_cookie(ACCESS_COOKIE, false);
        assert!(c.starts_with("token=; "));
        assert!(c.contains("Max-Age=0"));
    }
}
