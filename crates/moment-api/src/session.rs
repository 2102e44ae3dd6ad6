//! Operator session scheme: one shared password, one random token.
//!
//! The token itself and a digest of it travel as two httpOnly cookies; a
//! request is authenticated when the presented token's recomputed digest
//! matches the presented digest. No server-side session table — the digest
//! cookie is the stored record.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::RngCore;
use sha2::{Digest, Sha256};

use moment_intake::compare::constant_time_eq;

pub const SESSION_COOKIE: &str = "dashboard_session";
pub const SESSION_HASH_COOKIE: &str = "dashboard_session_hash";
pub const SESSION_TTL_HOURS: i64 = 24;

/// 256 bits of randomness, hex-encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Cookie-based session check. Absence of either cookie or a digest
/// mismatch both mean "not authenticated"; this never fails.
pub fn is_authenticated(jar: &CookieJar) -> bool {
    let (Some(token), Some(stored)) = (jar.get(SESSION_COOKIE), jar.get(SESSION_HASH_COOKIE))
    else {
        return false;
    };
    let recomputed = token_digest(token.value());
    constant_time_eq(recomputed.as_bytes(), stored.value().as_bytes())
}

pub fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::hours(SESSION_TTL_HOURS))
        .build()
}

/// Replacement cookie that expires immediately, clearing the original.
pub fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_64_hex_chars_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn matching_token_and_digest_authenticate() {
        let token = generate_token();
        let digest = token_digest(&token);
        let jar = CookieJar::new()
            .add(Cookie::new(SESSION_COOKIE, token))
            .add(Cookie::new(SESSION_HASH_COOKIE, digest));
        assert!(is_authenticated(&jar));
    }

    #[test]
    fn missing_or_mismatched_cookies_do_not_authenticate() {
        assert!(!is_authenticated(&CookieJar::new()));

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, generate_token()));
        assert!(!is_authenticated(&jar));

        let jar = CookieJar::new()
            .add(Cookie::new(SESSION_COOKIE, generate_token()))
            .add(Cookie::new(SESSION_HASH_COOKIE, token_digest("other")));
        assert!(!is_authenticated(&jar));
    }

    #[test]
    fn issued_cookies_are_script_inaccessible_and_scoped() {
        let c = session_cookie(SESSION_COOKIE, "abc".into(), true);
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.secure(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::Strict));
        assert_eq!(c.path(), Some("/"));
        assert_eq!(c.max_age(), Some(time::Duration::hours(24)));
    }

    #[test]
    fn expired_cookie_zeroes_value() {
        let c = expired_cookie(SESSION_COOKIE, false);
        assert_eq!(c.value(), "");
        assert_eq!(c.max_age(), Some(time::Duration::ZERO));
    }
}
