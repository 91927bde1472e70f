//! Session tokens: issued at login, checked on every protected request.
//!
//! Tokens are stateless JWTs. Logout only tells the client to drop its
//! cookie; a token captured before logout verifies until it expires.
//! Real revocation needs a server-side denylist keyed by token id.

use axum_extra::extract::cookie::{Cookie, SameSite};
use campus_db::{Database, DbError};
use campus_types::api::Claims;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "token";

pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Missing, malformed, badly signed or expired.
    #[error("invalid token")]
    InvalidToken,

    /// Signature checks out but the user it names is gone.
    #[error("token subject does not exist")]
    UnknownSubject,

    #[error("token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Store(#[from] DbError),
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::days(SESSION_TTL_DAYS),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, SessionError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, issued_at: DateTime<Utc>) -> Result<String, SessionError> {
        let claims = Claims {
            sub: user_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Signature and expiry only. No store access.
    pub fn decode(&self, token: &str) -> Result<Claims, SessionError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| SessionError::InvalidToken)
    }

    /// Full check: the token must decode and its subject must still exist.
    /// Blocking; call from a blocking context.
    pub fn verify(&self, db: &Database, token: Option<&str>) -> Result<Uuid, SessionError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::InvalidToken)?;
        let claims = self.decode(token)?;

        if !db.user_exists(&claims.sub.to_string())? {
            return Err(SessionError::UnknownSubject);
        }
        Ok(claims.sub)
    }
}

/// Attributes of the cookie carrying the session token.
#[derive(Debug, Clone, Default)]
pub struct CookieSettings {
    pub domain: Option<String>,
    pub secure: bool,
}

impl CookieSettings {
    pub fn session_cookie(&self, token: String, ttl: Duration) -> Cookie<'static> {
        let mut cookie = self.base(token);
        cookie.set_max_age(time::Duration::seconds(ttl.num_seconds()));
        cookie
    }

    /// Same attributes as the session cookie so the browser replaces it.
    pub fn cleared_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.base(String::new());
        cookie.set_max_age(time::Duration::ZERO);
        cookie
    }

    fn base(&self, value: String) -> Cookie<'static> {
        // Browsers drop SameSite=None cookies that are not Secure
        let same_site = if self.secure { SameSite::None } else { SameSite::Lax };

        let mut cookie = Cookie::build((SESSION_COOKIE, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(same_site)
            .path("/")
            .build();

        if let Some(domain) = &self.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_user(id: Uuid) -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&id.to_string(), "alice", "a@x.com", "hash", "MIT")
            .unwrap();
        db
    }

    #[test]
    fn issued_token_verifies_to_its_subject() {
        let user = Uuid::new_v4();
        let db = db_with_user(user);
        let keys = SessionKeys::new("secret");

        let token = keys.issue(user).unwrap();
        assert_eq!(keys.verify(&db, Some(token.as_str())).unwrap(), user);
    }

    #[test]
    fn token_expires_after_seven_days() {
        let user = Uuid::new_v4();
        let db = db_with_user(user);
        let keys = SessionKeys::new("secret");

        let almost = keys
            .issue_at(user, Utc::now() - Duration::days(7) + Duration::minutes(5))
            .unwrap();
        assert_eq!(keys.verify(&db, Some(almost.as_str())).unwrap(), user);

        let expired = keys
            .issue_at(user, Utc::now() - Duration::days(7) - Duration::minutes(5))
            .unwrap();
        assert!(matches!(
            keys.verify(&db, Some(expired.as_str())),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let user = Uuid::new_v4();
        let db = db_with_user(user);

        let token = SessionKeys::new("other-secret").issue(user).unwrap();
        let result = SessionKeys::new("secret").verify(&db, Some(token.as_str()));
        assert!(matches!(result, Err(SessionError::InvalidToken)));
    }

    #[test]
    fn missing_or_garbage_token_is_invalid() {
        let db = Database::open_in_memory().unwrap();
        let keys = SessionKeys::new("secret");

        assert!(matches!(keys.verify(&db, None), Err(SessionError::InvalidToken)));
        assert!(matches!(keys.verify(&db, Some("")), Err(SessionError::InvalidToken)));
        assert!(matches!(
            keys.verify(&db, Some("not.a.jwt")),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn valid_token_for_missing_user_is_unknown_subject() {
        let db = Database::open_in_memory().unwrap();
        let keys = SessionKeys::new("secret");

        let token = keys.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(
            keys.verify(&db, Some(token.as_str())),
            Err(SessionError::UnknownSubject)
        ));
    }

    #[test]
    fn cookies_carry_session_attributes() {
        let settings = CookieSettings {
            domain: Some("campus.example".into()),
            secure: true,
        };

        let cookie = settings
            .session_cookie("abc".into(), Duration::days(SESSION_TTL_DAYS))
            .to_string();
        assert!(cookie.starts_with("token=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=None"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.contains("Domain=campus.example"));

        let cleared = settings.cleared_cookie().to_string();
        assert!(cleared.starts_with("token=;"));
        assert!(cleared.contains("Max-Age=0"));
    }
}
