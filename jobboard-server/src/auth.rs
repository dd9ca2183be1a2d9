//! Password hashing, access tokens and the current-user extractors
//!
//! Tokens are HS256 JWTs whose `sub` is the user id. They travel in the
//! `token` cookie set by sign-in, or in an `Authorization: Bearer` header.

use crate::error::ApiError;
use crate::repository::RepoError;
use crate::state::SharedState;
use crate::types::{Role, User};
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use cookie::{Cookie, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Name of the cookie carrying the access token
pub const TOKEN_COOKIE: &str = "token";

/// bcrypt hashing on the blocking thread pool
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String, ApiError> {
        let password = password.to_string();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
    }

    /// `Ok(false)` on mismatch; `Err` only if the stored hash is unreadable
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, ApiError> {
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| ApiError::Internal(format!("verification task failed: {e}")))?
            .map_err(|e| ApiError::Internal(format!("password verification failed: {e}")))
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys for access tokens
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Sign a token for `user_id` valid for the configured TTL
    pub fn issue(&self, user_id: i64) -> Result<String, ApiError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
    }

    /// User id of a valid, unexpired token
    pub fn verify(&self, token: &str) -> Option<i64> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims.sub.parse().ok(),
            Err(e) => {
                tracing::debug!("Rejected token: {}", e);
                None
            }
        }
    }

    /// User id carried by the request headers, if any token there is valid
    pub fn user_id(&self, headers: &HeaderMap) -> Option<i64> {
        token_from_headers(headers).and_then(|token| self.verify(&token))
    }

    /// `Set-Cookie` value carrying `token`
    pub fn cookie(&self, token: &str) -> String {
        let max_age = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        Cookie::build((TOKEN_COOKIE, token.to_owned()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(cookie::time::Duration::seconds(max_age))
            .build()
            .to_string()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Token from the `token` cookie, else from `Authorization: Bearer`
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == TOKEN_COOKIE)
        .map(|cookie| cookie.value_trimmed().to_string())
        .filter(|token| !token.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// The authenticated user
pub struct CurrentUser(pub User);

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = state
            .keys
            .user_id(&parts.headers)
            .ok_or_else(ApiError::no_token)?;

        match state.repo.user(user_id).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(RepoError::NotFound(_)) => Err(ApiError::not_found("User not found")),
            Err(e) => Err(e.into()),
        }
    }
}

/// The authenticated user, required to be an admin
pub struct AdminUser(pub User);

impl FromRequestParts<SharedState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = state
            .keys
            .user_id(&parts.headers)
            .ok_or_else(ApiError::no_token)?;

        let user = match state.repo.user(user_id).await {
            Ok(user) => user,
            Err(RepoError::NotFound(_)) => return Err(ApiError::not_found("Admin not found")),
            Err(e) => return Err(e.into()),
        };

        if user.role != Role::Admin {
            return Err(ApiError::forbidden("You are not an admin"));
        }

        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn keys() -> JwtKeys {
        JwtKeys::new(b"0123456789abcdef0123456789abcdef", Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = keys();
        let token = keys.issue(42).unwrap();
        assert_eq!(keys.verify(&token), Some(42));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let other = JwtKeys::new(b"another-secret-another-secret!!", Duration::from_secs(3600));
        let token = other.issue(42).unwrap();
        assert_eq!(keys().verify(&token), None);
        assert_eq!(keys().verify("not-a-jwt"), None);
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = keys();
        let claims = Claims {
            sub: "42".into(),
            iat: 1_000,
            exp: 2_000,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();
        assert_eq!(keys.verify(&token), None);
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; token=abc.def.ghi"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_token_from_quoted_and_repeated_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("session=x; token=\"abc.def.ghi\""));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_empty_cookie_falls_back_to_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("token="));
        assert_eq!(token_from_headers(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_token_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(token_from_headers(&headers), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let header = keys().cookie("abc");
        let cookie = Cookie::parse(header.as_str()).unwrap();
        assert_eq!(cookie.name(), TOKEN_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(cookie::time::Duration::seconds(3600)));
    }

    #[tokio::test]
    async fn test_password_round_trip() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("correct horse").await.unwrap();

        assert_ne!(hash, "correct horse");
        assert!(hasher.verify("correct horse", &hash).await.unwrap());
        assert!(!hasher.verify("battery staple", &hash).await.unwrap());
    }
}
