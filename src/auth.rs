//! # Authentication and Authorization
//!
//! Admin accounts are stored per tenant with argon2 password hashes. A
//! successful login yields an HS256 session token bound to the tenant it was
//! issued for; the admin middleware rejects tokens presented on another
//! tenant's host.

use std::sync::LazyLock;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, forbidden, unauthorized};
use crate::models::admin;
use crate::repositories::AdminRepository;
use crate::server::AppState;
use crate::tenancy::ResolvedTenant;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

// Verified against when the email is unknown so both paths cost one hash.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("storefront-dummy-password").ok());

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Claims carried by an admin session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Admin id
    pub sub: Uuid,
    /// Tenant the session is bound to
    pub tid: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issue a session token for `admin`, valid for `ttl_seconds`.
pub fn issue_session(
    secret: &str,
    admin: &admin::Model,
    ttl_seconds: u64,
) -> Result<(String, SessionClaims), jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
    let claims = SessionClaims {
        sub: admin.id,
        tid: admin.tenant_id,
        email: admin.email.clone(),
        iat: now,
        exp: now.saturating_add(ttl),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

/// Decode and validate a session token (signature and expiry).
pub fn decode_session(
    secret: &str,
    token: &str,
) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

/// Check an email/password pair against the admins of `tenant_id`.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn authenticate(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    email: &str,
    password: &str,
) -> Result<admin::Model, ApiError> {
    let admin = AdminRepository::new(db)
        .find_by_email(tenant_id, email)
        .await?;

    match admin {
        Some(admin) if verify_password(password, &admin.password_hash) => Ok(admin),
        Some(_) => Err(unauthorized(Some(INVALID_CREDENTIALS))),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                verify_password(password, dummy);
            }
            Err(unauthorized(Some(INVALID_CREDENTIALS)))
        }
    }
}

/// Authenticated admin, inserted by [`admin_middleware`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub admin_id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
}

/// Require a valid session token issued for the host's tenant.
pub async fn admin_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let tenant = request
        .extensions()
        .get::<ResolvedTenant>()
        .cloned()
        .ok_or_else(|| unauthorized(Some("Store context missing")))?;

    let token = extract_bearer_token(request.headers())?;

    let secret = state
        .config
        .session_secret()
        .map_err(|err| ApiError::from(anyhow::Error::new(err)))?;

    let claims = decode_session(secret, token).map_err(|err| {
        tracing::debug!(error = %err, "Rejected admin session token");
        unauthorized(Some("Invalid or expired session"))
    })?;

    if claims.tid != tenant.id() {
        tracing::warn!(
            admin_id = %claims.sub,
            token_tenant = %claims.tid,
            host_tenant = %tenant.id(),
            "Admin session presented on another tenant's host"
        );
        return Err(forbidden(Some("Session does not belong to this store")));
    }

    request.extensions_mut().insert(AdminSession {
        admin_id: claims.sub,
        tenant_id: claims.tid,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminSession>()
            .cloned()
            .ok_or_else(|| unauthorized(Some("Admin authentication required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn admin() -> admin::Model {
        admin::Model {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            email: "owner@shop.example".to_string(),
            password_hash: String::new(),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn password_round_trip() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret!", "not-a-phc-string"));
    }

    #[test]
    fn session_token_carries_tenant() {
        let admin = admin();
        let (token, issued) = issue_session(SECRET, &admin, 3600).unwrap();
        let decoded = decode_session(SECRET, &token).unwrap();

        assert_eq!(decoded, issued);
        assert_eq!(decoded.tid, admin.tenant_id);
        assert_eq!(decoded.sub, admin.id);
    }

    #[test]
    fn session_token_rejects_wrong_secret() {
        let (token, _) = issue_session(SECRET, &admin(), 3600).unwrap();
        assert!(decode_session("another-secret-that-is-also-long-enough", &token).is_err());
    }

    #[test]
    fn expired_session_is_rejected() {
        let admin = admin();
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: admin.id,
            tid: admin.tenant_id,
            email: admin.email,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(decode_session(SECRET, &token).is_err());
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def");
    }
}
