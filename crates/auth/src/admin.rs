//! Admin bearer tokens for the fleet-management surface (§6.2). Layered on
//! [`wafleet_common::token`], same shape as the guest and RPC tokens — a
//! single operator identity (`sub`) with an expiry.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{StatusCode, request::Parts};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const ADMIN_TOKEN_TTL_SECS: i64 = 12 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub exp: i64,
}

pub fn issue(operator: &str, now: chrono::DateTime<chrono::Utc>, secret: &str) -> Result<String> {
    let claims = AdminClaims {
        sub: operator.to_string(),
        exp: now.timestamp() + ADMIN_TOKEN_TTL_SECS,
    };
    Ok(wafleet_common::token::sign(&claims, secret)?)
}

pub fn verify(token: &str, secret: &str, now: chrono::DateTime<chrono::Utc>) -> Result<AdminClaims> {
    let claims: AdminClaims = wafleet_common::token::verify(token, secret)?;
    if now.timestamp() > claims.exp {
        return Err(Error::InvalidToken);
    }
    Ok(claims)
}

/// Holds the process's admin-token signing secret, shared via axum state.
#[derive(Clone)]
pub struct AdminSecret(pub SecretString);

/// Extractor that validates the `Authorization: Bearer <admin-token>` header
/// and yields the authenticated operator's claims.
pub struct AdminSession(pub AdminClaims);

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    Arc<AdminSecret>: FromRef<S>,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let secret = Arc::<AdminSecret>::from_ref(state);
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or((StatusCode::UNAUTHORIZED, "missing bearer token"))?;

        verify(token, secret.0.expose_secret(), chrono::Utc::now())
            .map(AdminSession)
            .map_err(|_| (StatusCode::UNAUTHORIZED, "invalid or expired admin token"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn round_trips() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let token = issue("operator1", now, "admin-secret").unwrap();
        let claims = verify(&token, "admin-secret", now).unwrap();
        assert_eq!(claims.sub, "operator1");
    }

    #[test]
    fn rejects_expired() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let token = issue("operator1", now, "admin-secret").unwrap();
        let later = now + chrono::Duration::seconds(ADMIN_TOKEN_TTL_SECS + 1);
        assert!(matches!(verify(&token, "admin-secret", later), Err(Error::InvalidToken)));
    }

    #[test]
    fn rejects_wrong_secret() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let token = issue("operator1", now, "admin-secret").unwrap();
        assert!(verify(&token, "other-secret", now).is_err());
    }
}
