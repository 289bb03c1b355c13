//! HS256 claims for the cross-tenancy RPC boundary, layered on
//! [`wafleet_common::token`]'s sign/verify mechanics.

use serde::{Deserialize, Serialize};
use wafleet_common::token::TokenError;

use crate::error::Error;

impl From<TokenError> for Error {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::BadSignature | TokenError::Malformed => Self::BadSignature,
            TokenError::Serde(e) => Self::Message(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcClaims {
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub data: serde_json::Value,
}

impl RpcClaims {
    #[must_use]
    pub fn new(
        source: &str,
        target: &str,
        now: chrono::DateTime<chrono::Utc>,
        ttl_secs: i64,
        data: serde_json::Value,
    ) -> Self {
        Self {
            iss: source.to_string(),
            aud: target.to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + ttl_secs,
            data,
        }
    }
}

pub fn sign(claims: &RpcClaims, secret: &str) -> crate::error::Result<String> {
    Ok(wafleet_common::token::sign(claims, secret)?)
}

/// Verifies signature, audience, and expiry. Does not check `iss` against
/// the catalog — callers look up the source server's secret themselves.
pub fn verify(
    token: &str,
    secret: &str,
    expected_aud: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> crate::error::Result<RpcClaims> {
    let claims: RpcClaims = wafleet_common::token::verify(token, secret)?;
    if claims.aud != expected_aud {
        return Err(Error::WrongAudience);
    }
    if now.timestamp() > claims.exp {
        return Err(Error::Expired);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn round_trips_valid_token() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let claims = RpcClaims::new("Server1", "Server2", now, 30, serde_json::json!({"botId": "abc"}));
        let token = sign(&claims, "shared-secret").unwrap();

        let verified = verify(&token, "shared-secret", "Server2", now).unwrap();
        assert_eq!(verified.iss, "Server1");
        assert_eq!(verified.data["botId"], "abc");
    }

    #[test]
    fn rejects_wrong_secret() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let claims = RpcClaims::new("Server1", "Server2", now, 30, serde_json::json!({}));
        let token = sign(&claims, "shared-secret").unwrap();

        assert!(matches!(verify(&token, "wrong-secret", "Server2", now), Err(Error::BadSignature)));
    }

    #[test]
    fn rejects_expired_token() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let claims = RpcClaims::new("Server1", "Server2", now, 30, serde_json::json!({}));
        let token = sign(&claims, "shared-secret").unwrap();

        let later = now + chrono::Duration::seconds(31);
        assert!(matches!(verify(&token, "shared-secret", "Server2", later), Err(Error::Expired)));
    }

    #[test]
    fn rejects_wrong_audience() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let claims = RpcClaims::new("Server1", "Server2", now, 30, serde_json::json!({}));
        let token = sign(&claims, "shared-secret").unwrap();

        assert!(matches!(verify(&token, "shared-secret", "Server3", now), Err(Error::WrongAudience)));
    }

    #[test]
    fn rejects_malformed_token() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert!(matches!(verify("not-a-token", "shared-secret", "Server2", now), Err(Error::BadSignature)));
    }
}
