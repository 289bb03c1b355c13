//! Compact HS256-signed token primitive shared by the guest-auth and
//! cross-tenancy-RPC token formats: three base64url segments,
//! `header.payload.signature`, where the header is the fixed literal
//! `{"alg":"HS256","typ":"JWT"}` and the payload is caller-defined claims.
//! Callers own their own claims shape and expiry/audience checks; this
//! module only owns the encode/sign/verify mechanics.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("bad signature")]
    BadSignature,
    #[error("claims serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Signs `claims` with `secret`, returning `header.payload.signature`.
pub fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, TokenError> {
    let header_b64 = URL_SAFE_NO_PAD.encode(HEADER);
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let signing_input = format!("{header_b64}.{payload_b64}");

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::BadSignature)?;
    mac.update(signing_input.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Verifies the signature and decodes the claims. Does not interpret any
/// claim field — expiry, audience, and issuer checks are the caller's
/// responsibility.
pub fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T, TokenError> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };
    if parts.next().is_some() {
        return Err(TokenError::Malformed);
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| TokenError::Malformed)?;
    let signing_input = format!("{header_b64}.{payload_b64}");

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::BadSignature)?;
    mac.update(signing_input.as_bytes());
    mac.verify_slice(&signature).map_err(|_| TokenError::BadSignature)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| TokenError::Malformed)?;
    Ok(serde_json::from_slice(&payload)?)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Claims {
        sub: String,
        exp: i64,
    }

    #[test]
    fn round_trips() {
        let claims = Claims { sub: "abc".into(), exp: 123 };
        let token = sign(&claims, "secret").unwrap();
        let decoded: Claims = verify(&token, "secret").unwrap();
        assert_eq!(claims, decoded);
    }

    #[test]
    fn rejects_wrong_secret() {
        let claims = Claims { sub: "abc".into(), exp: 123 };
        let token = sign(&claims, "secret").unwrap();
        let result: Result<Claims, _> = verify(&token, "other");
        assert!(matches!(result, Err(TokenError::BadSignature)));
    }

    #[test]
    fn rejects_truncated_token() {
        let result: Result<Claims, _> = verify("a.b", "secret");
        assert!(matches!(result, Err(TokenError::Malformed)));
    }
}
