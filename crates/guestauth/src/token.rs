//! Short-lived guest tokens binding `(phoneNumber, botId)`. Layered on
//! [`wafleet_common::token`]'s sign/verify mechanics.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const GUEST_TOKEN_TTL_SECS: i64 = 2 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestClaims {
    pub phone: String,
    pub bot_id: String,
    pub exp: i64,
}

impl GuestClaims {
    #[must_use]
    pub fn new(phone: &str, bot_id: &str, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            phone: phone.to_string(),
            bot_id: bot_id.to_string(),
            exp: now.timestamp() + GUEST_TOKEN_TTL_SECS,
        }
    }
}

pub fn issue(phone: &str, bot_id: &str, now: chrono::DateTime<chrono::Utc>, secret: &str) -> Result<String> {
    let claims = GuestClaims::new(phone, bot_id, now);
    Ok(wafleet_common::token::sign(&claims, secret)?)
}

pub fn verify(token: &str, secret: &str, now: chrono::DateTime<chrono::Utc>) -> Result<GuestClaims> {
    let claims: GuestClaims = wafleet_common::token::verify(token, secret)?;
    if now.timestamp() > claims.exp {
        return Err(Error::InvalidToken);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn round_trips() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let token = issue("254700000001", "bot1", now, "secret").unwrap();
        let claims = verify(&token, "secret", now).unwrap();
        assert_eq!(claims.phone, "254700000001");
        assert_eq!(claims.bot_id, "bot1");
    }

    #[test]
    fn rejects_expired() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let token = issue("254700000001", "bot1", now, "secret").unwrap();
        let later = now + chrono::Duration::seconds(GUEST_TOKEN_TTL_SECS + 1);
        assert!(matches!(verify(&token, "secret", later), Err(Error::InvalidToken)));
    }
}
