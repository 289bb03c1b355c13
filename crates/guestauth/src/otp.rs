//! In-memory OTP state machine for Guest Auth Path B: a 6-digit code bound
//! to a phone number with a 10-minute TTL, same shape as a pairing-request
//! store — issue, verify-once, evict-expired.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::Rng;

use crate::error::{Error, Result};

pub const OTP_TTL: Duration = Duration::from_secs(10 * 60);

struct OtpEntry {
    code: String,
    bot_id: String,
    expires_at: Instant,
}

/// Tracks pending OTP challenges by phone number. One pending challenge per
/// phone at a time; issuing a new one replaces the old.
#[derive(Default)]
pub struct OtpStore {
    pending: DashMap<String, OtpEntry>,
}

impl OtpStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates and stores a fresh 6-digit code for `phone`, returning it
    /// so the caller can send it over the bot's own WhatsApp session.
    pub fn issue(&self, phone: &str, bot_id: &str) -> String {
        let code: u32 = rand::rng().random_range(0..1_000_000);
        let code = format!("{code:06}");
        self.pending.insert(
            phone.to_string(),
            OtpEntry {
                code: code.clone(),
                bot_id: bot_id.to_string(),
                expires_at: Instant::now() + OTP_TTL,
            },
        );
        code
    }

    /// Verifies `code` against the pending challenge for `phone`. Consumes
    /// the challenge on both success and failure — a guest gets one guess
    /// per issued code.
    pub fn verify(&self, phone: &str, code: &str) -> Result<String> {
        let (_, entry) = self.pending.remove(phone).ok_or(Error::OtpNotFound)?;
        if Instant::now() > entry.expires_at {
            return Err(Error::OtpExpired);
        }
        if entry.code != code {
            return Err(Error::OtpMismatch);
        }
        Ok(entry.bot_id)
    }

    /// Drops expired pending challenges. Callers may run this periodically;
    /// it is not required for correctness since `verify` checks expiry too.
    pub fn evict_expired(&self) {
        let now = Instant::now();
        self.pending.retain(|_, entry| now <= entry.expires_at);
    }
}
