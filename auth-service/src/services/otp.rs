use chrono::{Duration, Utc};
use rand::Rng;
use service_core::error::AppError;
use subtle::ConstantTimeEq;

use super::MongoDb;

pub const OTP_CODE_LENGTH: usize = 6;

/// Outcome of checking a submitted code against the stored challenge.
///
/// The distinction between variants is for logging and tests; callers
/// collapse everything but `Valid` into a single rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpVerification {
    Valid,
    Invalid,
    Expired,
    NotFound,
}

/// OTP challenge lifecycle: issue, verify, consume.
#[derive(Clone)]
pub struct OtpService {
    db: MongoDb,
    ttl_minutes: i64,
}

impl OtpService {
    pub fn new(db: MongoDb, ttl_minutes: i64) -> Self {
        Self { db, ttl_minutes }
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl_minutes
    }

    /// Generate a fresh code and upsert it as the single live challenge
    /// for `email`, replacing any prior code.
    pub async fn issue(&self, email: &str) -> Result<String, AppError> {
        let code = generate_code();
        let expires_at = Utc::now() + Duration::minutes(self.ttl_minutes);

        self.db.upsert_challenge(email, &code, expires_at).await?;

        tracing::debug!(email = %email, ttl_minutes = self.ttl_minutes, "OTP challenge issued");
        Ok(code)
    }

    /// Read-only check of `submitted` against the stored challenge.
    ///
    /// On `Valid` the caller must follow up with [`Self::consume`] within
    /// the same logical operation.
    pub async fn verify(
        &self,
        email: &str,
        submitted: &str,
    ) -> Result<OtpVerification, AppError> {
        let Some(challenge) = self.db.find_challenge(email).await? else {
            return Ok(OtpVerification::NotFound);
        };

        if !codes_match(&challenge.code, submitted) {
            return Ok(OtpVerification::Invalid);
        }

        if challenge.is_expired() {
            return Ok(OtpVerification::Expired);
        }

        Ok(OtpVerification::Valid)
    }

    /// Delete the challenge for `email`. Idempotent.
    pub async fn consume(&self, email: &str) -> Result<(), AppError> {
        self.db.delete_challenge(email).await
    }
}

/// Six-digit code, zero-padded, uniform over 000000-999999.
///
/// `thread_rng` is a CSPRNG, so codes are not guessable from prior ones.
fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:0width$}", n, width = OTP_CODE_LENGTH)
}

/// Constant-time code comparison. Lengths are public (the code width is
/// fixed), so the early length check leaks nothing.
fn codes_match(stored: &str, submitted: &str) -> bool {
    stored.len() == submitted.len()
        && bool::from(stored.as_bytes().ct_eq(submitted.as_bytes()))
}
