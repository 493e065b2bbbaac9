//! OTP challenge model - one short-lived code per email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending one-time passcode challenge.
///
/// `email` is the collection's unique key, so at most one challenge exists
/// per address; re-issuing replaces the row. An expired row is inert and
/// sits until the next issue overwrites it (expiry is checked at
/// verification, not swept in the background).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpChallenge {
    pub email: String,
    pub code: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl OtpChallenge {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
