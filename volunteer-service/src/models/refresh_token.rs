use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use uuid::Uuid;

/// Refresh token session record. The `jti` claim of the JWT is the key;
/// only a hash of the token itself is stored.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    pub jti: String,
    pub account_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshTokenRecord {
    pub fn new(jti: String, account_id: Uuid, token: &str, expires_in_days: i64) -> Self {
        let now = Utc::now();
        Self {
            jti,
            account_id,
            token_hash: Self::hash_token(token),
            expires_at: now + Duration::days(expires_in_days),
            created_at: now,
            revoked: false,
        }
    }

    /// Hash a token using SHA-256.
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_live(&self) -> bool {
        !self.is_expired() && !self.revoked
    }

    /// Seconds until expiry, clamped at zero. Used as the denylist TTL.
    pub fn remaining_seconds(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_stores_hash_not_token() {
        let record =
            RefreshTokenRecord::new("jti-1".to_string(), Uuid::new_v4(), "token_abc", 7);

        assert_ne!(record.token_hash, "token_abc");
        assert_eq!(record.token_hash, RefreshTokenRecord::hash_token("token_abc"));
        assert!(record.is_live());
    }

    #[test]
    fn expiry_invalidates_record() {
        let mut record =
            RefreshTokenRecord::new("jti-1".to_string(), Uuid::new_v4(), "token_abc", 7);

        record.expires_at = Utc::now() - Duration::seconds(1);
        assert!(record.is_expired());
        assert!(!record.is_live());
        assert_eq!(record.remaining_seconds(), 0);
    }

    #[test]
    fn revocation_invalidates_record() {
        let mut record =
            RefreshTokenRecord::new("jti-1".to_string(), Uuid::new_v4(), "token_abc", 7);

        record.revoked = true;
        assert!(!record.is_live());
        assert!(!record.is_expired());
    }
}
