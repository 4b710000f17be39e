//! OTP record - one live code per phone number.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// OTP entity, keyed by phone number. Generation replaces the whole
/// record; expired or exhausted records stay until the next generation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OtpRecord {
    pub phone_number: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
}

impl OtpRecord {
    pub fn new(phone_number: String, code: String, ttl_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            phone_number,
            code,
            created_at: now,
            expires_at: now + Duration::minutes(ttl_minutes),
            attempts: 0,
        }
    }

    /// True iff `now` is strictly before expiry. Attempts are not considered.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_is_valid() {
        let record = OtpRecord::new("+15550001111".to_string(), "123456".to_string(), 5);
        assert!(record.is_valid(Utc::now()));
        assert_eq!(record.attempts, 0);
    }

    #[test]
    fn record_expires_strictly_at_expiry() {
        let record = OtpRecord::new("+15550001111".to_string(), "123456".to_string(), 5);
        assert!(!record.is_valid(record.expires_at));
        assert!(record.is_valid(record.expires_at - Duration::seconds(1)));
    }

    #[test]
    fn attempts_do_not_affect_validity() {
        let mut record = OtpRecord::new("+15550001111".to_string(), "123456".to_string(), 5);
        record.attempts = 99;
        assert!(record.is_valid(Utc::now()));
    }
}
