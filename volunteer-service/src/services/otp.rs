use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{info, instrument};

use crate::models::OtpRecord;
use crate::services::error::ServiceError;
use crate::services::{AuthStore, SmsProvider};

pub const OTP_CODE_LENGTH: usize = 6;
/// Mismatches tolerated before a code locks out. The counter is
/// incremented before the threshold check, so the code stays usable
/// through attempt number `OTP_MAX_ATTEMPTS + 1`.
pub const OTP_MAX_ATTEMPTS: i32 = 3;

/// OTP lifecycle: generation, delivery, and verification. One live code
/// per phone number; regeneration replaces it and resets the counter.
pub struct OtpService {
    store: Arc<dyn AuthStore>,
    sms: Arc<dyn SmsProvider>,
    ttl_minutes: i64,
}

impl OtpService {
    pub fn new(store: Arc<dyn AuthStore>, sms: Arc<dyn SmsProvider>, ttl_minutes: i64) -> Self {
        Self {
            store,
            sms,
            ttl_minutes,
        }
    }

    fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        (0..OTP_CODE_LENGTH)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }

    /// Generate a fresh code for the phone number, persist it, and send
    /// it over SMS. Any prior code for the number is superseded.
    #[instrument(skip(self))]
    pub async fn request(&self, phone_number: &str) -> Result<(), ServiceError> {
        let code = Self::generate_code();
        let record = OtpRecord::new(phone_number.to_string(), code.clone(), self.ttl_minutes);
        self.store
            .upsert_otp(&record)
            .await
            .map_err(ServiceError::Store)?;

        let message = format!(
            "Your OTP is {}. It is valid for {} minutes.",
            code, self.ttl_minutes
        );
        let accepted = self
            .sms
            .send(phone_number, &message)
            .await
            .map_err(|e| ServiceError::Delivery(e.to_string()))?;
        if !accepted {
            return Err(ServiceError::Delivery(
                "SMS gateway rejected the message".to_string(),
            ));
        }

        info!(phone_number = %phone_number, "OTP generated and dispatched");
        Ok(())
    }

    /// Verify a submitted code. Every call that reaches the counting
    /// stage burns an attempt, including lockout probes; a correct code
    /// within the attempt budget marks the phone number verified.
    #[instrument(skip(self, submitted_code))]
    pub async fn verify(&self, phone_number: &str, submitted_code: &str) -> Result<(), ServiceError> {
        let record = self
            .store
            .find_otp(phone_number)
            .await
            .map_err(ServiceError::Store)?
            .ok_or(ServiceError::OtpNotFound)?;

        if !record.is_valid(Utc::now()) {
            return Err(ServiceError::OtpExpired);
        }

        let attempts = self
            .store
            .increment_otp_attempts(phone_number)
            .await
            .map_err(ServiceError::Store)?
            .ok_or(ServiceError::OtpNotFound)?;

        if attempts > OTP_MAX_ATTEMPTS {
            return Err(ServiceError::OtpAttemptsExceeded);
        }

        if !codes_match(&record.code, submitted_code) {
            return Err(ServiceError::OtpMismatch);
        }

        self.store
            .mark_phone_verified(phone_number)
            .await
            .map_err(ServiceError::Store)?;
        info!(phone_number = %phone_number, "Phone number verified");
        Ok(())
    }
}

fn codes_match(expected: &str, submitted: &str) -> bool {
    if expected.len() != submitted.len() {
        return false;
    }
    expected.as_bytes().ct_eq(submitted.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Account;
    use crate::services::{InMemoryStore, MockSms};
    use chrono::Duration;

    fn service_with(
        store: Arc<InMemoryStore>,
        sms: Arc<MockSms>,
    ) -> OtpService {
        OtpService::new(store, sms, 5)
    }

    async fn stored_code(store: &InMemoryStore, phone: &str) -> String {
        store.find_otp(phone).await.unwrap().unwrap().code
    }

    #[test]
    fn generated_code_is_six_digits() {
        for _ in 0..100 {
            let code = OtpService::generate_code();
            assert_eq!(code.len(), OTP_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn request_persists_and_sends_the_same_code() {
        let store = Arc::new(InMemoryStore::new());
        let sms = Arc::new(MockSms::new());
        let service = service_with(store.clone(), sms.clone());

        service.request("+15550001111").await.unwrap();

        let code = stored_code(&store, "+15550001111").await;
        let sent = sms.sent_messages();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains(&code));
    }

    #[tokio::test]
    async fn codes_are_independent_per_phone() {
        let store = Arc::new(InMemoryStore::new());
        let sms = Arc::new(MockSms::new());
        let service = service_with(store.clone(), sms.clone());

        service.request("+15550001111").await.unwrap();
        service.request("+15550002222").await.unwrap();

        let first = stored_code(&store, "+15550001111").await;

        // Wrong guesses against one number leave the other untouched.
        for _ in 0..5 {
            let _ = service.verify("+15550002222", "000000").await;
        }
        service.verify("+15550001111", &first).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_delivery_is_an_error() {
        let store = Arc::new(InMemoryStore::new());
        let sms = Arc::new(MockSms::new());
        let service = service_with(store.clone(), sms.clone());

        sms.fail_next();
        assert!(matches!(
            service.request("+15550001111").await,
            Err(ServiceError::Delivery(_))
        ));
    }

    #[tokio::test]
    async fn verify_without_record_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store, Arc::new(MockSms::new()));

        assert!(matches!(
            service.verify("+15550001111", "123456").await,
            Err(ServiceError::OtpNotFound)
        ));
    }

    #[tokio::test]
    async fn correct_code_verifies_every_matching_account() {
        let store = Arc::new(InMemoryStore::new());
        let sms = Arc::new(MockSms::new());
        let service = service_with(store.clone(), sms.clone());

        store
            .insert_account(&Account::new(
                "Asha Rao".to_string(),
                "asha".to_string(),
                "+15550001111".to_string(),
                "$argon2id$stub".to_string(),
            ))
            .await
            .unwrap();

        service.request("+15550001111").await.unwrap();
        let code = stored_code(&store, "+15550001111").await;
        service.verify("+15550001111", &code).await.unwrap();

        let account = store
            .find_account_by_phone("+15550001111")
            .await
            .unwrap()
            .unwrap();
        assert!(account.verified);
    }

    #[tokio::test]
    async fn repeated_correct_codes_succeed_within_budget() {
        let store = Arc::new(InMemoryStore::new());
        let sms = Arc::new(MockSms::new());
        let service = service_with(store.clone(), sms.clone());

        service.request("+15550001111").await.unwrap();
        let code = stored_code(&store, "+15550001111").await;

        service.verify("+15550001111", &code).await.unwrap();
        service.verify("+15550001111", &code).await.unwrap();
    }

    #[tokio::test]
    async fn wrong_guesses_then_lockout_sequence() {
        let store = Arc::new(InMemoryStore::new());
        let sms = Arc::new(MockSms::new());
        let service = service_with(store.clone(), sms.clone());

        service.request("+15550001111").await.unwrap();

        // Three mismatches, then lockout on every further call.
        for _ in 0..3 {
            assert!(matches!(
                service.verify("+15550001111", "000000").await,
                Err(ServiceError::OtpMismatch)
            ));
        }
        for _ in 0..2 {
            assert!(matches!(
                service.verify("+15550001111", "000000").await,
                Err(ServiceError::OtpAttemptsExceeded)
            ));
        }

        // Even the correct code is locked out now.
        let code = stored_code(&store, "+15550001111").await;
        assert!(matches!(
            service.verify("+15550001111", &code).await,
            Err(ServiceError::OtpAttemptsExceeded)
        ));
    }

    #[tokio::test]
    async fn expired_code_is_rejected_even_when_correct() {
        let store = Arc::new(InMemoryStore::new());
        let sms = Arc::new(MockSms::new());
        let service = service_with(store.clone(), sms.clone());

        service.request("+15550001111").await.unwrap();
        let mut record = store.find_otp("+15550001111").await.unwrap().unwrap();
        record.expires_at = Utc::now() - Duration::seconds(1);
        let code = record.code.clone();
        store.upsert_otp(&record).await.unwrap();

        assert!(matches!(
            service.verify("+15550001111", &code).await,
            Err(ServiceError::OtpExpired)
        ));
    }

    #[tokio::test]
    async fn regeneration_supersedes_the_old_code() {
        let store = Arc::new(InMemoryStore::new());
        let sms = Arc::new(MockSms::new());
        let service = service_with(store.clone(), sms.clone());

        service.request("+15550001111").await.unwrap();
        let first = stored_code(&store, "+15550001111").await;

        // Exhaust the attempt budget, then regenerate.
        for _ in 0..4 {
            let _ = service.verify("+15550001111", "000000").await;
        }
        service.request("+15550001111").await.unwrap();
        let second = stored_code(&store, "+15550001111").await;

        // Counter reset: the new code works, the old one is a plain
        // mismatch unless the codes happen to collide.
        service.verify("+15550001111", &second).await.unwrap();
        if first != second {
            assert!(matches!(
                service.verify("+15550001111", &first).await,
                Err(ServiceError::OtpMismatch)
            ));
        }
    }

    #[tokio::test]
    async fn parallel_wrong_guesses_each_burn_an_attempt() {
        let store = Arc::new(InMemoryStore::new());
        let sms = Arc::new(MockSms::new());
        let service = Arc::new(service_with(store.clone(), sms.clone()));

        service.request("+15550001111").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let _ = service.verify("+15550001111", "000000").await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = store.find_otp("+15550001111").await.unwrap().unwrap();
        assert_eq!(record.attempts, 8);
    }
}
