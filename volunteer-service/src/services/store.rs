use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{Account, OtpRecord, RefreshTokenRecord, Volunteer};

/// Durable store behind the auth core. Implementations must make the
/// per-key operations atomic: `upsert_otp` replaces the whole record,
/// `increment_otp_attempts` is a single read-modify-write, and
/// `consume_refresh_token` claims a live token for at most one caller.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn insert_account(&self, account: &Account) -> Result<(), anyhow::Error>;
    async fn find_account_by_phone(
        &self,
        phone_number: &str,
    ) -> Result<Option<Account>, anyhow::Error>;
    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, anyhow::Error>;
    async fn find_account_by_id(&self, account_id: Uuid)
        -> Result<Option<Account>, anyhow::Error>;
    /// Bulk update of every account with this phone number. Idempotent.
    /// Returns the number of rows touched.
    async fn mark_phone_verified(&self, phone_number: &str) -> Result<u64, anyhow::Error>;

    /// Replace the OTP record for the phone number: code, timestamps and
    /// attempt counter move together, never torn.
    async fn upsert_otp(&self, record: &OtpRecord) -> Result<(), anyhow::Error>;
    async fn find_otp(&self, phone_number: &str) -> Result<Option<OtpRecord>, anyhow::Error>;
    /// Atomically increment and persist the attempt counter. Returns the
    /// post-increment value, or None when no record exists.
    async fn increment_otp_attempts(
        &self,
        phone_number: &str,
    ) -> Result<Option<i32>, anyhow::Error>;

    async fn insert_refresh_token(
        &self,
        record: &RefreshTokenRecord,
    ) -> Result<(), anyhow::Error>;
    /// Claim a live (unrevoked, unexpired) refresh token, marking it
    /// revoked. At most one concurrent caller gets the record back; this
    /// is the serialization point between refresh and logout.
    async fn consume_refresh_token(
        &self,
        jti: &str,
    ) -> Result<Option<RefreshTokenRecord>, anyhow::Error>;
    /// Mark a token revoked. Idempotent; unknown jti is not an error.
    async fn revoke_refresh_token(&self, jti: &str) -> Result<(), anyhow::Error>;

    async fn insert_volunteer(&self, volunteer: &Volunteer) -> Result<(), anyhow::Error>;
    async fn list_volunteers(&self) -> Result<Vec<Volunteer>, anyhow::Error>;
    async fn delete_volunteer(&self, volunteer_id: Uuid) -> Result<bool, anyhow::Error>;
    async fn find_volunteer_by_account(
        &self,
        account_id: Uuid,
    ) -> Result<Option<Volunteer>, anyhow::Error>;
    async fn volunteer_exists_by_phone(&self, phone_number: &str) -> Result<bool, anyhow::Error>;

    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

#[derive(Default)]
struct InMemoryInner {
    accounts: HashMap<Uuid, Account>,
    otps: HashMap<String, OtpRecord>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
    volunteers: HashMap<Uuid, Volunteer>,
}

/// In-memory store used by tests. A single mutex serializes every
/// operation, which trivially satisfies the per-key atomicity contract.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<InMemoryInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryInner>, anyhow::Error> {
        self.inner
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory store mutex poisoned: {}", e))
    }
}

#[async_trait]
impl AuthStore for InMemoryStore {
    async fn insert_account(&self, account: &Account) -> Result<(), anyhow::Error> {
        let mut inner = self.lock()?;
        // Mirror the database constraints.
        if inner
            .accounts
            .values()
            .any(|a| a.username == account.username || a.phone_number == account.phone_number)
        {
            return Err(anyhow::anyhow!("unique constraint violation"));
        }
        inner.accounts.insert(account.account_id, account.clone());
        Ok(())
    }

    async fn find_account_by_phone(
        &self,
        phone_number: &str,
    ) -> Result<Option<Account>, anyhow::Error> {
        let inner = self.lock()?;
        Ok(inner
            .accounts
            .values()
            .find(|a| a.phone_number == phone_number)
            .cloned())
    }

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, anyhow::Error> {
        let inner = self.lock()?;
        Ok(inner
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_account_by_id(
        &self,
        account_id: Uuid,
    ) -> Result<Option<Account>, anyhow::Error> {
        let inner = self.lock()?;
        Ok(inner.accounts.get(&account_id).cloned())
    }

    async fn mark_phone_verified(&self, phone_number: &str) -> Result<u64, anyhow::Error> {
        let mut inner = self.lock()?;
        let mut touched = 0;
        for account in inner.accounts.values_mut() {
            if account.phone_number == phone_number {
                account.verified = true;
                account.updated_at = chrono::Utc::now();
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn upsert_otp(&self, record: &OtpRecord) -> Result<(), anyhow::Error> {
        let mut inner = self.lock()?;
        inner
            .otps
            .insert(record.phone_number.clone(), record.clone());
        Ok(())
    }

    async fn find_otp(&self, phone_number: &str) -> Result<Option<OtpRecord>, anyhow::Error> {
        let inner = self.lock()?;
        Ok(inner.otps.get(phone_number).cloned())
    }

    async fn increment_otp_attempts(
        &self,
        phone_number: &str,
    ) -> Result<Option<i32>, anyhow::Error> {
        let mut inner = self.lock()?;
        Ok(inner.otps.get_mut(phone_number).map(|record| {
            record.attempts += 1;
            record.attempts
        }))
    }

    async fn insert_refresh_token(
        &self,
        record: &RefreshTokenRecord,
    ) -> Result<(), anyhow::Error> {
        let mut inner = self.lock()?;
        inner
            .refresh_tokens
            .insert(record.jti.clone(), record.clone());
        Ok(())
    }

    async fn consume_refresh_token(
        &self,
        jti: &str,
    ) -> Result<Option<RefreshTokenRecord>, anyhow::Error> {
        let mut inner = self.lock()?;
        match inner.refresh_tokens.get_mut(jti) {
            Some(record) if record.is_live() => {
                let claimed = record.clone();
                record.revoked = true;
                Ok(Some(claimed))
            }
            _ => Ok(None),
        }
    }

    async fn revoke_refresh_token(&self, jti: &str) -> Result<(), anyhow::Error> {
        let mut inner = self.lock()?;
        if let Some(record) = inner.refresh_tokens.get_mut(jti) {
            record.revoked = true;
        }
        Ok(())
    }

    async fn insert_volunteer(&self, volunteer: &Volunteer) -> Result<(), anyhow::Error> {
        let mut inner = self.lock()?;
        if inner
            .volunteers
            .values()
            .any(|v| v.account_id == volunteer.account_id)
        {
            return Err(anyhow::anyhow!("unique constraint violation"));
        }
        inner
            .volunteers
            .insert(volunteer.volunteer_id, volunteer.clone());
        Ok(())
    }

    async fn list_volunteers(&self) -> Result<Vec<Volunteer>, anyhow::Error> {
        let inner = self.lock()?;
        let mut volunteers: Vec<Volunteer> = inner.volunteers.values().cloned().collect();
        volunteers.sort_by_key(|v| v.created_at);
        Ok(volunteers)
    }

    async fn delete_volunteer(&self, volunteer_id: Uuid) -> Result<bool, anyhow::Error> {
        let mut inner = self.lock()?;
        Ok(inner.volunteers.remove(&volunteer_id).is_some())
    }

    async fn find_volunteer_by_account(
        &self,
        account_id: Uuid,
    ) -> Result<Option<Volunteer>, anyhow::Error> {
        let inner = self.lock()?;
        Ok(inner
            .volunteers
            .values()
            .find(|v| v.account_id == account_id)
            .cloned())
    }

    async fn volunteer_exists_by_phone(&self, phone_number: &str) -> Result<bool, anyhow::Error> {
        let inner = self.lock()?;
        Ok(inner
            .volunteers
            .values()
            .any(|v| v.phone_number == phone_number))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
