//! Account model - phone-number-keyed identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account entity.
///
/// `phone_number` and `username` are globally unique; the migration
/// carries the constraints and the store pre-checks them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub account_id: Uuid,
    pub name: String,
    pub username: String,
    pub phone_number: String,
    pub password_hash: String,
    pub verified: bool,
    pub active: bool,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new unverified account. Verification happens via OTP only.
    pub fn new(name: String, username: String, phone_number: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            account_id: Uuid::new_v4(),
            name,
            username,
            phone_number,
            password_hash,
            verified: false,
            active: true,
            is_staff: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Administrative creation path: verified, active, and staff from the start.
    pub fn new_admin(
        name: String,
        username: String,
        phone_number: String,
        password_hash: String,
    ) -> Self {
        Self {
            verified: true,
            is_staff: true,
            ..Self::new(name, username, phone_number, password_hash)
        }
    }

    /// Convert to a response without sensitive fields.
    pub fn sanitized(&self) -> AccountResponse {
        AccountResponse {
            account_id: self.account_id,
            name: self.name.clone(),
            username: self.username.clone(),
            phone_number: self.phone_number.clone(),
            verified: self.verified,
        }
    }
}

/// Account summary for API responses (no password hash).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account_id: Uuid,
    pub name: String,
    pub username: String,
    pub phone_number: String,
    pub verified: bool,
}
