//! Volunteer record attached to an existing account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Volunteer {
    pub volunteer_id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub location: String,
    pub availability: bool,
    pub task: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Volunteer {
    /// Attach a volunteer record to an account. Name and phone come from
    /// the account; no account is ever created here.
    pub fn attach(
        account_id: Uuid,
        name: String,
        phone_number: String,
        location: String,
        availability: bool,
        task: Option<String>,
    ) -> Self {
        Self {
            volunteer_id: Uuid::new_v4(),
            account_id,
            name,
            phone_number,
            location,
            availability,
            task,
            created_at: Utc::now(),
        }
    }
}
