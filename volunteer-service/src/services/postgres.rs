use async_trait::async_trait;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::models::{Account, OtpRecord, RefreshTokenRecord, Volunteer};
use crate::services::AuthStore;

/// Postgres-backed store. Per-key atomicity comes from single-statement
/// upserts and conditional updates; no explicit transactions are needed
/// in the core paths.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AuthStore for PgStore {
    async fn insert_account(&self, account: &Account) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO accounts
                (account_id, name, username, phone_number, password_hash,
                 verified, active, is_staff, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(account.account_id)
        .bind(&account.name)
        .bind(&account.username)
        .bind(&account.phone_number)
        .bind(&account.password_hash)
        .bind(account.verified)
        .bind(account.active)
        .bind(account.is_staff)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_account_by_phone(
        &self,
        phone_number: &str,
    ) -> Result<Option<Account>, anyhow::Error> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE phone_number = $1",
        )
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, anyhow::Error> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_account_by_id(
        &self,
        account_id: Uuid,
    ) -> Result<Option<Account>, anyhow::Error> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE account_id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn mark_phone_verified(&self, phone_number: &str) -> Result<u64, anyhow::Error> {
        let result = sqlx::query(
            "UPDATE accounts SET verified = TRUE, updated_at = now() WHERE phone_number = $1",
        )
        .bind(phone_number)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn upsert_otp(&self, record: &OtpRecord) -> Result<(), anyhow::Error> {
        // Code, timestamps and attempts replace together; no torn state.
        sqlx::query(
            r#"
            INSERT INTO otp_codes (phone_number, code, created_at, expires_at, attempts)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (phone_number) DO UPDATE SET
                code = EXCLUDED.code,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at,
                attempts = EXCLUDED.attempts
            "#,
        )
        .bind(&record.phone_number)
        .bind(&record.code)
        .bind(record.created_at)
        .bind(record.expires_at)
        .bind(record.attempts)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_otp(&self, phone_number: &str) -> Result<Option<OtpRecord>, anyhow::Error> {
        let record =
            sqlx::query_as::<_, OtpRecord>("SELECT * FROM otp_codes WHERE phone_number = $1")
                .bind(phone_number)
                .fetch_optional(&self.pool)
                .await?;
        Ok(record)
    }

    async fn increment_otp_attempts(
        &self,
        phone_number: &str,
    ) -> Result<Option<i32>, anyhow::Error> {
        let attempts: Option<i32> = sqlx::query_scalar(
            "UPDATE otp_codes SET attempts = attempts + 1 WHERE phone_number = $1 RETURNING attempts",
        )
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempts)
    }

    async fn insert_refresh_token(
        &self,
        record: &RefreshTokenRecord,
    ) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens
                (jti, account_id, token_hash, expires_at, created_at, revoked)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&record.jti)
        .bind(record.account_id)
        .bind(&record.token_hash)
        .bind(record.expires_at)
        .bind(record.created_at)
        .bind(record.revoked)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_refresh_token(
        &self,
        jti: &str,
    ) -> Result<Option<RefreshTokenRecord>, anyhow::Error> {
        // Conditional update: only one concurrent caller claims the row.
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE jti = $1 AND revoked = FALSE AND expires_at > now()
            RETURNING jti, account_id, token_hash, expires_at, created_at, FALSE AS revoked
            "#,
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn revoke_refresh_token(&self, jti: &str) -> Result<(), anyhow::Error> {
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = $1")
            .bind(jti)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_volunteer(&self, volunteer: &Volunteer) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO volunteers
                (volunteer_id, account_id, name, phone_number, location,
                 availability, task, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(volunteer.volunteer_id)
        .bind(volunteer.account_id)
        .bind(&volunteer.name)
        .bind(&volunteer.phone_number)
        .bind(&volunteer.location)
        .bind(volunteer.availability)
        .bind(&volunteer.task)
        .bind(volunteer.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_volunteers(&self) -> Result<Vec<Volunteer>, anyhow::Error> {
        let volunteers =
            sqlx::query_as::<_, Volunteer>("SELECT * FROM volunteers ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;
        Ok(volunteers)
    }

    async fn delete_volunteer(&self, volunteer_id: Uuid) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("DELETE FROM volunteers WHERE volunteer_id = $1")
            .bind(volunteer_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_volunteer_by_account(
        &self,
        account_id: Uuid,
    ) -> Result<Option<Volunteer>, anyhow::Error> {
        let volunteer =
            sqlx::query_as::<_, Volunteer>("SELECT * FROM volunteers WHERE account_id = $1")
                .bind(account_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(volunteer)
    }

    async fn volunteer_exists_by_phone(&self, phone_number: &str) -> Result<bool, anyhow::Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM volunteers WHERE phone_number = $1)",
        )
        .bind(phone_number)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        crate::db::health_check(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Postgres health check failed: {}", e))
    }
}
