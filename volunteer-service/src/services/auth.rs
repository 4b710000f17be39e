use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::{Account, RefreshTokenRecord, Volunteer};
use crate::services::error::ServiceError;
use crate::services::{AuthStore, JwtService, TokenDenylist, TokenResponse};
use crate::utils::password;

/// What happened on a registration call. Repeat registration of a
/// verified phone number is an acknowledged no-op, not an error.
pub enum RegisterOutcome {
    Created(Account),
    AlreadyRegistered,
}

/// Account lifecycle and session management: registration, login,
/// refresh rotation, and logout revocation.
pub struct AuthService {
    store: Arc<dyn AuthStore>,
    denylist: Arc<dyn TokenDenylist>,
    jwt: Arc<JwtService>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn AuthStore>,
        denylist: Arc<dyn TokenDenylist>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            store,
            denylist,
            jwt,
        }
    }

    /// Register an account against a phone number. The account starts
    /// unverified; only OTP verification flips it.
    #[instrument(skip(self, raw_password))]
    pub async fn register(
        &self,
        name: &str,
        username: &str,
        phone_number: &str,
        raw_password: &str,
    ) -> Result<RegisterOutcome, ServiceError> {
        if let Some(existing) = self
            .store
            .find_account_by_phone(phone_number)
            .await
            .map_err(ServiceError::Store)?
        {
            if existing.verified {
                return Ok(RegisterOutcome::AlreadyRegistered);
            }
            return Err(ServiceError::NotVerified);
        }

        if self
            .store
            .find_account_by_username(username)
            .await
            .map_err(ServiceError::Store)?
            .is_some()
        {
            return Err(ServiceError::UsernameTaken);
        }

        let password_hash = password::hash_password(raw_password)?;
        let account = Account::new(
            name.to_string(),
            username.to_string(),
            phone_number.to_string(),
            password_hash,
        );
        self.store
            .insert_account(&account)
            .await
            .map_err(ServiceError::Store)?;

        info!(account_id = %account.account_id, "Account registered");
        Ok(RegisterOutcome::Created(account))
    }

    /// Authenticate and issue a token pair. Unknown username and wrong
    /// password are indistinguishable to the caller.
    #[instrument(skip(self, raw_password))]
    pub async fn login(
        &self,
        username: &str,
        raw_password: &str,
    ) -> Result<(TokenResponse, Account), ServiceError> {
        let account = self
            .store
            .find_account_by_username(username)
            .await
            .map_err(ServiceError::Store)?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !password::verify_password(raw_password, &account.password_hash)? {
            warn!(username = %username, "Login with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        if !account.active {
            return Err(ServiceError::InvalidCredentials);
        }

        let tokens = self.issue_session(&account).await?;
        Ok((tokens, account))
    }

    /// Rotate a refresh token: the presented token is consumed and a
    /// fresh pair is issued. A consumed, revoked, expired, or unknown
    /// token loses here, whichever way the race went.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ServiceError> {
        let claims = self.jwt.validate_refresh_token(refresh_token)?;

        if self
            .denylist
            .is_revoked(&claims.jti)
            .await
            .map_err(ServiceError::Internal)?
        {
            return Err(ServiceError::TokenInvalid);
        }

        let record = self
            .store
            .consume_refresh_token(&claims.jti)
            .await
            .map_err(ServiceError::Store)?
            .ok_or(ServiceError::TokenInvalid)?;

        if record.token_hash != RefreshTokenRecord::hash_token(refresh_token) {
            return Err(ServiceError::TokenInvalid);
        }

        let account_id = Uuid::parse_str(&claims.sub).map_err(|_| ServiceError::TokenInvalid)?;
        let account = self
            .store
            .find_account_by_id(account_id)
            .await
            .map_err(ServiceError::Store)?
            .ok_or(ServiceError::TokenInvalid)?;

        // Shadow the consumed token for its remaining lifetime.
        self.denylist
            .revoke(&claims.jti, record.remaining_seconds())
            .await
            .map_err(ServiceError::Internal)?;

        self.issue_session(&account).await
    }

    /// Revoke a refresh token. Idempotent: logging out an already
    /// revoked session succeeds.
    #[instrument(skip(self, refresh_token))]
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<(), ServiceError> {
        let token = match refresh_token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(ServiceError::MissingToken),
        };

        let claims = self.jwt.validate_refresh_token(token)?;

        self.store
            .revoke_refresh_token(&claims.jti)
            .await
            .map_err(ServiceError::Store)?;

        let remaining = (claims.exp - Utc::now().timestamp()).max(0);
        self.denylist
            .revoke(&claims.jti, remaining)
            .await
            .map_err(ServiceError::Internal)?;

        info!(jti = %claims.jti, "Session revoked");
        Ok(())
    }

    /// Attach a volunteer profile to an existing verified account.
    /// Accounts are never created here; registration is a separate step.
    #[instrument(skip(self))]
    pub async fn attach_volunteer(
        &self,
        account_id: Uuid,
        location: String,
        availability: bool,
        task: Option<String>,
    ) -> Result<Volunteer, ServiceError> {
        let account = self
            .store
            .find_account_by_id(account_id)
            .await
            .map_err(ServiceError::Store)?
            .ok_or(ServiceError::AccountNotFound)?;

        if !account.verified {
            return Err(ServiceError::NotVerified);
        }

        if self
            .store
            .find_volunteer_by_account(account_id)
            .await
            .map_err(ServiceError::Store)?
            .is_some()
        {
            return Err(ServiceError::VolunteerExists);
        }

        let volunteer = Volunteer::attach(
            account_id,
            account.name,
            account.phone_number,
            location,
            availability,
            task,
        );
        self.store
            .insert_volunteer(&volunteer)
            .await
            .map_err(ServiceError::Store)?;

        info!(volunteer_id = %volunteer.volunteer_id, "Volunteer attached");
        Ok(volunteer)
    }

    async fn issue_session(&self, account: &Account) -> Result<TokenResponse, ServiceError> {
        let (response, jti) = self
            .jwt
            .generate_token_pair(account.account_id, &account.username)?;

        let record = RefreshTokenRecord::new(
            jti,
            account.account_id,
            &response.refresh_token,
            self.jwt.refresh_token_expiry_days(),
        );
        self.store
            .insert_refresh_token(&record)
            .await
            .map_err(ServiceError::Store)?;

        Ok(response)
    }
}
