use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::services::error::ServiceError;

/// Claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Account id.
    pub sub: String,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Claims carried by refresh tokens. The `jti` keys the session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Token pair as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// HS256 signer/verifier for access and refresh tokens. Stateless; the
/// session ledger and denylist live elsewhere.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_minutes: i64,
    refresh_token_expiry_days: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_token_expiry_minutes: config.access_token_expiry_minutes,
            refresh_token_expiry_days: config.refresh_token_expiry_days,
        }
    }

    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry_minutes * 60
    }

    pub fn refresh_token_expiry_days(&self) -> i64 {
        self.refresh_token_expiry_days
    }

    pub fn generate_access_token(
        &self,
        account_id: Uuid,
        username: &str,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: account_id.to_string(),
            username: username.to_string(),
            exp: (now + Duration::minutes(self.access_token_expiry_minutes)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Token signing failed: {}", e)))
    }

    /// Returns the signed refresh token together with its `jti`.
    pub fn generate_refresh_token(
        &self,
        account_id: Uuid,
    ) -> Result<(String, String), ServiceError> {
        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();
        let claims = RefreshTokenClaims {
            sub: account_id.to_string(),
            exp: (now + Duration::days(self.refresh_token_expiry_days)).timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Token signing failed: {}", e)))?;
        Ok((token, jti))
    }

    /// Issue an access/refresh pair. Returns the response body and the
    /// refresh token's `jti` so the caller can persist the session.
    pub fn generate_token_pair(
        &self,
        account_id: Uuid,
        username: &str,
    ) -> Result<(TokenResponse, String), ServiceError> {
        let access_token = self.generate_access_token(account_id, username)?;
        let (refresh_token, jti) = self.generate_refresh_token(account_id)?;

        Ok((
            TokenResponse {
                access_token,
                refresh_token,
                token_type: "Bearer".to_string(),
                expires_in: self.access_token_expiry_seconds(),
            },
            jti,
        ))
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, ServiceError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| ServiceError::TokenInvalid)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshTokenClaims, ServiceError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<RefreshTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| ServiceError::TokenInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "test-secret-key-that-is-long-enough!".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        })
    }

    #[test]
    fn access_token_round_trips() {
        let service = test_service();
        let account_id = Uuid::new_v4();

        let token = service.generate_access_token(account_id, "asha").unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, account_id.to_string());
        assert_eq!(claims.username, "asha");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_jti_matches_embedded_claim() {
        let service = test_service();

        let (token, jti) = service.generate_refresh_token(Uuid::new_v4()).unwrap();
        let claims = service.validate_refresh_token(&token).unwrap();

        assert_eq!(claims.jti, jti);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = test_service();
        let token = service
            .generate_access_token(Uuid::new_v4(), "asha")
            .unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });

        assert!(matches!(
            service.validate_access_token(&tampered),
            Err(ServiceError::TokenInvalid)
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let service = test_service();
        let other = JwtService::new(&JwtConfig {
            secret: "another-secret-key-that-is-long-enough".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        });

        let token = service
            .generate_access_token(Uuid::new_v4(), "asha")
            .unwrap();
        assert!(other.validate_access_token(&token).is_err());
    }

    #[test]
    fn pair_reports_access_expiry_seconds() {
        let service = test_service();
        let (response, _jti) = service
            .generate_token_pair(Uuid::new_v4(), "asha")
            .unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 15 * 60);
        assert_ne!(response.access_token, response.refresh_token);
    }
}
