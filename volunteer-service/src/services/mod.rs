//! Services layer: authentication, OTP lifecycle, session management,
//! and the storage/delivery capabilities they depend on.

mod auth;
mod denylist;
pub mod error;
mod jwt;
mod otp;
mod postgres;
mod sms;
mod store;

pub use auth::{AuthService, RegisterOutcome};
pub use denylist::{MockDenylist, RedisDenylist, TokenDenylist};
pub use error::ServiceError;
pub use jwt::{AccessTokenClaims, JwtService, RefreshTokenClaims, TokenResponse};
pub use otp::{OtpService, OTP_CODE_LENGTH, OTP_MAX_ATTEMPTS};
pub use postgres::PgStore;
pub use sms::{ConsoleSms, HttpSms, MockSms, SmsProvider};
pub use store::{AuthStore, InMemoryStore};
