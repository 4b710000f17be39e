pub mod account;
pub mod otp;
pub mod refresh_token;
pub mod volunteer;

pub use account::{Account, AccountResponse};
pub use otp::OtpRecord;
pub use refresh_token::RefreshTokenRecord;
pub use volunteer::Volunteer;
