pub mod auth;
pub mod otp;
pub mod volunteer;
