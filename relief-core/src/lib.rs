//! relief-core: shared infrastructure for the volunteer coordination services.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
