//! Business logic services for the shop API.
//!
//! # Services
//!
//! - `auth` - Account registration, sign-in and profile changes

pub mod auth;
