//! Corona Shop Core - Shared types library.
//!
//! This crate provides common types used across all Corona Shop components:
//! - `api` - REST backend (catalog, categories, users, orders)
//! - `storefront` - Server-rendered shop front that talks to the API
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, roles, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
