//! Domain models for the shop API.
//!
//! These types are what handlers serialize to clients. Database row types
//! live next to the queries in [`crate::db`] and convert into these.

pub mod category;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use category::{Category, CategorySummary};
pub use order::{Order, OrderLine};
pub use product::{Photo, Product};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{HistoryEntry, User};
