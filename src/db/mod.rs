//! Database module for the microblog server
//!
//! The `UserStore` trait is the system of record for accounts; the
//! Postgres store backs deployments and the in-memory store backs tests.

pub mod memory;
pub mod models;
pub mod operations;
pub mod store;

pub use memory::MemoryUserStore;
pub use models::{ProfileUpdate, User};
pub use operations::PgUserStore;
pub use store::UserStore;
