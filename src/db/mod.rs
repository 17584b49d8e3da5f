//! Database module for the relay.
//!
//! Provides the SQLite-backed option store.

mod models;
mod store;

pub use models::*;
pub use store::*;
