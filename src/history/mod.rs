//! Download history persistence

pub mod schema;
pub mod store;

// Re-export for convenience
pub use schema::initialize_database;
pub use store::{HistoryRecord, HistoryStore};
