//! Error handling, configuration and filename utilities

pub mod config;
pub mod error;
pub mod sanitize;

// Re-export for convenience
pub use config::ServiceConfig;
pub use error::MediaForgeError;
pub use sanitize::sanitize_filename;
