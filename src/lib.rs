pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod extract;
pub mod llm;
pub mod providers;

// Re-export commonly used items
pub use api::{create_api, AppState};
pub use config::Config;
pub use database::Database;
