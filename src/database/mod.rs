mod database;
pub mod models;

pub use database::{Database, DatabaseError};
