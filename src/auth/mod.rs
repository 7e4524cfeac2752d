pub mod jwt;
pub mod password;
mod service;

pub use jwt::{extract_bearer_token, Claims};
pub use service::AuthService;

use thiserror::Error;

use crate::database::DatabaseError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("Username is already taken.")]
    UsernameTaken,
    #[error("{0}")]
    Validation(String),
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token expired")]
    TokenExpired,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}
