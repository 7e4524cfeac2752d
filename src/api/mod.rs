pub mod account;
pub mod chat;
pub mod documents;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{DefaultBodyLimit, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{extract_bearer_token, AuthError, AuthService, Claims};
use crate::database::{Database, DatabaseError};
use crate::llm::RetrievalError;
use crate::providers::{LanguageModel, ProviderError};

/// Large enough for document uploads, small enough to bound memory per request.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub model: Arc<dyn LanguageModel>,
    pub auth: Arc<AuthService>,
    pub upload_dir: PathBuf,
}

#[derive(Serialize)]
pub struct ApiMessage {
    pub message: String,
}

/// Request failure categories, mapped onto status codes at the response boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Upstream(#[from] ProviderError),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Database(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("request failed: {}", self);
        }
        (
            status,
            Json(ApiMessage {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::InvalidToken(_) | AuthError::TokenExpired => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::UsernameTaken | AuthError::Validation(_) => {
                ApiError::Validation(err.to_string())
            }
            AuthError::Hash(_) => ApiError::Internal(err.to_string()),
            AuthError::Database(e) => ApiError::Database(e),
        }
    }
}

impl From<RetrievalError> for ApiError {
    fn from(err: RetrievalError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Validated claims of the calling user, pulled from the bearer token.
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let token = extract_bearer_token(header_value)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token.".to_string()))?;

        let claims = state.auth.validate_token(token)?;
        Ok(AuthUser(claims))
    }
}

/// Build the application router.
pub fn create_api(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/account/register", post(account::register))
        .route("/api/account/login", post(account::login))
        .route("/api/account/users", get(account::list_users))
        .route("/api/account/permissions/:user_id", put(account::update_permissions))
        .route("/api/documents", get(documents::list_documents))
        .route("/api/documents/upload", post(documents::upload))
        .route(
            "/api/documents/:id",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route("/api/chat/ask", post(chat::ask))
        .route("/api/chat/history", get(chat::history))
        .route("/api/chat/clear", delete(chat::clear))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "Server is running and healthy" }))
}
