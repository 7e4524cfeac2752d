use chrono::{DateTime, Utc};
use serde::Serialize;

pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_USER: &str = "User";

/// A registered account. The password hash never leaves the auth layer.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub can_view_documents: bool,
    pub can_upload_documents: bool,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Admin-facing view of a user, without credentials.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub role: String,
    pub can_view_documents: bool,
    pub can_upload_documents: bool,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            can_view_documents: user.can_view_documents,
            can_upload_documents: user.can_upload_documents,
        }
    }
}

/// Listing view of a stored document. Raw text and the embedding stay server-side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: i64,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A document that already has its vector computed, loaded for ranking.
#[derive(Debug, Clone)]
pub struct EmbeddedDocument {
    pub id: i64,
    pub file_name: String,
    pub raw_text: String,
    pub embedding: Vec<f32>,
}

/// One question/answer exchange. Never mutated after insertion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    pub id: i64,
    pub user_id: String,
    pub question: String,
    pub answer: String,
    pub source_document: String,
    pub timestamp: DateTime<Utc>,
}
