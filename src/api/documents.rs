use std::path::Path as FilePath;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use log::warn;
use serde::Serialize;
use uuid::Uuid;

use super::{ApiError, AppState, AuthUser};
use crate::database::models::DocumentSummary;
use crate::extract::{extract_text, ExtractError};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    message: String,
    document_id: i64,
    file_name: String,
}

pub async fn list_documents(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<DocumentSummary>>, ApiError> {
    if !claims.can_view() {
        return Err(ApiError::Forbidden(
            "You do not have permission to view documents.".to_string(),
        ));
    }

    Ok(Json(state.db.list_documents().await?))
}

pub async fn get_document(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<DocumentSummary>, ApiError> {
    if !claims.can_view() {
        return Err(ApiError::Forbidden(
            "You do not have permission to view documents.".to_string(),
        ));
    }

    // Raw text and the embedding deliberately stay out of the response.
    state
        .db
        .get_document(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Document not found.".to_string()))
}

pub async fn delete_document(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !claims.is_admin() {
        return Err(ApiError::Forbidden(
            "You do not have permission to delete documents.".to_string(),
        ));
    }

    if !state.db.delete_document(id).await? {
        return Err(ApiError::NotFound("Document not found.".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Multipart upload: stage the file, extract its text, embed it, persist all
/// three, and keep a copy of the original under the upload directory.
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    if !claims.can_upload() {
        return Err(ApiError::Forbidden(
            "You do not have permission to upload documents.".to_string(),
        ));
    }

    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.file_name().is_some() {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read upload: {}", e)))?;
            file = Some((file_name, data));
            break;
        }
    }

    let (file_name, data) = file.ok_or_else(|| ApiError::Validation("Invalid file.".to_string()))?;
    // Client-supplied names are reduced to their final component before any
    // path is built from them.
    let file_name = FilePath::new(&file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    if file_name.is_empty() || data.is_empty() {
        return Err(ApiError::Validation("Invalid file.".to_string()));
    }

    let extracted = extract_staged(&file_name, &data).await?;

    let embedding = if extracted.trim().is_empty() {
        None
    } else {
        Some(state.model.embed(&extracted).await?)
    };

    // Keep the original alongside the extracted text; same name overwrites.
    let permanent_path = state.upload_dir.join(&file_name);
    if let Err(e) = tokio::fs::write(&permanent_path, &data).await {
        warn!("Failed to keep original upload {}: {}", file_name, e);
    }

    let document_id = state
        .db
        .insert_document(file_name.clone(), extracted, embedding.as_deref())
        .await?;

    Ok(Json(UploadResponse {
        message: "File uploaded, text extracted, and embedding generated successfully.".to_string(),
        document_id,
        file_name,
    }))
}

/// Write the upload to a uniquely named temp file, extract on the blocking
/// pool, and always remove the temp file afterwards.
async fn extract_staged(file_name: &str, data: &[u8]) -> Result<String, ApiError> {
    let extension = FilePath::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    let temp_path = std::env::temp_dir().join(format!("{}{}", Uuid::new_v4(), extension));

    tokio::fs::write(&temp_path, data)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to stage upload: {}", e)))?;

    let extract_path = temp_path.clone();
    let result = tokio::task::spawn_blocking(move || extract_text(&extract_path)).await;

    if let Err(e) = tokio::fs::remove_file(&temp_path).await {
        warn!("Failed to remove temp file {}: {}", temp_path.display(), e);
    }

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e @ ExtractError::Unsupported(_))) => Err(ApiError::Validation(e.to_string())),
        Ok(Err(e)) => Err(ApiError::Internal(format!("Upload failed: {}", e))),
        Err(e) => Err(ApiError::Internal(format!("extraction task failed: {}", e))),
    }
}
