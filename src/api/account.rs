use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ApiError, ApiMessage, AppState, AuthUser};
use crate::database::models::UserDto;

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    username: String,
    #[validate(length(min = 1, max = 128))]
    password: String,
    #[serde(default)]
    is_admin: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePermissionsRequest {
    can_view_documents: bool,
    can_upload_documents: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    token: String,
    message: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let token = state
        .auth
        .register(&request.username, &request.password, request.is_admin)
        .await?;

    Ok(Json(TokenResponse {
        token,
        message: "Registration successful.".to_string(),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.auth.login(&request.username, &request.password).await?;

    Ok(Json(TokenResponse {
        token,
        message: "Login successful.".to_string(),
    }))
}

pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    if !claims.is_admin() {
        return Err(ApiError::Forbidden(
            "You do not have permission to manage users.".to_string(),
        ));
    }

    Ok(Json(state.auth.list_users().await?))
}

pub async fn update_permissions(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(user_id): Path<String>,
    Json(request): Json<UpdatePermissionsRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    if !claims.is_admin() {
        return Err(ApiError::Forbidden(
            "You do not have permission to manage users.".to_string(),
        ));
    }

    let updated = state
        .auth
        .update_permissions(
            &user_id,
            request.can_view_documents,
            request.can_upload_documents,
        )
        .await?;

    if !updated {
        return Err(ApiError::NotFound("User not found.".to_string()));
    }

    Ok(Json(ApiMessage {
        message: "User permissions updated successfully.".to_string(),
    }))
}
