use axum::{extract::State, Json};
use log::debug;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ApiError, ApiMessage, AppState, AuthUser};
use crate::database::models::ChatEntry;
use crate::llm::{build_prompt, rank_by_similarity};

#[derive(Deserialize, Validate)]
pub struct QuestionRequest {
    #[validate(length(min = 1, max = 4000))]
    query: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    response: String,
    source_document: String,
}

/// Embed the question, rank stored documents by cosine similarity, prompt the
/// model with the winners, and append the exchange to the caller's history.
pub async fn ask(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let question = request.query.trim();
    if question.is_empty() {
        return Err(ApiError::Validation("Question cannot be empty.".to_string()));
    }

    let query_embedding = state.model.embed(question).await?;

    let documents = state.db.documents_with_embeddings().await?;
    let candidates: Vec<((String, String), Vec<f32>)> = documents
        .into_iter()
        .map(|d| ((d.file_name, d.raw_text), d.embedding))
        .collect();

    let ranked = rank_by_similarity(&query_embedding, candidates)?;
    for r in &ranked {
        debug!("relevant document '{}' (similarity {:.4})", r.item.0, r.similarity);
    }

    let source_document = if ranked.is_empty() {
        "None".to_string()
    } else {
        ranked
            .iter()
            .map(|r| r.item.0.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let context: Vec<(String, String)> = ranked.into_iter().map(|r| r.item).collect();
    let prompt = build_prompt(&context, question);

    let reply = state.model.ask(&prompt).await?;

    state
        .db
        .insert_chat_entry(
            claims.sub.clone(),
            question.to_string(),
            reply.answer.clone(),
            source_document.clone(),
        )
        .await?;

    Ok(Json(AskResponse {
        response: reply.answer,
        source_document,
    }))
}

pub async fn history(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<ChatEntry>>, ApiError> {
    Ok(Json(state.db.chat_history(&claims.sub).await?))
}

pub async fn clear(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiMessage>, ApiError> {
    if !claims.is_admin() {
        return Err(ApiError::Forbidden(
            "You do not have permission to clear chat history.".to_string(),
        ));
    }

    state.db.clear_chat_history().await?;

    Ok(Json(ApiMessage {
        message: "Chat history cleared.".to_string(),
    }))
}
