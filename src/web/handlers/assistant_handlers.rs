// src/web/handlers/assistant_handlers.rs
use crate::assistant::JobAssistant;
use crate::web::types::*;

use rocket::serde::json::Json;
use rocket::State;
use tracing::info;
use uuid::Uuid;

pub async fn chat_handler(
    request: Json<StandardRequest<ChatRequest>>,
    assistant: &State<JobAssistant>,
) -> ApiResult<DataResponse<ChatData>> {
    let conversation_id = request
        .conversation_id()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!(
        "Chat message in conversation {} (labourer: {:?})",
        conversation_id, request.data.labourer_id
    );

    let reply = assistant
        .respond(&request.data.message, request.data.labourer_id)
        .await;

    Ok(Json(DataResponse::success(
        format!("{} assistant messages", reply.messages.len()),
        reply,
        Some(conversation_id),
    )))
}

pub async fn interpret_handler(
    text: String,
    assistant: &State<JobAssistant>,
) -> ApiResult<DataResponse<InterpretData>> {
    let query = assistant.interpreter().extract(&text);
    let skill_filter = query.skill_filter();
    let message = if query.is_empty() {
        "No skills or location recognised".to_string()
    } else {
        format!(
            "Recognised {} skill(s){}",
            query.skills.len(),
            query
                .location
                .as_deref()
                .map(|l| format!(" in {}", l))
                .unwrap_or_default()
        )
    };

    Ok(Json(DataResponse::success(
        message,
        InterpretData {
            text,
            query,
            skill_filter,
        },
        None,
    )))
}
