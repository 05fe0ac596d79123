//! Past-conversation playback endpoints
//!
//! Read-only views over the conversation provider's stored history, for the
//! teacher dashboard.

use crate::api::ExtractUser;
use crate::error::AppError;
use crate::infrastructure::traits::{ConversationDetail, ConversationProvider};
use axum::extract::{Path, Query};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;
use serde::Deserialize;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_conversations))
        .route("/:id", get(get_conversation))
        .route("/:id/audio", get(get_conversation_audio))
}

#[derive(Deserialize, Debug)]
struct ListQuery {
    agent_id: String,
}

async fn list_conversations(
    Inject(provider): Inject<dyn ConversationProvider>,
    ExtractUser(_current_user): ExtractUser,
    Query(query): Query<ListQuery>,
) -> Result<(StatusCode, Json<schemas::ConversationList>), AppError> {
    let conversations = provider.list_conversations(&query.agent_id).await?;

    Ok((
        StatusCode::OK,
        Json(schemas::ConversationList { conversations }),
    ))
}

async fn get_conversation(
    Inject(provider): Inject<dyn ConversationProvider>,
    ExtractUser(_current_user): ExtractUser,
    Path(conversation_id): Path<String>,
) -> Result<(StatusCode, Json<ConversationDetail>), AppError> {
    let conversation = provider.get_conversation(&conversation_id).await?;
    Ok((StatusCode::OK, Json(conversation)))
}

async fn get_conversation_audio(
    Inject(provider): Inject<dyn ConversationProvider>,
    ExtractUser(_current_user): ExtractUser,
    Path(conversation_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let audio = provider.conversation_audio(&conversation_id).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        audio,
    ))
}

pub mod schemas {
    use crate::infrastructure::traits::ConversationSummary;
    use serde::Serialize;

    #[derive(Serialize, Debug)]
    pub struct ConversationList {
        pub conversations: Vec<ConversationSummary>,
    }
}
