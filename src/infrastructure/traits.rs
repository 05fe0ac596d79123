//! Infrastructure traits, used for DI on higher levels.
//!
//! Repositories wrap the database; the remaining traits are the public
//! contracts of external collaborators (generation backend, hosted object
//! storage, conversation provider).

use crate::error::AppError;
use crate::infrastructure::entities;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

#[async_trait]
pub trait TeacherRepository: Send + Sync {
    async fn get_teacher(&self, teacher_id: Uuid) -> Result<Option<entities::Teacher>, AppError>;

    /// Inserts a new teacher row. Fails if one already exists for this id.
    async fn create_teacher(
        &self,
        teacher: entities::Teacher,
    ) -> Result<entities::Teacher, AppError>;

    /// Returns `Err(NotFound)` if no teacher row was updated.
    async fn set_teacher_language(
        &self,
        teacher_id: Uuid,
        language_id: Uuid,
    ) -> Result<(), AppError>;

    async fn list_languages(&self) -> Result<Vec<entities::Language>, AppError>;

    async fn get_language(&self, language_id: Uuid)
        -> Result<Option<entities::Language>, AppError>;
}

#[async_trait]
pub trait RoleplayRepository: Send + Sync {
    async fn list_roleplays(&self, owner_id: Uuid) -> Result<Vec<entities::Roleplay>, AppError>;

    async fn create_roleplay(
        &self,
        roleplay: entities::Roleplay,
    ) -> Result<entities::Roleplay, AppError>;

    async fn get_roleplay(
        &self,
        owner_id: Uuid,
        roleplay_id: Uuid,
    ) -> Result<Option<entities::Roleplay>, AppError>;

    async fn get_roleplay_by_code(
        &self,
        code: &str,
    ) -> Result<Option<entities::Roleplay>, AppError>;

    async fn set_roleplay_agent(&self, roleplay_id: Uuid, agent_id: &str)
        -> Result<(), AppError>;
}

/// Hosted object storage bucket. Paths are bucket-relative.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn download(&self, path: &str) -> Result<Vec<u8>, AppError>;

    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), AppError>;

    async fn remove(&self, path: &str) -> Result<(), AppError>;

    /// Time-limited signed read URL, resolved by the storage service.
    async fn signed_url(&self, path: &str, expires_in: Duration) -> Result<String, AppError>;
}

/// Result of a preview generation: the agent's opening line and the path of
/// the generated image inside the scratch preview area.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewAssets {
    pub first_prompt: String,
    pub image_path: String,
}

/// The separate backend service that generates descriptions, images, and
/// conversational agents.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn description(&self, roleplay_name: &str, language: &str) -> Result<String, AppError>;

    async fn preview_image(
        &self,
        teacher_id: Uuid,
        roleplay_name: &str,
        roleplay_scenario: &str,
        language: &str,
    ) -> Result<PreviewAssets, AppError>;

    /// Best-effort bulk delete of a teacher's scratch preview objects.
    async fn delete_previews(&self, teacher_id: Uuid) -> Result<(), AppError>;

    /// Provisions a conversational agent and returns its identifier.
    async fn create_agent(
        &self,
        roleplay_name: &str,
        roleplay_scenario: &str,
        language_code: &str,
        first_prompt: &str,
    ) -> Result<String, AppError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub agent_id: String,
    pub agent_name: Option<String>,
    pub start_time_unix_secs: i64,
    pub call_duration_secs: i64,
    pub message_count: i64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDetail {
    pub conversation_id: String,
    pub transcript: Vec<TranscriptEntry>,
}

/// Past conversations stored by the conversation provider; read-only here.
#[async_trait]
pub trait ConversationProvider: Send + Sync {
    async fn list_conversations(
        &self,
        agent_id: &str,
    ) -> Result<Vec<ConversationSummary>, AppError>;

    async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationDetail, AppError>;

    async fn conversation_audio(&self, conversation_id: &str) -> Result<Vec<u8>, AppError>;
}

/// Event emitted by an open realtime session with the provider.
#[derive(Debug, Clone)]
pub enum VoiceEvent {
    Connected,
    /// One conversation turn. `source` is the provider's reported origin,
    /// `"ai"` for the agent.
    Message { source: String, text: String },
    /// Surfaced to the listener; does not end the session.
    Error { message: String },
    Disconnected,
}

/// An open realtime link. Dropping `close` (or sending on it) asks the
/// provider side to shut the connection down.
pub struct VoiceConnection {
    pub events: mpsc::Receiver<VoiceEvent>,
    pub close: mpsc::Sender<()>,
}

/// Opens realtime voice sessions with the conversation provider.
#[async_trait]
pub trait VoiceLink: Send + Sync {
    async fn open(&self, agent_id: &str) -> Result<VoiceConnection, AppError>;
}
