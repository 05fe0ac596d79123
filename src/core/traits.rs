//! DI "Interfaces"

use crate::core::voice::VoiceSession;
use crate::error::AppError;
use crate::infrastructure::entities;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// A generated-but-not-yet-committed preview for a roleplay under creation.
#[derive(Debug, Clone)]
pub struct RoleplayPreview {
    pub first_prompt: String,
    pub image_path: Option<String>,
    /// Time-limited signed URL for displaying the preview image.
    pub image_url: Option<String>,
}

/// A roleplay as loaded for a student, with the stored image resolved to a
/// signed URL.
#[derive(Debug, Clone)]
pub struct StudentRoleplay {
    pub roleplay: entities::Roleplay,
    pub image_url: Option<String>,
}

#[async_trait]
pub trait RoleplayService: Send + Sync {
    /// Lists the teacher's roleplays, newest first.
    async fn list_roleplays(&self, teacher_id: Uuid) -> Result<Vec<entities::Roleplay>, AppError>;

    /// Asks the generation backend for a scenario description.
    ///
    /// Requires a non-empty name and an onboarded teacher language.
    async fn generate_description(&self, teacher_id: Uuid, name: &str)
        -> Result<String, AppError>;

    /// Generates an opening prompt and a scratch-area image for the given
    /// name and scenario, and records them as the teacher's current preview
    /// draft. Publishing is only possible against a matching draft.
    async fn generate_preview(
        &self,
        teacher_id: Uuid,
        name: &str,
        scenario: &str,
    ) -> Result<RoleplayPreview, AppError>;

    /// Commits a previewed roleplay: promotes the preview image into the
    /// teacher's permanent area, inserts the row with a fresh join code, and
    /// cleans up remaining scratch previews. Fails with a validation error
    /// (before any network call) if the submitted name and scenario do not
    /// match the current preview draft.
    async fn publish(
        &self,
        teacher_id: Uuid,
        name: &str,
        scenario: &str,
    ) -> Result<entities::Roleplay, AppError>;

    /// Provisions a conversational agent for a published roleplay and stores
    /// its identifier on the row.
    async fn attach_agent(
        &self,
        teacher_id: Uuid,
        roleplay_id: Uuid,
    ) -> Result<entities::Roleplay, AppError>;

    /// Loads a roleplay by join code for the student conversation page.
    async fn get_by_code(&self, code: &str) -> Result<StudentRoleplay, AppError>;
}

#[async_trait]
pub trait TeacherService: Send + Sync {
    /// The teacher row with its selected language, or `None` before
    /// onboarding.
    async fn get_teacher(
        &self,
        teacher_id: Uuid,
    ) -> Result<Option<(entities::Teacher, Option<entities::Language>)>, AppError>;

    /// Creates the teacher row exactly once, during onboarding.
    async fn onboard(
        &self,
        teacher_id: Uuid,
        language_id: Uuid,
    ) -> Result<entities::Teacher, AppError>;

    /// The teacher's selected language, lazily loaded through the preference
    /// cache.
    async fn language(&self, teacher_id: Uuid) -> Result<Option<entities::Language>, AppError>;

    /// Read-modify-publish: persists the new language first and only updates
    /// the cache after the write succeeds.
    async fn set_language(
        &self,
        teacher_id: Uuid,
        language_id: Uuid,
    ) -> Result<entities::Language, AppError>;

    async fn list_languages(&self) -> Result<Vec<entities::Language>, AppError>;
}

#[async_trait]
pub trait VoiceSessionService: Send + Sync {
    /// Starts a voice session for the roleplay behind the join code.
    ///
    /// Fails before any provider connection attempt if the roleplay has no
    /// agent.
    async fn start(&self, code: &str) -> Result<Arc<VoiceSession>, AppError>;

    async fn session(&self, session_id: Uuid) -> Result<Arc<VoiceSession>, AppError>;

    /// Requests the session to stop and removes it from the registry. The
    /// dispatcher acknowledges by moving the session to `Ended`.
    async fn stop(&self, session_id: Uuid) -> Result<(), AppError>;
}
