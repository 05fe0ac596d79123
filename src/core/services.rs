//! Implementations for the services the app needs.

use crate::core::preferences::PreferenceCache;
use crate::core::traits::{
    RoleplayPreview, RoleplayService, StudentRoleplay, TeacherService, VoiceSessionService,
};
use crate::core::voice::{SessionRegistry, VoiceSession};
use crate::error::AppError;
use crate::infrastructure::entities::{Language, Roleplay, Teacher};
use crate::infrastructure::traits::{
    GenerationBackend, ObjectStore, RoleplayRepository, TeacherRepository, VoiceLink,
};
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, inject, injectable};
use log::{error, info};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Signed read URLs are valid for one hour.
const SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 6;

/// Random human-shareable join code. Uniqueness is not checked here; the
/// UNIQUE column turns a collision into an insert failure.
fn join_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// The preview a publish must match. Replaced on every new preview; cleared
/// when a roleplay is committed.
#[derive(Debug, Clone)]
pub struct PreviewDraft {
    pub name: String,
    pub scenario: String,
    pub first_prompt: String,
    pub image_path: Option<String>,
}

/// Current preview draft per teacher. A publish whose name or scenario
/// differs from the draft is rejected, which forces a fresh preview after
/// any edit.
pub struct PreviewDrafts {
    drafts: RwLock<HashMap<Uuid, PreviewDraft>>,
}

#[injectable]
impl PreviewDrafts {
    #[inject]
    pub fn create() -> PreviewDrafts {
        PreviewDrafts {
            drafts: RwLock::new(HashMap::new()),
        }
    }
}

impl PreviewDrafts {
    pub async fn get(&self, teacher_id: Uuid) -> Option<PreviewDraft> {
        self.drafts.read().await.get(&teacher_id).cloned()
    }

    pub async fn put(&self, teacher_id: Uuid, draft: PreviewDraft) {
        self.drafts.write().await.insert(teacher_id, draft);
    }

    pub async fn clear(&self, teacher_id: Uuid) {
        self.drafts.write().await.remove(&teacher_id);
    }
}

#[injectable(RoleplayService)]
pub struct MyRoleplayService {
    repo: Ref<dyn RoleplayRepository>,
    teachers: Ref<dyn TeacherService>,
    backend: Ref<dyn GenerationBackend>,
    store: Ref<dyn ObjectStore>,
    drafts: Ref<PreviewDrafts>,
}

impl MyRoleplayService {
    async fn required_language(&self, teacher_id: Uuid) -> Result<Language, AppError> {
        self.teachers
            .language(teacher_id)
            .await?
            .ok_or_else(|| AppError::Validation("teacher language not found".to_owned()))
    }
}

#[async_trait]
impl RoleplayService for MyRoleplayService {
    async fn list_roleplays(&self, teacher_id: Uuid) -> Result<Vec<Roleplay>, AppError> {
        self.repo.list_roleplays(teacher_id).await
    }

    async fn generate_description(
        &self,
        teacher_id: Uuid,
        name: &str,
    ) -> Result<String, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("roleplay name is required".to_owned()));
        }

        let language = self.required_language(teacher_id).await?;
        self.backend.description(name, &language.name).await
    }

    async fn generate_preview(
        &self,
        teacher_id: Uuid,
        name: &str,
        scenario: &str,
    ) -> Result<RoleplayPreview, AppError> {
        if name.trim().is_empty() || scenario.trim().is_empty() {
            return Err(AppError::Validation(
                "name and scenario are required".to_owned(),
            ));
        }

        let language = self.required_language(teacher_id).await?;
        let assets = self
            .backend
            .preview_image(teacher_id, name, scenario, &language.name)
            .await?;

        let image_url = match self.store.signed_url(&assets.image_path, SIGNED_URL_TTL).await {
            Ok(url) => Some(url),
            Err(e) => {
                error!("failed to sign preview image url: {e}");
                None
            }
        };

        self.drafts
            .put(
                teacher_id,
                PreviewDraft {
                    name: name.to_owned(),
                    scenario: scenario.to_owned(),
                    first_prompt: assets.first_prompt.clone(),
                    image_path: Some(assets.image_path.clone()),
                },
            )
            .await;

        Ok(RoleplayPreview {
            first_prompt: assets.first_prompt,
            image_path: Some(assets.image_path),
            image_url,
        })
    }

    async fn publish(
        &self,
        teacher_id: Uuid,
        name: &str,
        scenario: &str,
    ) -> Result<Roleplay, AppError> {
        // The gate: a publish is only valid against a preview generated for
        // exactly this name and scenario.
        let draft = match self.drafts.get(teacher_id).await {
            Some(draft) if draft.name == name && draft.scenario == scenario => draft,
            _ => {
                return Err(AppError::Validation(
                    "roleplay must be previewed before publishing".to_owned(),
                ));
            }
        };

        // Promote the scratch image into the teacher's permanent area. The
        // bytes are moved unchanged; only the path is rewritten.
        let mut image_path = None;
        if let Some(scratch_path) = &draft.image_path {
            let bytes = self.store.download(scratch_path).await?;
            let file_name = scratch_path.rsplit('/').next().unwrap_or(scratch_path);
            let promoted = format!("{teacher_id}/images/{file_name}");
            self.store.upload(&promoted, bytes).await?;
            image_path = Some(promoted);
        }

        let roleplay = Roleplay {
            id: Uuid::new_v4(),
            owner_id: teacher_id,
            name: name.to_owned(),
            scenario: scenario.to_owned(),
            image_path: image_path.clone(),
            first_prompt: Some(draft.first_prompt.clone()),
            agent_id: None,
            code: join_code(),
            created_at: Utc::now(),
        };

        let inserted = match self.repo.create_roleplay(roleplay).await {
            Ok(inserted) => inserted,
            Err(e) => {
                // The row never existed, so the promoted object should not
                // either. Best-effort; a failed removal leaves it orphaned.
                if let Some(promoted) = &image_path {
                    if let Err(remove_err) = self.store.remove(promoted).await {
                        error!("failed to remove promoted image {promoted}: {remove_err}");
                    }
                }
                return Err(e);
            }
        };

        self.drafts.clear(teacher_id).await;
        info!("roleplay {} published with code {}", inserted.id, inserted.code);

        // Scratch cleanup is not transactional with the insert: a failure
        // here is surfaced although the row is already committed.
        self.backend.delete_previews(teacher_id).await?;

        Ok(inserted)
    }

    async fn attach_agent(
        &self,
        teacher_id: Uuid,
        roleplay_id: Uuid,
    ) -> Result<Roleplay, AppError> {
        let roleplay = self
            .repo
            .get_roleplay(teacher_id, roleplay_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("roleplay {roleplay_id}")))?;

        let first_prompt = roleplay.first_prompt.clone().ok_or_else(|| {
            AppError::Validation("roleplay has no opening prompt".to_owned())
        })?;
        let language = self.required_language(teacher_id).await?;

        let agent_id = self
            .backend
            .create_agent(
                &roleplay.name,
                &roleplay.scenario,
                &language.code.to_lowercase(),
                &first_prompt,
            )
            .await?;
        self.repo.set_roleplay_agent(roleplay_id, &agent_id).await?;

        Ok(Roleplay {
            agent_id: Some(agent_id),
            ..roleplay
        })
    }

    async fn get_by_code(&self, code: &str) -> Result<StudentRoleplay, AppError> {
        let roleplay = self
            .repo
            .get_roleplay_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("roleplay {code}")))?;

        let image_url = match &roleplay.image_path {
            Some(path) => match self.store.signed_url(path, SIGNED_URL_TTL).await {
                Ok(url) => Some(url),
                Err(e) => {
                    // The page still renders without a background image.
                    error!("failed to sign image url for {path}: {e}");
                    None
                }
            },
            None => None,
        };

        Ok(StudentRoleplay {
            roleplay,
            image_url,
        })
    }
}

#[injectable(TeacherService)]
pub struct MyTeacherService {
    repo: Ref<dyn TeacherRepository>,
    cache: Ref<PreferenceCache>,
}

#[async_trait]
impl TeacherService for MyTeacherService {
    async fn get_teacher(
        &self,
        teacher_id: Uuid,
    ) -> Result<Option<(Teacher, Option<Language>)>, AppError> {
        let Some(teacher) = self.repo.get_teacher(teacher_id).await? else {
            return Ok(None);
        };

        let language = match teacher.language_id {
            Some(language_id) => self.repo.get_language(language_id).await?,
            None => None,
        };
        Ok(Some((teacher, language)))
    }

    async fn onboard(&self, teacher_id: Uuid, language_id: Uuid) -> Result<Teacher, AppError> {
        if self.repo.get_teacher(teacher_id).await?.is_some() {
            return Err(AppError::Validation("teacher already onboarded".to_owned()));
        }

        let language = self
            .repo
            .get_language(language_id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("unknown language {language_id}")))?;

        let teacher = self
            .repo
            .create_teacher(Teacher {
                id: teacher_id,
                language_id: Some(language_id),
                created_at: Utc::now(),
            })
            .await?;

        self.cache.put(teacher_id, language).await;
        Ok(teacher)
    }

    async fn language(&self, teacher_id: Uuid) -> Result<Option<Language>, AppError> {
        if let Some(language) = self.cache.get(teacher_id).await {
            return Ok(Some(language));
        }

        let Some(teacher) = self.repo.get_teacher(teacher_id).await? else {
            return Ok(None);
        };
        let Some(language_id) = teacher.language_id else {
            return Ok(None);
        };

        let language = self.repo.get_language(language_id).await?;
        if let Some(language) = &language {
            self.cache.put(teacher_id, language.clone()).await;
        }
        Ok(language)
    }

    async fn set_language(
        &self,
        teacher_id: Uuid,
        language_id: Uuid,
    ) -> Result<Language, AppError> {
        let language = self
            .repo
            .get_language(language_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("language {language_id}")))?;

        // Persist first; the cache only sees a confirmed write.
        self.repo
            .set_teacher_language(teacher_id, language_id)
            .await?;
        self.cache.put(teacher_id, language.clone()).await;

        Ok(language)
    }

    async fn list_languages(&self) -> Result<Vec<Language>, AppError> {
        self.repo.list_languages().await
    }
}

#[injectable(VoiceSessionService)]
pub struct MyVoiceSessionService {
    repo: Ref<dyn RoleplayRepository>,
    link: Ref<dyn VoiceLink>,
    registry: Ref<SessionRegistry>,
}

#[async_trait]
impl VoiceSessionService for MyVoiceSessionService {
    async fn start(&self, code: &str) -> Result<Arc<VoiceSession>, AppError> {
        let roleplay = self
            .repo
            .get_roleplay_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("roleplay {code}")))?;

        // Checked before any connection attempt.
        let agent_id = roleplay.agent_id.ok_or_else(|| {
            AppError::Validation("the roleplay agent could not be found".to_owned())
        })?;

        let connection = self.link.open(&agent_id).await?;
        let session = VoiceSession::spawn(connection);
        self.registry.insert(session.clone()).await;

        info!("session {} started for roleplay code {code}", session.id);
        Ok(session)
    }

    async fn session(&self, session_id: Uuid) -> Result<Arc<VoiceSession>, AppError> {
        self.registry
            .get(session_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))
    }

    async fn stop(&self, session_id: Uuid) -> Result<(), AppError> {
        let session = self
            .registry
            .remove(session_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;

        session.request_stop().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_code_shape() {
        for _ in 0..50 {
            let code = join_code();
            assert_eq!(code.len(), CODE_LEN);
            assert!(
                code.bytes().all(|b| CODE_ALPHABET.contains(&b)),
                "unexpected character in {code}"
            );
        }
    }

    #[test]
    fn test_join_codes_vary() {
        let codes: std::collections::HashSet<String> = (0..20).map(|_| join_code()).collect();
        assert!(codes.len() > 1);
    }

    #[tokio::test]
    async fn test_draft_replaced_by_new_preview() {
        let drafts = PreviewDrafts::create();
        let teacher_id = Uuid::new_v4();

        drafts
            .put(
                teacher_id,
                PreviewDraft {
                    name: "Cafe Order".to_owned(),
                    scenario: "Order a coffee".to_owned(),
                    first_prompt: "first".to_owned(),
                    image_path: None,
                },
            )
            .await;
        drafts
            .put(
                teacher_id,
                PreviewDraft {
                    name: "Cafe Order".to_owned(),
                    scenario: "Order a coffee in Spanish".to_owned(),
                    first_prompt: "second".to_owned(),
                    image_path: None,
                },
            )
            .await;

        let draft = drafts.get(teacher_id).await.expect("draft");
        assert_eq!(draft.first_prompt, "second");
    }

    #[tokio::test]
    async fn test_draft_cleared_after_commit() {
        let drafts = PreviewDrafts::create();
        let teacher_id = Uuid::new_v4();

        drafts
            .put(
                teacher_id,
                PreviewDraft {
                    name: "n".to_owned(),
                    scenario: "s".to_owned(),
                    first_prompt: "p".to_owned(),
                    image_path: None,
                },
            )
            .await;
        drafts.clear(teacher_id).await;

        assert!(drafts.get(teacher_id).await.is_none());
    }
}
