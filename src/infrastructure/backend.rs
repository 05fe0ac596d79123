//! HTTP clients for the generation backend and the conversation provider's
//! REST surface.

use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::traits::{
    ConversationDetail, ConversationProvider, ConversationSummary, GenerationBackend,
    PreviewAssets,
};
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

fn backend_err(e: impl std::fmt::Display) -> AppError {
    AppError::Backend(e.to_string())
}

fn provider_err(e: impl std::fmt::Display) -> AppError {
    AppError::Provider(e.to_string())
}

#[derive(Serialize)]
struct DescriptionRequest<'a> {
    roleplay_name: &'a str,
    language: &'a str,
}

#[derive(Deserialize)]
struct DescriptionResponse {
    description: String,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    teacher_id: Uuid,
    roleplay_name: &'a str,
    roleplay_scenario: &'a str,
    language: &'a str,
}

#[derive(Serialize)]
struct AgentRequest<'a> {
    roleplay_name: &'a str,
    roleplay_scenario: &'a str,
    language_code: &'a str,
    first_prompt: &'a str,
}

#[derive(Deserialize)]
struct AgentResponse {
    agent_id: String,
}

pub struct HttpGenerationBackend {
    http: reqwest::Client,
    base_url: String,
}

#[injectable(GenerationBackend)]
impl HttpGenerationBackend {
    #[inject]
    pub fn create(config: Ref<Config>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build backend client");

        Self {
            http,
            base_url: config.backend_url.clone(),
        }
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationBackend {
    async fn description(&self, roleplay_name: &str, language: &str) -> Result<String, AppError> {
        let response: DescriptionResponse = self
            .http
            .post(format!("{}/api/v1/roleplay/description", self.base_url))
            .json(&DescriptionRequest {
                roleplay_name,
                language,
            })
            .send()
            .await
            .map_err(backend_err)?
            .error_for_status()
            .map_err(backend_err)?
            .json()
            .await
            .map_err(backend_err)?;

        Ok(response.description)
    }

    async fn preview_image(
        &self,
        teacher_id: Uuid,
        roleplay_name: &str,
        roleplay_scenario: &str,
        language: &str,
    ) -> Result<PreviewAssets, AppError> {
        self.http
            .post(format!("{}/api/v1/roleplay/image", self.base_url))
            .json(&ImageRequest {
                teacher_id,
                roleplay_name,
                roleplay_scenario,
                language,
            })
            .send()
            .await
            .map_err(backend_err)?
            .error_for_status()
            .map_err(backend_err)?
            .json()
            .await
            .map_err(backend_err)
    }

    async fn delete_previews(&self, teacher_id: Uuid) -> Result<(), AppError> {
        self.http
            .delete(format!(
                "{}/api/v1/roleplay/deletePreviews?teacher_id={teacher_id}",
                self.base_url
            ))
            .send()
            .await
            .map_err(backend_err)?
            .error_for_status()
            .map_err(backend_err)?;
        Ok(())
    }

    async fn create_agent(
        &self,
        roleplay_name: &str,
        roleplay_scenario: &str,
        language_code: &str,
        first_prompt: &str,
    ) -> Result<String, AppError> {
        let response: AgentResponse = self
            .http
            .post(format!("{}/api/v1/roleplay/agent", self.base_url))
            .json(&AgentRequest {
                roleplay_name,
                roleplay_scenario,
                language_code,
                first_prompt,
            })
            .send()
            .await
            .map_err(backend_err)?
            .error_for_status()
            .map_err(backend_err)?
            .json()
            .await
            .map_err(backend_err)?;

        Ok(response.agent_id)
    }
}

#[derive(Deserialize)]
struct ConversationPage {
    conversations: Vec<ConversationSummary>,
    has_more: bool,
    next_cursor: Option<String>,
}

pub struct HttpConversationProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[injectable(ConversationProvider)]
impl HttpConversationProvider {
    #[inject]
    pub fn create(config: Ref<Config>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build provider client");

        Self {
            http,
            base_url: config.provider_api_url.clone(),
            api_key: config.provider_api_key.clone(),
        }
    }
}

#[async_trait]
impl ConversationProvider for HttpConversationProvider {
    async fn list_conversations(
        &self,
        agent_id: &str,
    ) -> Result<Vec<ConversationSummary>, AppError> {
        // The provider paginates with an opaque cursor; aggregate all pages.
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page: ConversationPage = self
                .http
                .get(format!("{}/conversations", self.base_url))
                .bearer_auth(&self.api_key)
                .query(&[
                    ("agent_id", agent_id),
                    ("page_size", "100"),
                    ("cursor", cursor.as_deref().unwrap_or("")),
                ])
                .send()
                .await
                .map_err(provider_err)?
                .error_for_status()
                .map_err(provider_err)?
                .json()
                .await
                .map_err(provider_err)?;

            all.extend(page.conversations);
            if !page.has_more {
                break;
            }
            cursor = page.next_cursor;
        }

        debug!("listed {} conversations for agent {agent_id}", all.len());
        Ok(all)
    }

    async fn get_conversation(&self, conversation_id: &str) -> Result<ConversationDetail, AppError> {
        self.http
            .get(format!("{}/conversations/{conversation_id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(provider_err)?
            .error_for_status()
            .map_err(provider_err)?
            .json()
            .await
            .map_err(provider_err)
    }

    async fn conversation_audio(&self, conversation_id: &str) -> Result<Vec<u8>, AppError> {
        let response = self
            .http
            .get(format!(
                "{}/conversations/{conversation_id}/audio",
                self.base_url
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(provider_err)?
            .error_for_status()
            .map_err(provider_err)?;

        Ok(response.bytes().await.map_err(provider_err)?.to_vec())
    }
}
