//! Roleplay endpoints

use crate::api::ExtractUser;
use crate::api::roleplays::schemas::{
    CreateRoleplay, GenerateDescription, GeneratePreview, RoleplayList,
};
use crate::core::traits::RoleplayService;
use crate::error::AppError;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;
use uuid::Uuid;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_roleplays).post(publish_roleplay))
        .route("/description", post(generate_description))
        .route("/preview", post(generate_preview))
        .route("/:id/agent", post(attach_agent))
        .route("/code/:code", get(get_by_code))
}

async fn list_roleplays(
    Inject(roleplay_service): Inject<dyn RoleplayService>,
    ExtractUser(current_user): ExtractUser,
) -> Result<(StatusCode, Json<RoleplayList>), AppError> {
    let roleplays = roleplay_service.list_roleplays(current_user).await?;

    Ok((
        StatusCode::OK,
        Json(RoleplayList {
            roleplays: roleplays.into_iter().map(schemas::Roleplay::from).collect(),
        }),
    ))
}

async fn generate_description(
    Inject(roleplay_service): Inject<dyn RoleplayService>,
    ExtractUser(current_user): ExtractUser,
    Json(request): Json<GenerateDescription>,
) -> Result<(StatusCode, Json<schemas::Description>), AppError> {
    let description = roleplay_service
        .generate_description(current_user, &request.name)
        .await?;

    Ok((
        StatusCode::OK,
        Json(schemas::Description { description }),
    ))
}

async fn generate_preview(
    Inject(roleplay_service): Inject<dyn RoleplayService>,
    ExtractUser(current_user): ExtractUser,
    Json(request): Json<GeneratePreview>,
) -> Result<(StatusCode, Json<schemas::Preview>), AppError> {
    let preview = roleplay_service
        .generate_preview(current_user, &request.name, &request.scenario)
        .await?;

    Ok((StatusCode::OK, Json(schemas::Preview::from(preview))))
}

async fn publish_roleplay(
    Inject(roleplay_service): Inject<dyn RoleplayService>,
    ExtractUser(current_user): ExtractUser,
    Json(request): Json<CreateRoleplay>,
) -> Result<(StatusCode, Json<schemas::Roleplay>), AppError> {
    let roleplay = roleplay_service
        .publish(current_user, &request.name, &request.scenario)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(schemas::Roleplay::from(roleplay)),
    ))
}

async fn attach_agent(
    Inject(roleplay_service): Inject<dyn RoleplayService>,
    ExtractUser(current_user): ExtractUser,
    Path(roleplay_id): Path<Uuid>,
) -> Result<(StatusCode, Json<schemas::Roleplay>), AppError> {
    let roleplay = roleplay_service
        .attach_agent(current_user, roleplay_id)
        .await?;

    Ok((StatusCode::OK, Json(schemas::Roleplay::from(roleplay))))
}

/// Student-facing: no authentication, the join code is the capability.
async fn get_by_code(
    Inject(roleplay_service): Inject<dyn RoleplayService>,
    Path(code): Path<String>,
) -> Result<(StatusCode, Json<schemas::StudentRoleplay>), AppError> {
    let loaded = roleplay_service.get_by_code(&code).await?;

    Ok((
        StatusCode::OK,
        Json(schemas::StudentRoleplay::from(loaded)),
    ))
}

pub mod schemas {
    use crate::core::traits;
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug)]
    pub struct GenerateDescription {
        pub name: String,
    }

    #[derive(Serialize, Debug)]
    pub struct Description {
        pub description: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct GeneratePreview {
        pub name: String,
        pub scenario: String,
    }

    #[derive(Serialize, Debug)]
    pub struct Preview {
        pub first_prompt: String,
        pub image_path: Option<String>,
        pub image_url: Option<String>,
    }

    impl From<traits::RoleplayPreview> for Preview {
        fn from(preview: traits::RoleplayPreview) -> Self {
            Preview {
                first_prompt: preview.first_prompt,
                image_path: preview.image_path,
                image_url: preview.image_url,
            }
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct CreateRoleplay {
        pub name: String,
        pub scenario: String,
    }

    #[derive(Serialize, Debug)]
    pub struct Roleplay {
        pub id: Uuid,
        pub name: String,
        pub scenario: String,
        pub image_path: Option<String>,
        pub first_prompt: Option<String>,
        pub agent_id: Option<String>,
        pub code: String,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::Roleplay> for Roleplay {
        fn from(roleplay: entities::Roleplay) -> Self {
            Roleplay {
                id: roleplay.id,
                name: roleplay.name,
                scenario: roleplay.scenario,
                image_path: roleplay.image_path,
                first_prompt: roleplay.first_prompt,
                agent_id: roleplay.agent_id,
                code: roleplay.code,
                created_at: roleplay.created_at,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct RoleplayList {
        pub roleplays: Vec<Roleplay>,
    }

    /// What a student sees when opening a join code.
    #[derive(Serialize, Debug)]
    pub struct StudentRoleplay {
        pub name: String,
        pub scenario: String,
        pub code: String,
        pub has_agent: bool,
        pub image_url: Option<String>,
    }

    impl From<traits::StudentRoleplay> for StudentRoleplay {
        fn from(loaded: traits::StudentRoleplay) -> Self {
            StudentRoleplay {
                name: loaded.roleplay.name,
                scenario: loaded.roleplay.scenario,
                code: loaded.roleplay.code,
                has_agent: loaded.roleplay.agent_id.is_some(),
                image_url: loaded.image_url,
            }
        }
    }
}
